//! Reassembly of multi-part command responses.
//!
//! Responses too large for one datagram arrive as indexed fragments that
//! share a sequence number. Fragments are collected per sequence number
//! until every index is present, then concatenated in index order (UDP
//! gives no arrival-order guarantee). Entries that never complete are
//! evicted 120 seconds after creation; the protocol offers no
//! retransmission signal, so the partial data is silently dropped.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long an incomplete entry may live, measured from its creation.
/// Later fragments do not extend the deadline.
pub const FRAGMENT_TTL: Duration = Duration::from_secs(120);

#[derive(Debug)]
struct FragmentBuffer {
    created: Instant,
    total: u8,
    parts: HashMap<u8, Vec<u8>>,
}

impl FragmentBuffer {
    fn is_complete(&self) -> bool {
        self.parts.len() >= self.total as usize && (0..self.total).all(|i| self.parts.contains_key(&i))
    }

    fn into_message(self) -> Vec<u8> {
        let mut message = Vec::new();
        for index in 0..self.total {
            if let Some(bytes) = self.parts.get(&index) {
                message.extend_from_slice(bytes);
            }
        }
        message
    }
}

/// Time-expiring cache keyed by sequence number.
///
/// At most one entry exists per sequence number: a first fragment for a
/// sequence whose previous entry expired starts a fresh buffer rather
/// than merging with stale data.
#[derive(Debug, Default)]
pub struct FragmentReassembler {
    entries: HashMap<u8, FragmentBuffer>,
}

impl FragmentReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one fragment. Returns the fully reassembled message once
    /// every index in `0..total` has arrived, removing the entry.
    ///
    /// `now` is passed in so callers (and tests) control the clock.
    pub fn insert(&mut self, seq: u8, index: u8, bytes: Vec<u8>, total: u8, now: Instant) -> Option<Vec<u8>> {
        self.sweep(now);

        let entry = self.entries.entry(seq).or_insert_with(|| FragmentBuffer {
            created: now,
            total,
            parts: HashMap::new(),
        });
        entry.parts.insert(index, bytes);

        if entry.is_complete() {
            return self.entries.remove(&seq).map(FragmentBuffer::into_message);
        }
        None
    }

    /// Whether fragments are currently buffered for `seq`.
    pub fn contains(&self, seq: u8) -> bool {
        self.entries.contains_key(&seq)
    }

    /// Evicts every entry older than [`FRAGMENT_TTL`].
    pub fn sweep(&mut self, now: Instant) {
        self.entries
            .retain(|_, entry| now.duration_since(entry.created) < FRAGMENT_TTL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_order_fragments_reassemble_in_index_order() {
        let mut cache = FragmentReassembler::new();
        let now = Instant::now();

        assert_eq!(cache.insert(7, 2, b"third".to_vec(), 3, now), None);
        assert_eq!(cache.insert(7, 0, b"first".to_vec(), 3, now), None);
        let message = cache.insert(7, 1, b"second".to_vec(), 3, now);

        assert_eq!(message.as_deref(), Some(&b"firstsecondthird"[..]));
        assert!(!cache.contains(7), "entry removed after completion");
    }

    #[test]
    fn duplicate_index_does_not_complete_early() {
        let mut cache = FragmentReassembler::new();
        let now = Instant::now();

        assert_eq!(cache.insert(1, 0, b"a".to_vec(), 2, now), None);
        assert_eq!(cache.insert(1, 0, b"b".to_vec(), 2, now), None);
        assert_eq!(cache.insert(1, 1, b"c".to_vec(), 2, now).as_deref(), Some(&b"bc"[..]));
    }

    #[test]
    fn incomplete_entry_expires_after_ttl() {
        let mut cache = FragmentReassembler::new();
        let start = Instant::now();

        cache.insert(3, 0, b"partial".to_vec(), 2, start);
        assert!(cache.contains(3));

        cache.sweep(start + FRAGMENT_TTL + Duration::from_secs(1));
        assert!(!cache.contains(3), "expired entry is gone");

        // Completing the old sequence now requires starting over.
        let later = start + FRAGMENT_TTL + Duration::from_secs(2);
        assert_eq!(cache.insert(3, 1, b"tail".to_vec(), 2, later), None);
        assert!(cache.contains(3));
    }

    #[test]
    fn expiry_is_absolute_from_creation() {
        let mut cache = FragmentReassembler::new();
        let start = Instant::now();

        cache.insert(9, 0, b"a".to_vec(), 3, start);
        // A fragment arriving near the deadline must not refresh it.
        cache.insert(9, 1, b"b".to_vec(), 3, start + Duration::from_secs(119));
        assert!(cache.contains(9));

        cache.sweep(start + FRAGMENT_TTL);
        assert!(!cache.contains(9));
    }

    #[test]
    fn single_fragment_total_completes_immediately() {
        let mut cache = FragmentReassembler::new();
        let now = Instant::now();
        assert_eq!(cache.insert(0, 0, b"whole".to_vec(), 1, now).as_deref(), Some(&b"whole"[..]));
    }
}
