//! Outbound command queue shared between caller contexts and the network
//! loop.
//!
//! Callers enqueue commands from any task; the loop drains them in FIFO
//! order on its next pass and sends each one. Query variants additionally
//! record a caller-supplied correlation id in a side-list, consulted when
//! the matching listing response arrives. Every lock here is held only
//! for the duration of a push or a drain, never across I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Classifies a pending command and doubles as its wire sequence byte,
/// correlating each query with its eventual response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Plain = 0,
    MissionsQuery = 1,
    PlayersQuery = 2,
}

impl CommandKind {
    /// Sequence byte placed on the wire for this command.
    pub fn sequence(self) -> u8 {
        self as u8
    }
}

/// A command waiting for the next queue drain. Delivery is
/// fire-and-forget: once sent over UDP there is no ack or retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub kind: CommandKind,
    pub text: String,
}

/// FIFO queue of pending commands plus correlation side-lists.
///
/// Enqueues are no-ops while the session is not running, so commands are
/// never accepted into a queue nobody will drain.
#[derive(Debug)]
pub struct CommandQueue {
    running: Arc<AtomicBool>,
    commands: Mutex<Vec<PendingCommand>>,
    player_requests: Mutex<Vec<u32>>,
    mission_requests: Mutex<Vec<u32>>,
}

impl CommandQueue {
    pub fn new(running: Arc<AtomicBool>) -> Self {
        Self {
            running,
            commands: Mutex::new(Vec::new()),
            player_requests: Mutex::new(Vec::new()),
            mission_requests: Mutex::new(Vec::new()),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn push(&self, kind: CommandKind, text: String) {
        let mut commands = self.commands.lock().expect("command queue lock poisoned");
        commands.push(PendingCommand { kind, text });
    }

    /// Enqueues a raw command.
    pub fn push_plain(&self, text: String) {
        if self.is_running() {
            self.push(CommandKind::Plain, text);
        }
    }

    /// Enqueues a player-listing query correlated to `correlation_id`.
    pub fn push_players_query(&self, text: String, correlation_id: u32) {
        if self.is_running() {
            self.player_requests
                .lock()
                .expect("player request lock poisoned")
                .push(correlation_id);
            self.push(CommandKind::PlayersQuery, text);
        }
    }

    /// Enqueues a mission-listing query correlated to `correlation_id`.
    pub fn push_missions_query(&self, text: String, correlation_id: u32) {
        if self.is_running() {
            self.mission_requests
                .lock()
                .expect("mission request lock poisoned")
                .push(correlation_id);
            self.push(CommandKind::MissionsQuery, text);
        }
    }

    /// Atomically removes and returns all queued commands in enqueue order.
    pub fn drain(&self) -> Vec<PendingCommand> {
        let mut commands = self.commands.lock().expect("command queue lock poisoned");
        std::mem::take(&mut *commands)
    }

    pub fn is_empty(&self) -> bool {
        self.commands
            .lock()
            .expect("command queue lock poisoned")
            .is_empty()
    }

    /// Takes the correlation ids waiting on a player listing.
    pub fn take_player_ids(&self) -> Vec<u32> {
        let mut ids = self.player_requests.lock().expect("player request lock poisoned");
        std::mem::take(&mut *ids)
    }

    /// Takes the correlation ids waiting on a mission listing.
    pub fn take_mission_ids(&self) -> Vec<u32> {
        let mut ids = self.mission_requests.lock().expect("mission request lock poisoned");
        std::mem::take(&mut *ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(running: bool) -> CommandQueue {
        CommandQueue::new(Arc::new(AtomicBool::new(running)))
    }

    #[test]
    fn enqueue_while_stopped_is_a_noop() {
        let q = queue(false);
        q.push_plain("say hi".to_string());
        q.push_players_query("players".to_string(), 1);
        q.push_missions_query("missions".to_string(), 2);

        assert!(q.is_empty());
        assert!(q.take_player_ids().is_empty());
        assert!(q.take_mission_ids().is_empty());
    }

    #[test]
    fn drain_returns_all_items_once_in_order() {
        let q = queue(true);
        q.push_plain("first".to_string());
        q.push_missions_query("missions".to_string(), 7);
        q.push_plain("last".to_string());

        let drained = q.drain();
        assert_eq!(
            drained,
            vec![
                PendingCommand { kind: CommandKind::Plain, text: "first".to_string() },
                PendingCommand { kind: CommandKind::MissionsQuery, text: "missions".to_string() },
                PendingCommand { kind: CommandKind::Plain, text: "last".to_string() },
            ]
        );
        assert!(q.is_empty());
        assert!(q.drain().is_empty(), "second drain finds nothing");
    }

    #[test]
    fn queries_record_correlation_ids() {
        let q = queue(true);
        q.push_players_query("players".to_string(), 10);
        q.push_players_query("players".to_string(), 11);
        q.push_missions_query("missions".to_string(), 12);

        assert_eq!(q.take_player_ids(), vec![10, 11]);
        assert_eq!(q.take_mission_ids(), vec![12]);
        assert!(q.take_player_ids().is_empty());
    }

    #[test]
    fn kind_discriminants_match_wire_sequence_numbers() {
        assert_eq!(CommandKind::Plain.sequence(), 0);
        assert_eq!(CommandKind::MissionsQuery.sequence(), 1);
        assert_eq!(CommandKind::PlayersQuery.sequence(), 2);
    }
}
