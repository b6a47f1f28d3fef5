//! Collaborator boundary for decoded query results.
//!
//! The core never knows whether it runs as a standalone console tool or
//! embedded in a hosting application; it just hands results to whatever
//! [`ResponseSink`] was injected at construction.

use log::{info, warn};
use tokio::sync::mpsc;

use crate::response::PlayerRecord;

/// A decoded response to a players or missions query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Players(Vec<PlayerRecord>),
    Missions(Vec<String>),
}

/// Receives decoded results and chat broadcasts from the network loop.
///
/// `deliver` is invoked once per correlation id recorded when the query
/// was enqueued.
pub trait ResponseSink: Send + Sync {
    fn deliver(&self, correlation_id: u32, result: QueryResult);

    /// Unsolicited server chat. Default: ignore.
    fn chat(&self, _message: &str) {}
}

/// Sink for the standalone console tool: results go to the log.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ResponseSink for ConsoleSink {
    fn deliver(&self, _correlation_id: u32, result: QueryResult) {
        match result {
            QueryResult::Players(players) => {
                info!("{} players on server", players.len());
                for player in players {
                    info!(
                        "  #{} {} ({}:{}, ping {}, guid {}{})",
                        player.slot,
                        player.name,
                        player.ip,
                        player.port,
                        player.ping,
                        player.guid,
                        if player.verified { ", verified" } else { "" },
                    );
                }
            }
            QueryResult::Missions(missions) => {
                info!("{} missions on server", missions.len());
                for mission in missions {
                    info!("  {}", mission);
                }
            }
        }
    }

    fn chat(&self, message: &str) {
        info!("CHAT: {}", message);
    }
}

/// Sink for hosting applications: forwards results over a channel keyed
/// by the correlation id supplied at enqueue time.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<(u32, QueryResult)>,
}

impl ChannelSink {
    /// Creates the sink and the receiving end the host reads from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(u32, QueryResult)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ResponseSink for ChannelSink {
    fn deliver(&self, correlation_id: u32, result: QueryResult) {
        if self.tx.send((correlation_id, result)).is_err() {
            warn!("dropping result {}: receiver gone", correlation_id);
        }
    }
}
