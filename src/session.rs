//! Login state and the idle-timeout policy driving keep-alive and
//! reconnect traffic.
//!
//! The server drops sessions that stay quiet, so the client tracks how
//! long the socket has been idle and reacts on each receive timeout:
//! after 30 seconds of silence it sends a keep-alive, after 45 it assumes
//! the session is gone and resends the login packet. Queued commands
//! survive a reconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;

use crate::error::RconError;
use crate::protocol::OutboundPacket;

/// Idle time after which a keep-alive is sent.
pub const KEEPALIVE_IDLE: Duration = Duration::from_secs(30);
/// Idle time after which the login packet is resent.
pub const RECONNECT_IDLE: Duration = Duration::from_secs(45);

/// Connection parameters, set once and reused across reconnect attempts.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub address: String,
    pub port: u16,
    pub password: String,
}

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    LoggingIn,
    Authenticated,
    Stopping,
}

/// What the network loop should do after a receive timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleAction {
    /// Resend the login packet; the session is presumed dropped.
    Reconnect,
    /// Send the keep-alive packet to reset the server's idle timer.
    KeepAlive,
    /// Nothing idle-related to do; just drain the queue as usual.
    Drain,
}

/// Tracks login status and idle time for one server session.
///
/// Owned by the network loop; the `running` and `logged_in` flags are the
/// only pieces shared with caller contexts, as plain atomic booleans.
#[derive(Debug)]
pub struct Session {
    credentials: LoginCredentials,
    state: SessionState,
    last_activity: Instant,
    running: Arc<AtomicBool>,
    logged_in: Arc<AtomicBool>,
}

impl Session {
    pub fn new(credentials: LoginCredentials) -> Self {
        Self {
            credentials,
            state: SessionState::Disconnected,
            last_activity: Instant::now(),
            running: Arc::new(AtomicBool::new(false)),
            logged_in: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Shared flag callers flip to request a stop.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Shared flag reflecting login status across tasks.
    pub fn login_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.logged_in)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Starts (or restarts) the login exchange, returning the packet to
    /// send. Used both for the initial connect and the 45s reconnect;
    /// queued commands are untouched.
    pub fn begin_login(&mut self, now: Instant) -> OutboundPacket {
        self.state = SessionState::LoggingIn;
        self.logged_in.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        self.last_activity = now;
        OutboundPacket::Login {
            password: self.credentials.password.clone(),
        }
    }

    /// Applies a login acknowledgment. A rejection terminates the session
    /// with no automatic retry.
    pub fn on_login_ack(&mut self, success: bool, now: Instant) -> Result<(), RconError> {
        self.last_activity = now;
        if success {
            self.state = SessionState::Authenticated;
            self.logged_in.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            self.state = SessionState::Disconnected;
            self.logged_in.store(false, Ordering::SeqCst);
            self.running.store(false, Ordering::SeqCst);
            Err(RconError::LoginRejected)
        }
    }

    /// Marks the session authenticated without a login ack. Server chat
    /// arriving while we think we are logged out means the server still
    /// holds a live session for us (a login ack was lost in transit).
    pub fn assume_authenticated(&mut self) {
        if self.state != SessionState::Authenticated {
            info!("server traffic implies a live session, marking authenticated");
            self.state = SessionState::Authenticated;
            self.logged_in.store(true, Ordering::SeqCst);
        }
    }

    /// Resets the idle timer; called for every successfully received frame.
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Classifies a receive timeout by how long the socket has been idle.
    /// Keep-alive and reconnect both reset the idle timer so a single
    /// quiet stretch triggers each escalation step once.
    pub fn poll_idle(&mut self, now: Instant) -> IdleAction {
        let elapsed = now.duration_since(self.last_activity);
        if elapsed >= RECONNECT_IDLE {
            self.last_activity = now;
            IdleAction::Reconnect
        } else if elapsed >= KEEPALIVE_IDLE {
            self.last_activity = now;
            IdleAction::KeepAlive
        } else {
            IdleAction::Drain
        }
    }

    /// The fixed keep-alive frame: an empty command with sequence zero.
    pub fn keep_alive_packet() -> OutboundPacket {
        OutboundPacket::Command {
            seq: 0,
            text: String::new(),
        }
    }

    /// Marks the loop as shutting down (transport failure or login
    /// rejection paths).
    pub fn shutdown(&mut self) {
        self.state = SessionState::Stopping;
        self.running.store(false, Ordering::SeqCst);
        self.logged_in.store(false, Ordering::SeqCst);
    }

    /// Whether the loop should terminate: a stop has been requested and
    /// either the queue has drained or the session never authenticated,
    /// so recently enqueued commands are not lost on shutdown.
    pub fn should_stop(&self, queue_empty: bool) -> bool {
        if self.is_running() {
            return false;
        }
        queue_empty || self.state != SessionState::Authenticated
    }
}
