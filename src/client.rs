//! The network loop: owns the socket and drives the whole protocol.
//!
//! One task runs [`RconClient::run`]; everything else talks to it through
//! an [`RconHandle`]. Each loop iteration either handles one inbound
//! datagram or, after five quiet seconds, applies the session's idle
//! policy; both paths finish by draining the command queue when
//! authenticated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::error::RconError;
use crate::protocol::{self, InboundFrame, OutboundPacket, ResponseBody};
use crate::queue::{CommandKind, CommandQueue};
use crate::reassembly::FragmentReassembler;
use crate::response;
use crate::session::{IdleAction, LoginCredentials, Session};
use crate::sink::{QueryResult, ResponseSink};

/// How long one receive may block before the idle policy runs.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);
/// Receive buffer size; comfortably above the server's datagram sizes.
const RECV_BUFFER: usize = 4096;

/// Caller-side handle for enqueueing commands and requesting shutdown.
///
/// Cheap to clone; all methods are safe to call from any task. Enqueues
/// are silently dropped while the session is not running.
#[derive(Debug, Clone)]
pub struct RconHandle {
    queue: Arc<CommandQueue>,
    running: Arc<AtomicBool>,
    logged_in: Arc<AtomicBool>,
}

impl RconHandle {
    /// Enqueues a raw command for the next queue drain.
    pub fn command(&self, text: impl Into<String>) {
        self.queue.push_plain(text.into());
    }

    /// Enqueues a player-listing query; the decoded result is delivered
    /// to the sink under `correlation_id`.
    pub fn players(&self, text: impl Into<String>, correlation_id: u32) {
        self.queue.push_players_query(text.into(), correlation_id);
    }

    /// Enqueues a mission-listing query; the decoded result is delivered
    /// to the sink under `correlation_id`.
    pub fn missions(&self, text: impl Into<String>, correlation_id: u32) {
        self.queue.push_missions_query(text.into(), correlation_id);
    }

    /// Requests a stop. The loop honors it once the queue is empty (or
    /// immediately if the session never authenticated).
    pub fn disconnect(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the server has accepted our login.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }
}

/// RCON client for one server session.
pub struct RconClient {
    socket: UdpSocket,
    session: Session,
    queue: Arc<CommandQueue>,
    reassembler: FragmentReassembler,
    sink: Box<dyn ResponseSink>,
}

impl RconClient {
    /// Binds a local socket and connects it to the server. No traffic is
    /// sent until [`run`](Self::run).
    pub async fn connect(
        credentials: LoginCredentials,
        sink: Box<dyn ResponseSink>,
    ) -> Result<Self, RconError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket
            .connect((credentials.address.as_str(), credentials.port))
            .await?;

        let session = Session::new(credentials);
        let queue = Arc::new(CommandQueue::new(session.running_flag()));

        Ok(Self {
            socket,
            session,
            queue,
            reassembler: FragmentReassembler::new(),
            sink,
        })
    }

    pub fn handle(&self) -> RconHandle {
        RconHandle {
            queue: Arc::clone(&self.queue),
            running: self.session.running_flag(),
            logged_in: self.session.login_flag(),
        }
    }

    /// Runs the session to completion: logs in, then receives, dispatches
    /// and sends until a stop is honored or the transport fails.
    pub async fn run(&mut self) -> Result<(), RconError> {
        let login = self.session.begin_login(Instant::now());
        self.send(&login).await?;
        info!("sent login request to {}", self.session.credentials().address);

        let mut buffer = [0u8; RECV_BUFFER];
        loop {
            match timeout(RECV_TIMEOUT, self.socket.recv(&mut buffer)).await {
                Ok(Ok(len)) => {
                    let now = Instant::now();
                    self.session.touch(now);
                    match protocol::decode(&buffer[..len]) {
                        Ok(frame) => self.handle_frame(frame, now).await?,
                        Err(e) => warn!("discarding datagram: {}", e),
                    }
                }
                Ok(Err(e)) => {
                    error!("transport failure: {}", e);
                    self.session.shutdown();
                    return Err(RconError::Transport(e));
                }
                Err(_elapsed) => {
                    // No idle escalation once a stop has been requested;
                    // a reconnect would resurrect the running flag.
                    if self.session.is_running() {
                        self.handle_idle().await?;
                    }
                }
            }

            if self.session.is_authenticated() {
                self.flush_queue().await?;
            }
            if self.session.should_stop(self.queue.is_empty()) {
                break;
            }
        }

        info!("rcon session stopped");
        Ok(())
    }

    async fn handle_frame(&mut self, frame: InboundFrame, now: Instant) -> Result<(), RconError> {
        match frame {
            InboundFrame::LoginAck { success: true } => {
                info!("rcon login accepted");
                self.session.on_login_ack(true, now)?;
            }
            InboundFrame::LoginAck { success: false } => {
                warn!("rcon login rejected");
                self.session.on_login_ack(false, now)?;
            }
            InboundFrame::CommandResponse { seq, body } => {
                if !self.session.is_authenticated() {
                    debug!("ignoring command response before login");
                    return Ok(());
                }
                match body {
                    ResponseBody::Single(bytes) => self.dispatch_response(seq, &bytes),
                    ResponseBody::Fragment { total, index, bytes } => {
                        if let Some(message) = self.reassembler.insert(seq, index, bytes, total, now) {
                            self.dispatch_response(seq, &message);
                        }
                    }
                }
            }
            InboundFrame::ServerMessage { echo, text } => {
                if !self.session.is_authenticated() {
                    // Chat only flows on live sessions; our login ack was lost.
                    self.session.assume_authenticated();
                    return Ok(());
                }
                self.sink.chat(&text);
                // Echo one byte back so the server does not count us idle.
                self.send(&OutboundPacket::ServerAck { echo }).await?;
            }
        }
        Ok(())
    }

    /// Routes a complete response body by the sequence byte the original
    /// command carried.
    fn dispatch_response(&mut self, seq: u8, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        match seq {
            s if s == CommandKind::PlayersQuery.sequence() => {
                let mut players = Vec::new();
                for parsed in response::parse_player_listing(&text) {
                    match parsed {
                        Ok(record) => players.push(record),
                        Err(e) => warn!("player listing: {}", e),
                    }
                }
                for id in self.queue.take_player_ids() {
                    self.sink.deliver(id, QueryResult::Players(players.clone()));
                }
            }
            s if s == CommandKind::MissionsQuery.sequence() => {
                let missions = response::parse_mission_listing(&text);
                for id in self.queue.take_mission_ids() {
                    self.sink.deliver(id, QueryResult::Missions(missions.clone()));
                }
            }
            _ => info!("server response: {}", text),
        }
    }

    async fn handle_idle(&mut self) -> Result<(), RconError> {
        match self.session.poll_idle(Instant::now()) {
            IdleAction::Reconnect => {
                warn!("rcon timed out, resending login");
                let login = self.session.begin_login(Instant::now());
                self.send(&login).await?;
            }
            IdleAction::KeepAlive => {
                debug!("sending keep-alive");
                self.send(&Session::keep_alive_packet()).await?;
            }
            IdleAction::Drain => {}
        }
        Ok(())
    }

    /// Sends every queued command, oldest first. Fire-and-forget: there
    /// is no per-command ack or retry.
    async fn flush_queue(&mut self) -> Result<(), RconError> {
        for command in self.queue.drain() {
            let packet = OutboundPacket::Command {
                seq: command.kind.sequence(),
                text: command.text,
            };
            self.send(&packet).await?;
        }
        Ok(())
    }

    async fn send(&self, packet: &OutboundPacket) -> Result<(), RconError> {
        self.socket.send(&protocol::encode(packet)).await?;
        Ok(())
    }
}
