//! Relay session: the per-peer-connection protocol state machine
//!
//! ```text
//! INIT ──send handshake──► HANDSHAKE_SENT ──peer handshake──► READY ──► CLOSED
//!   │                            │                              │
//!   └────────────── any error ───┴──────────────────────────────┘
//! ```
//!
//! In `READY` the session runs two duties over the same connection: a
//! receive loop decoding inbound frames, and a send duty draining the
//! peer-command channel that the interest table's fan-out feeds. Any
//! decode failure or out-of-order message is a protocol violation: the
//! session closes and the connection is dropped — reconnection belongs to
//! the transport collaborator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};

use crate::id::NodeId;
use crate::registry::StreamRegistry;
use crate::reporter::EventReporter;
use crate::stats::SessionStats;

use super::dispatch::spawn_dispatcher;
use super::interest::InterestTable;
use super::message::{read_message, write_message, Message, ProtocolError, MSG_HANDSHAKE};
use super::peer::{PeerCommand, PeerHandle};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connection established, nothing sent yet
    Init,
    /// Our handshake is on the wire, awaiting the peer's
    HandshakeSent,
    /// Handshake exchange complete, message loop running
    Ready,
    /// Terminal; also reached directly from any state on error
    Closed,
}

#[derive(Default)]
struct SessionCounters {
    received: AtomicU64,
    sent: AtomicU64,
}

/// State machine for one relay connection.
pub struct RelaySession {
    session_id: u64,
    identity: NodeId,
    greeting: String,
    registry: Arc<StreamRegistry>,
    interest: Arc<InterestTable>,
    reporter: Arc<EventReporter>,
    handle: PeerHandle,
    cmd_rx: Option<mpsc::Receiver<PeerCommand>>,
    phase: watch::Sender<SessionPhase>,
    peer_identity: Option<NodeId>,
    counters: Arc<SessionCounters>,
}

impl RelaySession {
    /// Create a session for an established connection.
    ///
    /// `fanout_capacity` bounds the peer's send queue; when it is full,
    /// chunk copies for this peer are dropped rather than blocking the
    /// fan-out.
    pub fn new(
        session_id: u64,
        identity: NodeId,
        greeting: String,
        fanout_capacity: usize,
        registry: Arc<StreamRegistry>,
        interest: Arc<InterestTable>,
        reporter: Arc<EventReporter>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(fanout_capacity);
        let (phase, _) = watch::channel(SessionPhase::Init);
        Self {
            session_id,
            identity,
            greeting,
            registry,
            interest,
            reporter,
            handle: PeerHandle::new(session_id, tx),
            cmd_rx: Some(rx),
            phase,
            peer_identity: None,
            counters: Arc::new(SessionCounters::default()),
        }
    }

    /// Handle through which other components reach this peer.
    ///
    /// Valid to hand out before [`RelaySession::run`]; commands queued
    /// early are delivered once the handshake completes.
    pub fn handle(&self) -> PeerHandle {
        self.handle.clone()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Watch phase transitions.
    ///
    /// [`RelaySession::run`] consumes the session, so a caller that wants
    /// to observe the lifecycle afterwards grabs a receiver first.
    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    /// Identity the peer presented in its handshake.
    pub fn peer_identity(&self) -> Option<NodeId> {
        self.peer_identity
    }

    /// Snapshot of this session's frame counters.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            frames_received: self.counters.received.load(Ordering::Relaxed),
            frames_sent: self.counters.sent.load(Ordering::Relaxed),
            frames_dropped: self.handle.dropped(),
        }
    }

    /// Drive the session until the connection ends or the protocol is
    /// violated.
    ///
    /// Teardown always unregisters this peer from the interest table.
    pub async fn run<C>(mut self, conn: C) -> Result<(), ProtocolError>
    where
        C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut rd, mut wr) = tokio::io::split(conn);

        let hello = Message::Handshake {
            identity: self.identity,
            greeting: self.greeting.clone(),
        };
        if let Err(e) = write_message(&mut wr, &hello).await {
            self.phase.send_replace(SessionPhase::Closed);
            return Err(e);
        }
        self.phase.send_replace(SessionPhase::HandshakeSent);

        // The peer's first message must be its handshake.
        match read_message(&mut rd).await {
            Ok(Message::Handshake { identity, greeting }) => {
                tracing::info!(
                    session_id = self.session_id,
                    peer = %identity,
                    greeting = %greeting,
                    "peer handshake received"
                );
                self.peer_identity = Some(identity);
                self.phase.send_replace(SessionPhase::Ready);
            }
            Ok(other) => {
                self.phase.send_replace(SessionPhase::Closed);
                return Err(ProtocolError::UnexpectedMessage {
                    expected: "handshake",
                    code: other.code(),
                });
            }
            Err(e) => {
                self.phase.send_replace(SessionPhase::Closed);
                return Err(e);
            }
        }

        let cmd_rx = match self.cmd_rx.take() {
            Some(rx) => rx,
            None => return Ok(()), // run() called twice
        };
        let writer = tokio::spawn(writer_loop(wr, cmd_rx, Arc::clone(&self.counters)));

        let result = self.read_loop(&mut rd).await;

        writer.abort();
        self.interest.remove_peer(self.session_id).await;
        self.phase.send_replace(SessionPhase::Closed);

        let stats = self.stats();
        tracing::info!(
            session_id = self.session_id,
            frames_received = stats.frames_received,
            frames_sent = stats.frames_sent,
            frames_dropped = stats.frames_dropped,
            "session closed"
        );
        result
    }

    async fn read_loop<R: AsyncRead + Unpin>(&mut self, rd: &mut R) -> Result<(), ProtocolError> {
        loop {
            match read_message(rd).await {
                Ok(Message::Data { stream_id, chunk }) => {
                    self.counters.received.fetch_add(1, Ordering::Relaxed);

                    // Unknown stream ids are vivified: a relay hop must be
                    // able to carry streams it never locally published.
                    let (stream, created) = self.registry.lookup_or_create(&stream_id).await;
                    if created {
                        tracing::info!(
                            session_id = self.session_id,
                            stream = %stream_id,
                            "stream vivified by peer data"
                        );
                        spawn_dispatcher(Arc::clone(&stream), Arc::clone(&self.interest));
                    }
                    stream.inbound.offer(chunk).await;
                }
                Ok(Message::Request { stream_id }) => {
                    self.counters.received.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(
                        session_id = self.session_id,
                        stream = %stream_id,
                        "peer requested stream"
                    );
                    self.interest
                        .add_downstream(&stream_id, self.handle.clone())
                        .await;
                    self.reporter.log_relay(&stream_id).await;
                }
                Ok(Message::Handshake { .. }) => {
                    return Err(ProtocolError::UnexpectedMessage {
                        expected: "data or request",
                        code: MSG_HANDSHAKE,
                    });
                }
                Err(ProtocolError::ConnectionClosed) => {
                    tracing::debug!(session_id = self.session_id, "peer disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Send duty: drain peer commands onto the wire.
async fn writer_loop<W: AsyncWrite + Unpin>(
    mut wr: W,
    mut rx: mpsc::Receiver<PeerCommand>,
    counters: Arc<SessionCounters>,
) {
    while let Some(cmd) = rx.recv().await {
        let msg = match cmd {
            PeerCommand::Forward { stream_id, chunk } => Message::Data { stream_id, chunk },
            PeerCommand::Request { stream_id } => Message::Request { stream_id },
        };
        if let Err(e) = write_message(&mut wr, &msg).await {
            tracing::debug!(error = %e, "peer write failed, send duty stopped");
            break;
        }
        counters.sent.fetch_add(1, Ordering::Relaxed);
    }
}
