//! Peer handles
//!
//! A [`PeerHandle`] is the opaque reference other components hold to an
//! established relay connection. It feeds the owning session's writer
//! through a bounded command channel: chunk forwarding is non-blocking and
//! lossy (a slow peer drops its own copies, never stalls the fan-out),
//! subscription requests are awaited.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::chunk::VideoChunk;
use crate::id::StreamId;

/// Command delivered to a session's writer duty.
#[derive(Debug)]
pub enum PeerCommand {
    /// Forward one chunk of a stream to the peer.
    Forward {
        stream_id: StreamId,
        chunk: VideoChunk,
    },
    /// Ask the peer to relay a stream to us.
    Request { stream_id: StreamId },
}

/// Handle to one connected peer's relay session.
///
/// Cheap to clone; clones share the command channel and drop counter.
/// Equality is by session id, which is what makes downstream registration
/// idempotent.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    session_id: u64,
    tx: mpsc::Sender<PeerCommand>,
    dropped: Arc<AtomicU64>,
}

impl PeerHandle {
    pub(crate) fn new(session_id: u64, tx: mpsc::Sender<PeerCommand>) -> Self {
        Self {
            session_id,
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Session id of the owning relay session.
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Queue a chunk for delivery to this peer.
    ///
    /// Non-blocking: if the peer's send queue is full the copy is dropped
    /// and counted. Returns whether the chunk was queued.
    pub fn forward(&self, stream_id: StreamId, chunk: VideoChunk) -> bool {
        match self.tx.try_send(PeerCommand::Forward { stream_id, chunk }) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(session_id = self.session_id, "peer copy dropped, send queue full");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Ask this peer to start relaying a stream to us.
    ///
    /// Returns `false` if the session has already gone away.
    pub async fn request(&self, stream_id: StreamId) -> bool {
        self.tx
            .send(PeerCommand::Request { stream_id })
            .await
            .is_ok()
    }

    /// Chunk copies dropped because this peer's send queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl PartialEq for PeerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.session_id == other.session_id
    }
}

impl Eq for PeerHandle {}
