//! Per-stream state held by the registry

use crate::id::StreamId;
use crate::stats::StreamStats;

use super::queue::ChunkQueue;

/// One live session: an identifier plus a pair of bounded delivery queues.
///
/// Owned exclusively by the [`StreamRegistry`](super::StreamRegistry) as an
/// `Arc<Stream>`; media bridges and relay sessions hold references, never
/// copies. A stream's queues are only ever produced-to by one task at a
/// time (the ingress bridge, or the relay session forwarding inbound data).
#[derive(Debug)]
pub struct Stream {
    id: StreamId,
    /// Chunks arriving from the local publisher or an upstream peer.
    pub inbound: ChunkQueue,
    /// Chunks ready for the local consumer.
    pub outbound: ChunkQueue,
}

impl Stream {
    pub(super) fn new(id: StreamId, queue_capacity: usize) -> Self {
        Self {
            id,
            inbound: ChunkQueue::new(queue_capacity),
            outbound: ChunkQueue::new(queue_capacity),
        }
    }

    /// This stream's identifier.
    pub fn id(&self) -> &StreamId {
        &self.id
    }

    /// Close both queues. Idempotent.
    pub async fn shutdown(&self) {
        self.inbound.close().await;
        self.outbound.close().await;
    }

    /// Snapshot of both queues' counters.
    pub fn stats(&self) -> StreamStats {
        StreamStats {
            inbound: self.inbound.stats(),
            outbound: self.outbound.stats(),
        }
    }
}
