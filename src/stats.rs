//! Counters and snapshots for queues, streams, sessions and nodes
//!
//! The lossy delivery policy makes drops an expected, observable condition
//! rather than an error; these snapshots are how callers see them.

/// Counters for one bounded chunk queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Queue capacity in chunks.
    pub capacity: usize,
    /// Chunks successfully enqueued.
    pub delivered: u64,
    /// Chunks dropped because the queue was full.
    pub dropped: u64,
}

/// Counters for a stream's queue pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamStats {
    pub inbound: QueueStats,
    pub outbound: QueueStats,
}

/// Counters for one relay session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    /// Frames decoded from the peer.
    pub frames_received: u64,
    /// Frames written to the peer.
    pub frames_sent: u64,
    /// Outbound chunks dropped because the peer's send queue was full.
    pub frames_dropped: u64,
}

/// Node-wide counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeStats {
    /// Streams currently registered.
    pub stream_count: usize,
    /// Streams with at least one downstream peer.
    pub relayed_streams: usize,
}
