//! Bounded lossy chunk queue
//!
//! Each stream carries two of these (inbound and outbound), with a small
//! fixed capacity. The delivery policy favors live latency over
//! completeness:
//!
//! - the first chunk ever written (carrying the codec descriptors a
//!   consumer needs before playback can start) waits for room;
//! - subsequent data chunks are dropped when the queue is full, and the
//!   drop is counted — a paused consumer never stalls the producer;
//! - an end-of-stream chunk is sent best-effort, then the producing side
//!   closes so blocked consumers wake deterministically.
//!
//! Drops are a metric, never an error.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;

use crate::chunk::VideoChunk;
use crate::stats::QueueStats;

/// Default queue capacity, in chunks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Bounded FIFO queue of chunks with lossy backpressure.
#[derive(Debug)]
pub struct ChunkQueue {
    tx: Mutex<Option<mpsc::Sender<VideoChunk>>>,
    rx: Mutex<mpsc::Receiver<VideoChunk>>,
    capacity: usize,
    first_sent: AtomicBool,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl ChunkQueue {
    /// Create a queue with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(rx),
            capacity,
            first_sent: AtomicBool::new(false),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Write a chunk under the delivery policy.
    ///
    /// Returns `true` if the chunk was enqueued. A `false` return means
    /// the chunk was dropped (queue full) or the queue is closed; neither
    /// is an error.
    pub async fn offer(&self, chunk: VideoChunk) -> bool {
        let is_eof = chunk.is_eof();

        let tx = match self.tx.lock().await.clone() {
            Some(tx) => tx,
            None => return false,
        };

        let enqueued = if is_eof {
            self.try_push(&tx, chunk)
        } else if !self.first_sent.swap(true, Ordering::SeqCst) {
            // First chunk: the consumer cannot start without it, so wait.
            tx.send(chunk).await.is_ok()
        } else {
            self.try_push(&tx, chunk)
        };

        if enqueued {
            self.delivered.fetch_add(1, Ordering::Relaxed);
        }

        if is_eof {
            self.close().await;
        }

        enqueued
    }

    fn try_push(&self, tx: &mpsc::Sender<VideoChunk>, chunk: VideoChunk) -> bool {
        match tx.try_send(chunk) {
            Ok(()) => true,
            Err(TrySendError::Full(chunk)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(seq = chunk.seq, "chunk dropped, queue full");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Close the producing side. Idempotent.
    ///
    /// Consumers blocked in [`ChunkQueue::pop`] drain whatever is buffered
    /// and then observe `None`.
    pub async fn close(&self) {
        self.tx.lock().await.take();
    }

    /// Whether the producing side has been closed.
    pub async fn is_closed(&self) -> bool {
        self.tx.lock().await.is_none()
    }

    /// Receive the next chunk.
    ///
    /// Blocks until a chunk is available; returns `None` once the queue is
    /// closed and drained.
    pub async fn pop(&self) -> Option<VideoChunk> {
        self.rx.lock().await.recv().await
    }

    /// Snapshot of the queue's counters.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            capacity: self.capacity,
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    /// Queue capacity in chunks.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
