//! Stream registry implementation
//!
//! The only place new sessions are born. The registry maps stream ids to
//! their [`Stream`] entries; all per-stream data flow happens on the
//! streams' own queues, never under the registry lock, so a slow consumer
//! on one stream cannot stall lookups or unrelated streams.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::id::StreamId;

use super::entry::Stream;
use super::error::RegistryError;
use super::queue::DEFAULT_QUEUE_CAPACITY;

/// Central registry for all active streams
///
/// Thread-safe via `RwLock`; the lock is held only for map operations.
/// Finished streams are not garbage collected: [`StreamRegistry::remove`]
/// is the only teardown path.
pub struct StreamRegistry {
    streams: RwLock<HashMap<StreamId, Arc<Stream>>>,
    queue_capacity: usize,
}

impl StreamRegistry {
    /// Create a registry whose streams use the default queue capacity.
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a registry with a custom per-queue capacity.
    pub fn with_queue_capacity(queue_capacity: usize) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            queue_capacity,
        }
    }

    /// Create a new stream.
    ///
    /// Atomically checks and inserts: under concurrent calls with the same
    /// id, exactly one caller succeeds and the rest get
    /// [`RegistryError::DuplicateStream`].
    pub async fn create(&self, id: StreamId) -> Result<Arc<Stream>, RegistryError> {
        let mut streams = self.streams.write().await;

        if streams.contains_key(&id) {
            return Err(RegistryError::DuplicateStream(id));
        }

        let stream = Arc::new(Stream::new(id.clone(), self.queue_capacity));
        streams.insert(id.clone(), Arc::clone(&stream));

        tracing::info!(stream = %id, "stream created");
        Ok(stream)
    }

    /// Look up an existing stream.
    pub async fn lookup(&self, id: &StreamId) -> Result<Arc<Stream>, RegistryError> {
        self.streams
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Look up a stream, creating it if absent.
    ///
    /// Returns the stream and whether it was newly created. Used by the
    /// subscribe path and by relay sessions that vivify streams on first
    /// contact.
    pub async fn lookup_or_create(&self, id: &StreamId) -> (Arc<Stream>, bool) {
        if let Ok(stream) = self.lookup(id).await {
            return (stream, false);
        }

        let mut streams = self.streams.write().await;
        if let Some(stream) = streams.get(id) {
            return (Arc::clone(stream), false);
        }

        let stream = Arc::new(Stream::new(id.clone(), self.queue_capacity));
        streams.insert(id.clone(), Arc::clone(&stream));
        tracing::info!(stream = %id, "stream created on demand");
        (stream, true)
    }

    /// Administrative teardown: remove the stream and close its queues.
    pub async fn remove(&self, id: &StreamId) {
        let removed = self.streams.write().await.remove(id);

        // Queue closing happens outside the map lock.
        if let Some(stream) = removed {
            stream.shutdown().await;
            tracing::info!(stream = %id, "stream removed");
        }
    }

    /// Number of registered streams.
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }

    /// Snapshot of all registered stream ids.
    pub async fn stream_ids(&self) -> Vec<StreamId> {
        self.streams.read().await.keys().cloned().collect()
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
