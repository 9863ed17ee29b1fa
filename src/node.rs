//! Node lifecycle and wiring
//!
//! A [`Node`] owns the process-wide collaborators — stream registry,
//! interest table, event reporter — as explicit instances and passes them
//! to every bridge and session it spawns. There are no ambient singletons;
//! two nodes can coexist in one process, which is also how the end-to-end
//! tests run.
//!
//! `start`/`stop` bracket the background peer-report task and all relay
//! sessions attached through the node. Connection establishment,
//! encryption and peer discovery belong to the transport collaborator;
//! the node only adopts connections it is handed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;

use crate::config::NodeConfig;
use crate::error::Error;
use crate::id::{NodeId, StreamId};
use crate::registry::{RegistryError, Stream, StreamRegistry};
use crate::relay::{spawn_dispatcher, InterestTable, PeerHandle, RelaySession};
use crate::reporter::EventReporter;
use crate::stats::NodeStats;

/// The transport collaborator's view of the current peer set.
///
/// Sampled periodically by the node's reporter task.
pub trait PeerDirectory: Send + Sync {
    fn peer_ids(&self) -> Vec<String>;
}

/// One relay node: identity plus the shared tables every collaborator
/// works against.
pub struct Node {
    id: NodeId,
    config: NodeConfig,
    registry: Arc<StreamRegistry>,
    interest: Arc<InterestTable>,
    reporter: Arc<EventReporter>,
    next_session_id: AtomicU64,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Node {
    /// Create a node with the given identity and configuration.
    pub fn new(id: NodeId, config: NodeConfig) -> Self {
        let registry = Arc::new(StreamRegistry::with_queue_capacity(config.queue_capacity));
        let reporter = Arc::new(EventReporter::new(&id, config.report_endpoint.clone()));

        tracing::info!(node = %id, "node created");
        Self {
            id,
            config,
            registry,
            interest: Arc::new(InterestTable::new()),
            reporter,
            next_session_id: AtomicU64::new(1),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// This node's fingerprint.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node's stream registry.
    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// The node's interest table.
    pub fn interest(&self) -> &Arc<InterestTable> {
        &self.interest
    }

    /// The node's configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Start the background reporter task.
    ///
    /// Samples the transport's peer set at the configured interval and
    /// reports it to the visualization sink (a no-op sampler when no sink
    /// is configured).
    pub fn start(&self, directory: Arc<dyn PeerDirectory>) {
        let reporter = Arc::clone(&self.reporter);
        let interval = self.config.report_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let peers = directory.peer_ids();
                reporter.log_peers(&peers).await;
            }
        });
        self.track(handle);
    }

    /// Stop every task started through this node: the reporter and all
    /// attached relay sessions.
    pub fn stop(&self) {
        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        for task in tasks.drain(..) {
            task.abort();
        }
        tracing::info!(node = %self.id, "node stopped");
    }

    /// Begin publishing a new local stream.
    ///
    /// Creates the stream under an id derived from this node's
    /// fingerprint, starts its dispatcher and reports the broadcast.
    /// The caller feeds the stream through an ingress bridge.
    pub async fn publish(&self, label: &str) -> Result<Arc<Stream>, RegistryError> {
        let id = StreamId::new(self.id, label);
        let stream = self.registry.create(id.clone()).await?;

        self.track(spawn_dispatcher(
            Arc::clone(&stream),
            Arc::clone(&self.interest),
        ));

        self.reporter.log_broadcast(&id).await;
        Ok(stream)
    }

    /// Subscribe to a stream by id, creating the local leg on first use.
    ///
    /// The caller drains the stream through an egress bridge.
    pub async fn subscribe(&self, id: &StreamId) -> Arc<Stream> {
        let (stream, created) = self.registry.lookup_or_create(id).await;
        if created {
            self.track(spawn_dispatcher(
                Arc::clone(&stream),
                Arc::clone(&self.interest),
            ));
        }

        self.reporter.log_consume(id).await;
        stream
    }

    /// Subscribe to a stream this node must pull from an upstream peer.
    ///
    /// Registers the peer as the stream's single upstream source and asks
    /// it to start relaying.
    pub async fn subscribe_via(
        &self,
        id: &StreamId,
        upstream: &PeerHandle,
    ) -> Result<Arc<Stream>, Error> {
        let stream = self.subscribe(id).await;
        self.interest.set_upstream(id, upstream.clone()).await;

        if !upstream.request(id.clone()).await {
            return Err(Error::PeerGone);
        }
        Ok(stream)
    }

    /// Tear down a stream this node no longer carries.
    ///
    /// Closes both of the stream's queues (waking any blocked consumer)
    /// and reports the end of the broadcast. Unknown ids are a no-op.
    pub async fn unpublish(&self, id: &StreamId) {
        self.registry.remove(id).await;
        self.reporter.log_done(id).await;
    }

    /// Adopt an established, authenticated connection as a relay session.
    ///
    /// Returns the peer handle other components use to reach this peer.
    /// The session runs until the connection ends or the protocol is
    /// violated; its teardown unregisters the peer from the interest
    /// table.
    pub fn attach_peer<C>(&self, conn: C) -> PeerHandle
    where
        C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let session = RelaySession::new(
            session_id,
            self.id,
            self.config.greeting.clone(),
            self.config.fanout_capacity,
            Arc::clone(&self.registry),
            Arc::clone(&self.interest),
            Arc::clone(&self.reporter),
        );
        let handle = session.handle();

        let node = self.id;
        let task = tokio::spawn(async move {
            if let Err(e) = session.run(conn).await {
                tracing::warn!(node = %node, session_id, error = %e, "relay session failed");
            }
        });
        self.track(task);

        handle
    }

    /// Node-wide counters.
    pub async fn stats(&self) -> NodeStats {
        NodeStats {
            stream_count: self.registry.stream_count().await,
            relayed_streams: self.interest.relayed_stream_count().await,
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        match self.tasks.lock() {
            Ok(mut tasks) => tasks.push(handle),
            Err(poisoned) => poisoned.into_inner().push(handle),
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::chunk::{ChunkKind, CodecParams, VideoChunk};

    struct StaticDirectory(Vec<String>);

    impl PeerDirectory for StaticDirectory {
        fn peer_ids(&self) -> Vec<String> {
            self.0.clone()
        }
    }

    fn make_node(byte: u8) -> Node {
        Node::new(NodeId::new([byte; 32]), NodeConfig::default())
    }

    fn headers() -> Vec<CodecParams> {
        vec![CodecParams::video("h264", Bytes::from_static(&[7]))]
    }

    #[tokio::test]
    async fn test_publish_rejects_duplicate_label() {
        let node = make_node(1);

        let first = node.publish("movie").await.unwrap();
        let err = node.publish("movie").await.unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateStream(_)));

        // The original stream still works.
        assert!(
            first
                .inbound
                .offer(VideoChunk::data(0, headers(), Bytes::from_static(b"a")))
                .await
        );
    }

    #[tokio::test]
    async fn test_publish_wires_dispatcher() {
        let node = make_node(2);
        let stream = node.publish("cam").await.unwrap();

        stream
            .inbound
            .offer(VideoChunk::data(0, headers(), Bytes::from_static(b"h")))
            .await;
        stream
            .inbound
            .offer(VideoChunk::end_of_stream(1, headers()))
            .await;

        assert_eq!(stream.outbound.pop().await.unwrap().seq, 0);
        assert!(stream.outbound.pop().await.unwrap().is_eof());
        assert!(stream.outbound.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent() {
        let node = make_node(3);
        let id = StreamId::new(NodeId::new([9; 32]), "remote");

        let first = node.subscribe(&id).await;
        let second = node.subscribe(&id).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(node.stats().await.stream_count, 1);
    }

    #[tokio::test]
    async fn test_unpublish_removes_stream() {
        let node = make_node(5);
        let stream = node.publish("gone").await.unwrap();
        let id = stream.id().clone();

        node.unpublish(&id).await;
        assert_eq!(node.stats().await.stream_count, 0);
        // Consumers blocked on the removed stream are woken with `None`.
        assert!(stream.outbound.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_start_stop() {
        let node = make_node(4);
        node.start(Arc::new(StaticDirectory(vec!["peer-1".into()])));

        tokio::time::sleep(Duration::from_millis(20)).await;
        node.stop();
    }

    /// Full lifecycle over the node API: A publishes, B pulls through its
    /// session to A and sees the chunk run on its local outbound queue.
    #[tokio::test]
    async fn test_two_node_relay() {
        let node_a = make_node(0xa1);
        let node_b = make_node(0xb2);

        let (conn_a, conn_b) = tokio::io::duplex(64 * 1024);
        let _handle_to_b = node_a.attach_peer(conn_a);
        let handle_to_a = node_b.attach_peer(conn_b);

        let stream_a = node_a.publish("show").await.unwrap();
        let id = stream_a.id().clone();

        let stream_b = node_b.subscribe_via(&id, &handle_to_a).await.unwrap();

        // Wait for the request to land before producing.
        tokio::time::timeout(Duration::from_secs(5), async {
            while node_a.interest().downstream_peers(&id).await.is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("subscription never reached the publisher");

        for (seq, payload) in [(0u64, "hdr"), (1, "c1"), (2, "c2")] {
            stream_a
                .inbound
                .offer(VideoChunk::data(seq, headers(), Bytes::from(payload.as_bytes().to_vec())))
                .await;
        }
        stream_a
            .inbound
            .offer(VideoChunk::end_of_stream(3, headers()))
            .await;

        for expected in 0..3u64 {
            let chunk = stream_b.outbound.pop().await.unwrap();
            assert_eq!(chunk.kind, ChunkKind::Data);
            assert_eq!(chunk.seq, expected);
        }
        assert!(stream_b.outbound.pop().await.unwrap().is_eof());
        assert!(stream_b.outbound.pop().await.is_none());

        node_a.stop();
        node_b.stop();
    }
}
