//! Interest table: who wants which stream
//!
//! Per-stream bookkeeping of downstream peers (subscribers to fan out to)
//! and the at-most-one upstream peer (the source to pull from when this
//! node is a relay hop rather than the origin). Synchronized independently
//! of the registry; holders of the table lock never touch queues.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::id::StreamId;

use super::peer::PeerHandle;

#[derive(Default)]
struct Interest {
    /// Registration-ordered, deduplicated by session id.
    downstream: Vec<PeerHandle>,
    upstream: Option<PeerHandle>,
}

/// Table of per-stream peer interest, driving fan-out routing.
#[derive(Default)]
pub struct InterestTable {
    entries: RwLock<HashMap<StreamId, Interest>>,
}

impl InterestTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a downstream subscriber for a stream.
    ///
    /// Append-only and idempotent: re-registering the same peer leaves a
    /// single fan-out entry.
    pub async fn add_downstream(&self, stream_id: &StreamId, peer: PeerHandle) {
        let mut entries = self.entries.write().await;
        let interest = entries.entry(stream_id.clone()).or_default();

        if interest.downstream.iter().any(|p| *p == peer) {
            return;
        }

        tracing::info!(
            stream = %stream_id,
            session_id = peer.session_id(),
            subscribers = interest.downstream.len() + 1,
            "downstream peer registered"
        );
        interest.downstream.push(peer);
    }

    /// Record the single upstream source for a stream.
    ///
    /// A second registration replaces the prior one; the switch is logged.
    pub async fn set_upstream(&self, stream_id: &StreamId, peer: PeerHandle) {
        let mut entries = self.entries.write().await;
        let interest = entries.entry(stream_id.clone()).or_default();

        if let Some(prior) = &interest.upstream {
            if *prior != peer {
                tracing::warn!(
                    stream = %stream_id,
                    prior = prior.session_id(),
                    new = peer.session_id(),
                    "upstream peer replaced"
                );
            }
        }
        interest.upstream = Some(peer);
    }

    /// Downstream peers for a stream, in registration order.
    pub async fn downstream_peers(&self, stream_id: &StreamId) -> Vec<PeerHandle> {
        self.entries
            .read()
            .await
            .get(stream_id)
            .map(|i| i.downstream.clone())
            .unwrap_or_default()
    }

    /// The upstream source for a stream, if one is registered.
    pub async fn upstream_peer(&self, stream_id: &StreamId) -> Option<PeerHandle> {
        self.entries
            .read()
            .await
            .get(stream_id)
            .and_then(|i| i.upstream.clone())
    }

    /// Drop every registration held by a disconnected peer's session.
    ///
    /// Called from relay session teardown; without it a long-running relay
    /// would fan out into dead channels forever.
    pub async fn remove_peer(&self, session_id: u64) {
        let mut entries = self.entries.write().await;
        for (stream_id, interest) in entries.iter_mut() {
            let before = interest.downstream.len();
            interest.downstream.retain(|p| p.session_id() != session_id);
            if interest.downstream.len() != before {
                tracing::debug!(
                    stream = %stream_id,
                    session_id,
                    "downstream peer removed"
                );
            }
            if interest
                .upstream
                .as_ref()
                .is_some_and(|p| p.session_id() == session_id)
            {
                interest.upstream = None;
                tracing::debug!(stream = %stream_id, session_id, "upstream peer removed");
            }
        }
    }

    /// Number of streams with at least one downstream peer.
    pub async fn relayed_stream_count(&self) -> usize {
        self.entries
            .read()
            .await
            .values()
            .filter(|i| !i.downstream.is_empty())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::id::NodeId;

    fn stream_id(label: &str) -> StreamId {
        StreamId::new(NodeId::new([5; 32]), label)
    }

    fn handle(session_id: u64) -> PeerHandle {
        let (tx, rx) = mpsc::channel(4);
        std::mem::forget(rx); // keep the channel alive for the test
        PeerHandle::new(session_id, tx)
    }

    #[tokio::test]
    async fn test_downstream_idempotent() {
        let table = InterestTable::new();
        let id = stream_id("s");

        table.add_downstream(&id, handle(1)).await;
        table.add_downstream(&id, handle(1)).await;
        table.add_downstream(&id, handle(2)).await;

        let peers = table.downstream_peers(&id).await;
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].session_id(), 1);
        assert_eq!(peers[1].session_id(), 2);
    }

    #[tokio::test]
    async fn test_upstream_replaced() {
        let table = InterestTable::new();
        let id = stream_id("s");

        table.set_upstream(&id, handle(1)).await;
        table.set_upstream(&id, handle(2)).await;

        assert_eq!(table.upstream_peer(&id).await.unwrap().session_id(), 2);
    }

    #[tokio::test]
    async fn test_remove_peer_clears_both_roles() {
        let table = InterestTable::new();
        let a = stream_id("a");
        let b = stream_id("b");

        table.add_downstream(&a, handle(1)).await;
        table.add_downstream(&a, handle(2)).await;
        table.set_upstream(&b, handle(1)).await;

        table.remove_peer(1).await;

        let peers = table.downstream_peers(&a).await;
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].session_id(), 2);
        assert!(table.upstream_peer(&b).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_stream_is_empty() {
        let table = InterestTable::new();
        assert!(table.downstream_peers(&stream_id("ghost")).await.is_empty());
        assert!(table.upstream_peer(&stream_id("ghost")).await.is_none());
    }
}
