//! Per-stream chunk dispatch
//!
//! One pump task per active stream moves chunks from the inbound queue to
//! the outbound queue and fans one independent copy out to every
//! currently-registered downstream peer. Each peer's copy is delivered
//! through that peer's own lossy send queue, so a slow peer drops its own
//! chunks instead of blocking the others.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::registry::Stream;

use super::interest::InterestTable;

/// Pump a stream until its inbound queue terminates.
///
/// Sequence numbers pass through unchanged; strict ordering holds along
/// each single queue hop, not across fan-out targets. An end-of-stream
/// chunk is itself forwarded, closes the outbound queue, and ends the
/// pump.
pub async fn pump_stream(stream: Arc<Stream>, interest: Arc<InterestTable>) {
    loop {
        let chunk = match stream.inbound.pop().await {
            Some(chunk) => chunk,
            None => {
                // Inbound closed without an EOF chunk (administrative
                // teardown); propagate the close.
                stream.outbound.close().await;
                break;
            }
        };
        let is_eof = chunk.is_eof();

        stream.outbound.offer(chunk.clone()).await;

        for peer in interest.downstream_peers(stream.id()).await {
            peer.forward(stream.id().clone(), chunk.clone());
        }

        if is_eof {
            break;
        }
    }
    tracing::debug!(stream = %stream.id(), "dispatch finished");
}

/// Spawn the pump for a stream.
pub fn spawn_dispatcher(stream: Arc<Stream>, interest: Arc<InterestTable>) -> JoinHandle<()> {
    tokio::spawn(pump_stream(stream, interest))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio::sync::mpsc;

    use super::*;
    use crate::chunk::{ChunkKind, CodecParams, VideoChunk};
    use crate::id::{NodeId, StreamId};
    use crate::registry::StreamRegistry;
    use crate::relay::peer::{PeerCommand, PeerHandle};

    fn headers() -> Vec<CodecParams> {
        vec![CodecParams::video("h264", Bytes::from_static(&[0]))]
    }

    async fn make_stream(label: &str) -> Arc<Stream> {
        let registry = StreamRegistry::new();
        let id = StreamId::new(NodeId::new([6; 32]), label);
        registry.create(id).await.unwrap()
    }

    #[tokio::test]
    async fn test_inbound_relayed_to_outbound_in_order() {
        let stream = make_stream("order").await;
        let interest = Arc::new(InterestTable::new());

        let pump = spawn_dispatcher(Arc::clone(&stream), Arc::clone(&interest));

        stream
            .inbound
            .offer(VideoChunk::data(0, headers(), Bytes::from_static(b"h")))
            .await;
        stream
            .inbound
            .offer(VideoChunk::data(1, headers(), Bytes::from_static(b"a")))
            .await;
        stream
            .inbound
            .offer(VideoChunk::data(2, headers(), Bytes::from_static(b"b")))
            .await;
        stream
            .inbound
            .offer(VideoChunk::end_of_stream(3, headers()))
            .await;

        for expected in 0..3u64 {
            let chunk = stream.outbound.pop().await.unwrap();
            assert_eq!(chunk.kind, ChunkKind::Data);
            assert_eq!(chunk.seq, expected);
        }
        assert!(stream.outbound.pop().await.unwrap().is_eof());
        assert!(stream.outbound.pop().await.is_none());

        pump.await.unwrap();
    }

    #[tokio::test]
    async fn test_fanout_to_downstream_peers() {
        let stream = make_stream("fanout").await;
        let interest = Arc::new(InterestTable::new());

        let (tx_a, mut rx_a) = mpsc::channel(16);
        let (tx_b, mut rx_b) = mpsc::channel(16);
        interest
            .add_downstream(stream.id(), PeerHandle::new(1, tx_a))
            .await;
        interest
            .add_downstream(stream.id(), PeerHandle::new(2, tx_b))
            .await;

        let pump = spawn_dispatcher(Arc::clone(&stream), Arc::clone(&interest));

        stream
            .inbound
            .offer(VideoChunk::data(0, headers(), Bytes::from_static(b"x")))
            .await;
        stream
            .inbound
            .offer(VideoChunk::end_of_stream(1, headers()))
            .await;
        pump.await.unwrap();

        // Each peer gets its own copy of every chunk, EOF included.
        for rx in [&mut rx_a, &mut rx_b] {
            match rx.recv().await.unwrap() {
                PeerCommand::Forward { stream_id, chunk } => {
                    assert_eq!(&stream_id, stream.id());
                    assert_eq!(chunk.seq, 0);
                }
                other => panic!("unexpected command: {:?}", other),
            }
            match rx.recv().await.unwrap() {
                PeerCommand::Forward { chunk, .. } => assert!(chunk.is_eof()),
                other => panic!("unexpected command: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_closed_inbound_closes_outbound() {
        let stream = make_stream("teardown").await;
        let interest = Arc::new(InterestTable::new());

        let pump = spawn_dispatcher(Arc::clone(&stream), interest);
        stream.inbound.close().await;
        pump.await.unwrap();

        assert!(stream.outbound.pop().await.is_none());
    }
}
