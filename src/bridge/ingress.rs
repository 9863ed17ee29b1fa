//! Ingress path: publish connection → `Stream.inbound`

use crate::chunk::VideoChunk;
use crate::registry::Stream;

use super::{BridgeError, MediaSource};

/// Pump a media source into a stream's inbound queue.
///
/// Reads the format descriptors once, then wraps every packet as a data
/// chunk with a sequence counter starting at 0. The seq-0 chunk is the one
/// a consumer needs before playback can start, so the queue gives it a
/// blocking send; later chunks are lossy. On clean end-of-input, one
/// end-of-stream chunk carrying the final sequence value is offered and the
/// inbound queue is closed so downstream loops terminate.
///
/// I/O errors other than clean end-of-input propagate without closing the
/// queue: the stream stays intact for a new publish to resume.
pub async fn run_ingress<S: MediaSource>(
    src: &mut S,
    stream: &Stream,
) -> Result<(), BridgeError> {
    let headers = src.codec_params().await?;
    tracing::debug!(
        stream = %stream.id(),
        descriptors = headers.len(),
        "ingress started"
    );

    let mut seq: u64 = 0;
    loop {
        match src.read_packet().await? {
            Some(payload) => {
                // Descriptors ride on every chunk so any chunk can be a
                // consumer's first.
                let chunk = VideoChunk::data(seq, headers.clone(), payload);
                stream.inbound.offer(chunk).await;
                seq += 1;
            }
            None => {
                let eof = VideoChunk::end_of_stream(seq, headers);
                stream.inbound.offer(eof).await;
                tracing::info!(stream = %stream.id(), last_seq = seq, "ingress finished");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use bytes::Bytes;

    use super::*;
    use crate::chunk::{ChunkKind, CodecParams};
    use crate::id::{NodeId, StreamId};
    use crate::registry::StreamRegistry;

    /// Scripted source: a fixed run of packets, then EOF or an error.
    struct ScriptedSource {
        params: Vec<CodecParams>,
        packets: VecDeque<Bytes>,
        fail_at_end: bool,
    }

    impl MediaSource for ScriptedSource {
        async fn codec_params(&mut self) -> Result<Vec<CodecParams>, BridgeError> {
            Ok(self.params.clone())
        }

        async fn read_packet(&mut self) -> Result<Option<Bytes>, BridgeError> {
            match self.packets.pop_front() {
                Some(pkt) => Ok(Some(pkt)),
                None if self.fail_at_end => Err(BridgeError::Source("connection reset".into())),
                None => Ok(None),
            }
        }
    }

    async fn make_stream() -> Arc<crate::registry::Stream> {
        let registry = StreamRegistry::new();
        let id = StreamId::new(NodeId::new([2; 32]), "ingress-test");
        registry.create(id).await.unwrap()
    }

    #[tokio::test]
    async fn test_sequenced_chunks_then_eof() {
        let stream = make_stream().await;
        let mut src = ScriptedSource {
            params: vec![CodecParams::video("h264", Bytes::from_static(&[1]))],
            packets: VecDeque::from(vec![
                Bytes::from_static(b"p0"),
                Bytes::from_static(b"p1"),
                Bytes::from_static(b"p2"),
            ]),
            fail_at_end: false,
        };

        run_ingress(&mut src, &stream).await.unwrap();

        for expected in 0..3u64 {
            let chunk = stream.inbound.pop().await.unwrap();
            assert_eq!(chunk.kind, ChunkKind::Data);
            assert_eq!(chunk.seq, expected);
            assert_eq!(chunk.headers.len(), 1);
        }

        let eof = stream.inbound.pop().await.unwrap();
        assert_eq!(eof.kind, ChunkKind::EndOfStream);
        assert_eq!(eof.seq, 3);

        // Queue closed after EOF.
        assert!(stream.inbound.pop().await.is_none());
    }

    #[tokio::test]
    async fn test_io_failure_leaves_stream_open() {
        let stream = make_stream().await;
        let mut src = ScriptedSource {
            params: Vec::new(),
            packets: VecDeque::from(vec![Bytes::from_static(b"p0")]),
            fail_at_end: true,
        };

        let err = run_ingress(&mut src, &stream).await.unwrap_err();
        assert!(matches!(err, BridgeError::Source(_)));

        // The chunk that made it is still there and the queue is open,
        // so a new publish can resume the stream.
        assert!(!stream.inbound.is_closed().await);
        assert_eq!(stream.inbound.pop().await.unwrap().seq, 0);
    }
}
