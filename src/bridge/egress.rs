//! Egress path: `Stream.outbound` → play/pull connection

use crate::registry::Stream;

use super::{BridgeError, MediaSink};

/// Pump a stream's outbound queue into a media sink.
///
/// Blocks on the first dequeue to obtain the format descriptors, emits
/// them, then emits payloads until an end-of-stream chunk arrives, at
/// which point the trailer is written and the loop returns normally.
///
/// There is deliberately no distinction between "publisher paused" and
/// "publisher finished": a gap simply blocks until the next chunk or the
/// end-of-stream marker. A permanently idle producer leaves this loop
/// blocked on the first dequeue; tearing that down is the caller's job
/// (e.g. on connection close).
pub async fn run_egress<S: MediaSink>(stream: &Stream, sink: &mut S) -> Result<(), BridgeError> {
    let first = match stream.outbound.pop().await {
        Some(chunk) => chunk,
        None => {
            // Closed before any chunk: nothing to play.
            tracing::debug!(stream = %stream.id(), "egress found queue closed");
            return Ok(());
        }
    };

    sink.write_params(&first.headers).await?;
    tracing::debug!(stream = %stream.id(), first_seq = first.seq, "egress started");

    if first.is_eof() {
        sink.write_trailer().await?;
        return Ok(());
    }
    sink.write_packet(first.payload).await?;

    loop {
        match stream.outbound.pop().await {
            Some(chunk) if chunk.is_eof() => {
                sink.write_trailer().await?;
                tracing::info!(stream = %stream.id(), last_seq = chunk.seq, "egress finished");
                return Ok(());
            }
            Some(chunk) => sink.write_packet(chunk.payload).await?,
            None => return Ok(()),
        }
    }
}
