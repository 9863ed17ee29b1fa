//! Media chunks and their wire codec
//!
//! A [`VideoChunk`] is one sequenced unit of encoded media plus the format
//! descriptors a consumer needs to begin decoding. Descriptors are carried
//! in full on every chunk so a consumer can start playback from any chunk
//! it happens to receive first.

pub mod codec;

pub use codec::{decode_chunk, encode_chunk, CodecError};

use bytes::Bytes;

/// Kind of media a codec descriptor applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

/// Codec/format metadata for one elementary stream.
///
/// The `extradata` blob is opaque to the relay; it is handed to the
/// playback sink unchanged (e.g. an AVC decoder configuration record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecParams {
    pub kind: MediaKind,
    /// Codec name, e.g. "h264" or "aac".
    pub codec: String,
    /// Opaque decoder configuration (zero-copy via reference counting).
    pub extradata: Bytes,
}

impl CodecParams {
    /// Create a video descriptor.
    pub fn video(codec: impl Into<String>, extradata: Bytes) -> Self {
        Self {
            kind: MediaKind::Video,
            codec: codec.into(),
            extradata,
        }
    }

    /// Create an audio descriptor.
    pub fn audio(codec: impl Into<String>, extradata: Bytes) -> Self {
        Self {
            kind: MediaKind::Audio,
            codec: codec.into(),
            extradata,
        }
    }
}

/// Kind of chunk flowing through a stream's queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// One encoded media packet.
    Data,
    /// Terminates a stream's production; payload is empty.
    EndOfStream,
}

/// One sequenced unit of media.
///
/// Sequence numbers strictly increase within a single producer's output;
/// exactly one `EndOfStream` chunk terminates a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoChunk {
    pub kind: ChunkKind,
    /// Per-stream sequence number, starting at 0.
    pub seq: u64,
    /// Format descriptors, present on every chunk.
    pub headers: Vec<CodecParams>,
    /// One encoded media packet (empty for `EndOfStream`).
    pub payload: Bytes,
}

impl VideoChunk {
    /// Create a data chunk.
    pub fn data(seq: u64, headers: Vec<CodecParams>, payload: Bytes) -> Self {
        Self {
            kind: ChunkKind::Data,
            seq,
            headers,
            payload,
        }
    }

    /// Create the terminating chunk, carrying the last sequence value.
    pub fn end_of_stream(seq: u64, headers: Vec<CodecParams>) -> Self {
        Self {
            kind: ChunkKind::EndOfStream,
            seq,
            headers,
            payload: Bytes::new(),
        }
    }

    /// Whether this chunk terminates the stream.
    pub fn is_eof(&self) -> bool {
        self.kind == ChunkKind::EndOfStream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_chunk_empty_payload() {
        let chunk = VideoChunk::end_of_stream(42, vec![CodecParams::video("h264", Bytes::new())]);
        assert!(chunk.is_eof());
        assert_eq!(chunk.seq, 42);
        assert!(chunk.payload.is_empty());
    }

    #[test]
    fn test_data_chunk() {
        let chunk = VideoChunk::data(0, Vec::new(), Bytes::from_static(b"pkt"));
        assert!(!chunk.is_eof());
        assert_eq!(chunk.payload.as_ref(), b"pkt");
    }
}
