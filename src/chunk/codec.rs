//! Binary encoding for [`VideoChunk`]
//!
//! Hand-written length-prefixed layout over [`bytes`]:
//!
//! ```text
//! u8   chunk kind        (0x00 = DATA, 0x01 = END_OF_STREAM)
//! u64  sequence number
//! u16  descriptor count
//!   per descriptor:
//!     u8   media kind    (0x00 = video, 0x01 = audio)
//!     u16  codec name length + UTF-8 bytes
//!     u32  extradata length + bytes
//! u32  payload length + bytes
//! ```
//!
//! Every tag belongs to a closed enum; an unrecognized tag is a typed
//! decode error, never a silent default.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{ChunkKind, CodecParams, MediaKind, VideoChunk};

// Chunk kind tags
const KIND_DATA: u8 = 0x00;
const KIND_END_OF_STREAM: u8 = 0x01;

// Media kind tags
const MEDIA_VIDEO: u8 = 0x00;
const MEDIA_AUDIO: u8 = 0x01;

/// Decode failure for chunk and message payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Buffer ended before the value it promised.
    UnexpectedEof,
    /// Unrecognized chunk kind tag.
    InvalidChunkKind(u8),
    /// Unrecognized media kind tag.
    InvalidMediaKind(u8),
    /// A string field is not valid UTF-8.
    InvalidUtf8,
    /// A length prefix exceeds the bytes actually present.
    LengthOverrun { expected: usize, remaining: usize },
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::UnexpectedEof => write!(f, "unexpected end of buffer"),
            CodecError::InvalidChunkKind(tag) => write!(f, "invalid chunk kind tag 0x{tag:02x}"),
            CodecError::InvalidMediaKind(tag) => write!(f, "invalid media kind tag 0x{tag:02x}"),
            CodecError::InvalidUtf8 => write!(f, "string field is not valid UTF-8"),
            CodecError::LengthOverrun {
                expected,
                remaining,
            } => write!(
                f,
                "length prefix {expected} exceeds remaining {remaining} bytes"
            ),
        }
    }
}

impl std::error::Error for CodecError {}

/// Encode a chunk into the given buffer.
pub fn encode_chunk(chunk: &VideoChunk, buf: &mut BytesMut) {
    buf.put_u8(match chunk.kind {
        ChunkKind::Data => KIND_DATA,
        ChunkKind::EndOfStream => KIND_END_OF_STREAM,
    });
    buf.put_u64(chunk.seq);

    buf.put_u16(chunk.headers.len() as u16);
    for params in &chunk.headers {
        buf.put_u8(match params.kind {
            MediaKind::Video => MEDIA_VIDEO,
            MediaKind::Audio => MEDIA_AUDIO,
        });
        buf.put_u16(params.codec.len() as u16);
        buf.put_slice(params.codec.as_bytes());
        buf.put_u32(params.extradata.len() as u32);
        buf.put_slice(&params.extradata);
    }

    buf.put_u32(chunk.payload.len() as u32);
    buf.put_slice(&chunk.payload);
}

/// Decode one chunk, consuming its bytes from the buffer.
pub fn decode_chunk(buf: &mut Bytes) -> Result<VideoChunk, CodecError> {
    let kind = match read_u8(buf)? {
        KIND_DATA => ChunkKind::Data,
        KIND_END_OF_STREAM => ChunkKind::EndOfStream,
        tag => return Err(CodecError::InvalidChunkKind(tag)),
    };
    let seq = read_u64(buf)?;

    let count = read_u16(buf)? as usize;
    let mut headers = Vec::with_capacity(count.min(16));
    for _ in 0..count {
        let media = match read_u8(buf)? {
            MEDIA_VIDEO => MediaKind::Video,
            MEDIA_AUDIO => MediaKind::Audio,
            tag => return Err(CodecError::InvalidMediaKind(tag)),
        };
        let codec = read_string(buf)?;
        let len = read_u32(buf)? as usize;
        let extradata = read_bytes(buf, len)?;
        headers.push(CodecParams {
            kind: media,
            codec,
            extradata,
        });
    }

    let len = read_u32(buf)? as usize;
    let payload = read_bytes(buf, len)?;

    Ok(VideoChunk {
        kind,
        seq,
        headers,
        payload,
    })
}

pub(crate) fn read_u8(buf: &mut Bytes) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::UnexpectedEof);
    }
    Ok(buf.get_u8())
}

pub(crate) fn read_u16(buf: &mut Bytes) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::UnexpectedEof);
    }
    Ok(buf.get_u16())
}

pub(crate) fn read_u32(buf: &mut Bytes) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::UnexpectedEof);
    }
    Ok(buf.get_u32())
}

pub(crate) fn read_u64(buf: &mut Bytes) -> Result<u64, CodecError> {
    if buf.remaining() < 8 {
        return Err(CodecError::UnexpectedEof);
    }
    Ok(buf.get_u64())
}

/// Split `len` bytes off the front of the buffer (zero-copy).
pub(crate) fn read_bytes(buf: &mut Bytes, len: usize) -> Result<Bytes, CodecError> {
    if buf.remaining() < len {
        return Err(CodecError::LengthOverrun {
            expected: len,
            remaining: buf.remaining(),
        });
    }
    Ok(buf.split_to(len))
}

/// Read a u16-length-prefixed UTF-8 string.
pub(crate) fn read_string(buf: &mut Bytes) -> Result<String, CodecError> {
    let len = read_u16(buf)? as usize;
    let raw = read_bytes(buf, len)?;
    String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
}

/// Write a u16-length-prefixed UTF-8 string.
pub(crate) fn write_string(buf: &mut BytesMut, s: &str) {
    buf.put_u16(s.len() as u16);
    buf.put_slice(s.as_bytes());
}
