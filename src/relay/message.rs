//! Relay wire messages
//!
//! Frame layout over the transport-supplied reliable ordered connection:
//!
//! ```text
//! u8   message code      (0x00 = HANDSHAKE, 0x01 = DATA, 0x02 = REQUEST)
//! u32  payload length
//! ...  payload
//! ```
//!
//! Payloads:
//! ```text
//! HANDSHAKE: identity (hex string) + greeting (string)
//! DATA:      stream id (string) + encoded chunk
//! REQUEST:   stream id (string)
//! ```
//!
//! The three message kinds form a closed enum with an exhaustive decoder;
//! an unrecognized code is a typed protocol error, never a default branch.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::chunk::codec::{self, read_string, write_string};
use crate::chunk::{CodecError, VideoChunk};
use crate::id::{NodeId, StreamId, StreamIdError};

/// Wire code for a handshake message.
pub const MSG_HANDSHAKE: u8 = 0;
/// Wire code for a chunk delivery message.
pub const MSG_DATA: u8 = 1;
/// Wire code for a stream subscription request.
pub const MSG_REQUEST: u8 = 2;

/// Largest accepted frame payload.
pub const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Protocol failure on a relay connection.
///
/// Any of these terminates the session and drops the connection;
/// reconnection policy belongs to the transport collaborator.
#[derive(Debug)]
pub enum ProtocolError {
    /// Message code outside the closed set.
    UnknownCode(u8),
    /// Payload failed to decode.
    Codec(CodecError),
    /// A stream id field failed validation.
    BadStreamId(StreamIdError),
    /// Frame length prefix exceeds [`MAX_FRAME_SIZE`].
    FrameTooLarge(usize),
    /// A message arrived out of handshake order.
    UnexpectedMessage { expected: &'static str, code: u8 },
    /// The peer closed the connection.
    ConnectionClosed,
    /// Socket-level failure.
    Io(std::io::Error),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::UnknownCode(code) => write!(f, "unknown message code {}", code),
            ProtocolError::Codec(e) => write!(f, "payload decode failed: {}", e),
            ProtocolError::BadStreamId(e) => write!(f, "invalid stream id: {}", e),
            ProtocolError::FrameTooLarge(len) => write!(f, "frame of {} bytes too large", len),
            ProtocolError::UnexpectedMessage { expected, code } => {
                write!(f, "expected {} message, got code {}", expected, code)
            }
            ProtocolError::ConnectionClosed => write!(f, "connection closed by peer"),
            ProtocolError::Io(e) => write!(f, "connection I/O failure: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Codec(e) => Some(e),
            ProtocolError::BadStreamId(e) => Some(e),
            ProtocolError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for ProtocolError {
    fn from(e: CodecError) -> Self {
        ProtocolError::Codec(e)
    }
}

impl From<StreamIdError> for ProtocolError {
    fn from(e: StreamIdError) -> Self {
        ProtocolError::BadStreamId(e)
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::ConnectionClosed
        } else {
            ProtocolError::Io(e)
        }
    }
}

/// The three relay protocol messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// First message in each direction on a fresh connection.
    Handshake { identity: NodeId, greeting: String },
    /// One chunk of the named stream.
    Data {
        stream_id: StreamId,
        chunk: VideoChunk,
    },
    /// "Please relay this stream to me."
    Request { stream_id: StreamId },
}

impl Message {
    /// Wire-stable message code.
    pub fn code(&self) -> u8 {
        match self {
            Message::Handshake { .. } => MSG_HANDSHAKE,
            Message::Data { .. } => MSG_DATA,
            Message::Request { .. } => MSG_REQUEST,
        }
    }

    /// Encode the payload (everything after the frame header).
    pub fn encode_payload(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            Message::Handshake { identity, greeting } => {
                write_string(&mut buf, &identity.to_hex());
                write_string(&mut buf, greeting);
            }
            Message::Data { stream_id, chunk } => {
                write_string(&mut buf, stream_id.as_str());
                codec::encode_chunk(chunk, &mut buf);
            }
            Message::Request { stream_id } => {
                write_string(&mut buf, stream_id.as_str());
            }
        }
        buf.freeze()
    }

    /// Decode a payload for the given code. Exhaustive over the closed set.
    pub fn decode(code: u8, mut payload: Bytes) -> Result<Self, ProtocolError> {
        match code {
            MSG_HANDSHAKE => {
                let identity = NodeId::from_hex(&read_string(&mut payload)?)?;
                let greeting = read_string(&mut payload)?;
                Ok(Message::Handshake { identity, greeting })
            }
            MSG_DATA => {
                let stream_id = StreamId::parse(&read_string(&mut payload)?)?;
                let chunk = codec::decode_chunk(&mut payload)?;
                Ok(Message::Data { stream_id, chunk })
            }
            MSG_REQUEST => {
                let stream_id = StreamId::parse(&read_string(&mut payload)?)?;
                Ok(Message::Request { stream_id })
            }
            code => Err(ProtocolError::UnknownCode(code)),
        }
    }
}

/// Write one framed message.
pub async fn write_message<W: AsyncWrite + Unpin>(
    w: &mut W,
    msg: &Message,
) -> Result<(), ProtocolError> {
    let payload = msg.encode_payload();
    if payload.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }

    let mut header = BytesMut::with_capacity(5);
    header.put_u8(msg.code());
    header.put_u32(payload.len() as u32);

    w.write_all(&header).await?;
    w.write_all(&payload).await?;
    w.flush().await?;
    Ok(())
}

/// Read one framed message.
pub async fn read_message<R: AsyncRead + Unpin>(r: &mut R) -> Result<Message, ProtocolError> {
    let mut header = [0u8; 5];
    r.read_exact(&mut header).await?;

    let mut header = Bytes::copy_from_slice(&header);
    let code = header.get_u8();
    let len = header.get_u32() as usize;
    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload).await?;

    Message::decode(code, Bytes::from(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::CodecParams;

    fn node(byte: u8) -> NodeId {
        NodeId::new([byte; 32])
    }

    fn sample_chunk() -> VideoChunk {
        VideoChunk::data(
            5,
            vec![CodecParams::video("h264", Bytes::from_static(&[1, 2]))],
            Bytes::from_static(b"payload"),
        )
    }

    #[tokio::test]
    async fn test_handshake_roundtrip() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        let msg = Message::Handshake {
            identity: node(9),
            greeting: "hello from the relay".into(),
        };

        write_message(&mut a, &msg).await.unwrap();
        let decoded = read_message(&mut b).await.unwrap();
        assert_eq!(decoded, msg);
    }

    #[tokio::test]
    async fn test_data_roundtrip() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        let msg = Message::Data {
            stream_id: StreamId::new(node(1), "movie"),
            chunk: sample_chunk(),
        };

        write_message(&mut a, &msg).await.unwrap();
        assert_eq!(read_message(&mut b).await.unwrap(), msg);
    }

    #[tokio::test]
    async fn test_request_roundtrip() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        let msg = Message::Request {
            stream_id: StreamId::new(node(2), "cam"),
        };

        write_message(&mut a, &msg).await.unwrap();
        assert_eq!(read_message(&mut b).await.unwrap(), msg);
    }

    #[test]
    fn test_data_with_malformed_stream_id_rejected() {
        // Peer-supplied id whose hex prefix ends inside a multibyte char:
        // must come back as a typed error, never a panic in the session.
        let bad_id = format!("{}é", "a".repeat(63));
        let mut payload = BytesMut::new();
        write_string(&mut payload, &bad_id);
        codec::encode_chunk(&sample_chunk(), &mut payload);

        let err = Message::decode(MSG_DATA, payload.freeze()).unwrap_err();
        assert!(matches!(err, ProtocolError::BadStreamId(_)));
    }

    #[tokio::test]
    async fn test_unknown_code_rejected() {
        use tokio::io::AsyncWriteExt;

        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&[0x7f, 0, 0, 0, 0]).await.unwrap();

        let err = read_message(&mut b).await.unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCode(0x7f)));
    }

    #[tokio::test]
    async fn test_oversize_frame_rejected() {
        use tokio::io::AsyncWriteExt;

        let (mut a, mut b) = tokio::io::duplex(64);
        // Header promising a payload past the frame cap.
        a.write_all(&[MSG_DATA, 0xff, 0xff, 0xff, 0xff]).await.unwrap();

        let err = read_message(&mut b).await.unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
    }

    #[tokio::test]
    async fn test_closed_connection() {
        let (a, mut b) = tokio::io::duplex(64);
        drop(a);

        let err = read_message(&mut b).await.unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionClosed));
    }
}
