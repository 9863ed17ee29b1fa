//! Media bridge: adapting a live-media connection to a stream's queues
//!
//! The bridge sits between an external push-style media connection (an
//! ingest protocol demuxer, an HTTP pull muxer, ...) and the sequenced
//! chunk queues of a [`Stream`](crate::registry::Stream):
//!
//! - ingress: demuxed packets → sequenced chunks → `Stream.inbound`
//! - egress: `Stream.outbound` → descriptors, payloads, trailer → sink
//!
//! The connection side is expressed through the [`MediaSource`] and
//! [`MediaSink`] seams; connection establishment and the container format
//! belong to the caller.

pub mod egress;
pub mod ingress;

pub use egress::run_egress;
pub use ingress::run_ingress;

use bytes::Bytes;

use crate::chunk::CodecParams;

/// Bridge failure other than clean end-of-input.
///
/// The affected bridge task terminates; the stream is left intact so a new
/// publish can resume it. Other streams are unaffected.
#[derive(Debug)]
pub enum BridgeError {
    /// Socket or container-level I/O failure.
    Io(std::io::Error),
    /// The source produced malformed data the demuxer could not recover.
    Source(String),
    /// The sink rejected data the muxer tried to write.
    Sink(String),
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::Io(e) => write!(f, "bridge I/O failure: {}", e),
            BridgeError::Source(msg) => write!(f, "media source failure: {}", msg),
            BridgeError::Sink(msg) => write!(f, "media sink failure: {}", msg),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Io(e)
    }
}

/// A push-style live media source (the demuxed side of an ingest
/// connection).
#[allow(async_fn_in_trait)]
pub trait MediaSource {
    /// Read the stream's format descriptors. Called once, before any
    /// packet.
    async fn codec_params(&mut self) -> Result<Vec<CodecParams>, BridgeError>;

    /// Read the next discrete media packet.
    ///
    /// `Ok(None)` signals clean end-of-input; any error is a failed bridge
    /// termination.
    async fn read_packet(&mut self) -> Result<Option<Bytes>, BridgeError>;
}

/// A playback or pull connection (the muxer side).
#[allow(async_fn_in_trait)]
pub trait MediaSink {
    /// Emit the format descriptors. Called once, before any packet.
    async fn write_params(&mut self, params: &[CodecParams]) -> Result<(), BridgeError>;

    /// Emit one media packet's payload.
    async fn write_packet(&mut self, payload: Bytes) -> Result<(), BridgeError>;

    /// Emit the container trailer/close signal.
    async fn write_trailer(&mut self) -> Result<(), BridgeError>;
}
