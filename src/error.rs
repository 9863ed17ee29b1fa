//! Crate-level error type.

use std::fmt;

use crate::bridge::BridgeError;
use crate::chunk::CodecError;
use crate::id::StreamIdError;
use crate::registry::RegistryError;
use crate::relay::ProtocolError;

/// Any error a node operation can surface.
#[derive(Debug)]
pub enum Error {
    Registry(RegistryError),
    Protocol(ProtocolError),
    Codec(CodecError),
    Bridge(BridgeError),
    Id(StreamIdError),
    /// The peer's relay session has already ended.
    PeerGone,
    Io(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Registry(e) => write!(f, "registry error: {}", e),
            Error::Protocol(e) => write!(f, "protocol error: {}", e),
            Error::Codec(e) => write!(f, "codec error: {}", e),
            Error::Bridge(e) => write!(f, "bridge error: {}", e),
            Error::Id(e) => write!(f, "stream id error: {}", e),
            Error::PeerGone => write!(f, "peer session has ended"),
            Error::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Registry(e) => Some(e),
            Error::Protocol(e) => Some(e),
            Error::Codec(e) => Some(e),
            Error::Bridge(e) => Some(e),
            Error::Id(e) => Some(e),
            Error::PeerGone => None,
            Error::Io(e) => Some(e),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::Codec(e)
    }
}

impl From<BridgeError> for Error {
    fn from(e: BridgeError) -> Self {
        Error::Bridge(e)
    }
}

impl From<StreamIdError> for Error {
    fn from(e: StreamIdError) -> Self {
        Error::Id(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
