//! Registry error types

use crate::id::StreamId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A stream with this id already exists
    DuplicateStream(StreamId),
    /// No stream with this id
    NotFound(StreamId),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicateStream(id) => {
                write!(f, "stream with this id already exists: {}", id)
            }
            RegistryError::NotFound(id) => write!(f, "stream not found: {}", id),
        }
    }
}

impl std::error::Error for RegistryError {}
