//! Stream and node identifiers
//!
//! A [`StreamId`] is the concatenation of the origin node's fingerprint
//! (fixed-width, hex encoded) and a free-form label, with no separator.
//! Because the fingerprint width is constant, the textual form can always
//! be split back into `(origin, label)` without ambiguity.

use std::fmt;

/// Length of a node fingerprint in bytes.
pub const NODE_ID_LEN: usize = 32;

/// Length of the hex-encoded fingerprint prefix of a stream id.
pub const FINGERPRINT_HEX_LEN: usize = NODE_ID_LEN * 2;

/// Fingerprint identifying the node that originated a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId([u8; NODE_ID_LEN]);

impl NodeId {
    /// Create a node id from raw fingerprint bytes.
    pub fn new(bytes: [u8; NODE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a node id from its 64-character hex form.
    pub fn from_hex(s: &str) -> Result<Self, StreamIdError> {
        if s.len() != FINGERPRINT_HEX_LEN {
            return Err(StreamIdError::BadFingerprint);
        }
        let mut bytes = [0u8; NODE_ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| StreamIdError::BadFingerprint)?;
        Ok(Self(bytes))
    }

    /// The fixed-width lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw fingerprint bytes.
    pub fn as_bytes(&self) -> &[u8; NODE_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Error parsing a stream id from its textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamIdError {
    /// Shorter than the fingerprint prefix.
    TooShort,
    /// The fingerprint prefix is not valid hex.
    BadFingerprint,
}

impl fmt::Display for StreamIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamIdError::TooShort => write!(f, "stream id shorter than fingerprint prefix"),
            StreamIdError::BadFingerprint => write!(f, "stream id fingerprint is not valid hex"),
        }
    }
}

impl std::error::Error for StreamIdError {}

/// Globally unique stream identifier: origin fingerprint + label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamId(String);

impl StreamId {
    /// Build a stream id from an origin fingerprint and a local label.
    pub fn new(origin: NodeId, label: &str) -> Self {
        Self(format!("{}{}", origin.to_hex(), label))
    }

    /// Validate and adopt an externally supplied textual id.
    pub fn parse(s: &str) -> Result<Self, StreamIdError> {
        if s.len() < FINGERPRINT_HEX_LEN {
            return Err(StreamIdError::TooShort);
        }
        // A valid fingerprint is ASCII hex, so the prefix boundary must
        // fall on a char boundary; a multibyte char straddling it means
        // the prefix cannot be hex.
        let prefix = s
            .get(..FINGERPRINT_HEX_LEN)
            .ok_or(StreamIdError::BadFingerprint)?;
        NodeId::from_hex(prefix)?;
        Ok(Self(s.to_string()))
    }

    /// Recover the origin fingerprint and label.
    ///
    /// Always succeeds for ids built by [`StreamId::new`] or accepted by
    /// [`StreamId::parse`].
    pub fn split(&self) -> (NodeId, &str) {
        let origin = NodeId::from_hex(&self.0[..FINGERPRINT_HEX_LEN])
            .unwrap_or(NodeId([0u8; NODE_ID_LEN]));
        (origin, &self.0[FINGERPRINT_HEX_LEN..])
    }

    /// The origin fingerprint.
    pub fn origin(&self) -> NodeId {
        self.split().0
    }

    /// The local label chosen by the origin node.
    pub fn label(&self) -> &str {
        self.split().1
    }

    /// Full textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(byte: u8) -> NodeId {
        NodeId::new([byte; NODE_ID_LEN])
    }

    #[test]
    fn test_make_and_split() {
        let origin = node(0xab);
        let id = StreamId::new(origin, "movie");

        assert_eq!(id.as_str().len(), FINGERPRINT_HEX_LEN + 5);

        let (recovered, label) = id.split();
        assert_eq!(recovered, origin);
        assert_eq!(label, "movie");
    }

    #[test]
    fn test_empty_label() {
        let id = StreamId::new(node(1), "");
        assert_eq!(id.label(), "");
        assert_eq!(id.origin(), node(1));
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = StreamId::new(node(7), "cam-1");
        let parsed = StreamId::parse(id.as_str()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_too_short() {
        assert_eq!(StreamId::parse("abcd"), Err(StreamIdError::TooShort));
    }

    #[test]
    fn test_parse_bad_fingerprint() {
        let s = "zz".repeat(NODE_ID_LEN);
        assert_eq!(StreamId::parse(&s), Err(StreamIdError::BadFingerprint));
    }

    #[test]
    fn test_parse_multibyte_char_at_prefix_boundary() {
        // 63 ASCII chars then a 2-byte char: byte 64 is not a char
        // boundary, so a naive prefix slice would panic.
        let s = format!("{}é", "a".repeat(FINGERPRINT_HEX_LEN - 1));
        assert_eq!(StreamId::parse(&s), Err(StreamIdError::BadFingerprint));
    }

    #[test]
    fn test_node_id_hex_roundtrip() {
        let n = node(0x5a);
        let parsed = NodeId::from_hex(&n.to_hex()).unwrap();
        assert_eq!(parsed, n);
    }
}
