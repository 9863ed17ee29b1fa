//! livemesh — peer-to-peer live stream relay
//!
//! A library for relaying live audio/video streams between nodes in a
//! peer-to-peer mesh. Each node keeps a registry of streams backed by
//! bounded lossy queues, bridges local media endpoints into and out of
//! those queues, and runs relay sessions over established connections to
//! pull streams from upstream peers and fan them out downstream.
//!
//! The crate is transport-agnostic: sessions run over any
//! `AsyncRead + AsyncWrite` connection the caller hands to
//! [`Node::attach_peer`], and media enters and leaves through the
//! [`bridge::MediaSource`] and [`bridge::MediaSink`] seams.
//!
//! # Example
//!
//! ```no_run
//! use livemesh::{Node, NodeConfig, NodeId};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let node = Node::new(NodeId::new([0x42; 32]), NodeConfig::default());
//! let stream = node.publish("camera-1").await?;
//! // Feed `stream` through an ingress bridge, attach peers, etc.
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod chunk;
pub mod config;
pub mod error;
pub mod id;
pub mod node;
pub mod registry;
pub mod relay;
pub mod reporter;
pub mod stats;

pub use config::NodeConfig;
pub use error::{Error, Result};
pub use id::{NodeId, StreamId, StreamIdError};
pub use node::{Node, PeerDirectory};
pub use registry::{RegistryError, Stream, StreamRegistry};
pub use relay::{InterestTable, PeerHandle, RelaySession};
pub use reporter::EventReporter;
pub use stats::NodeStats;
