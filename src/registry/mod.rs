//! Stream registry and bounded delivery queues
//!
//! The registry is the only place new streams are born. Each stream owns a
//! pair of bounded lossy queues that all media flows through:
//!
//! ```text
//!                      Arc<StreamRegistry>
//!                 ┌──────────────────────────┐
//!                 │ streams: HashMap<        │
//!                 │   StreamId,              │
//!                 │   Arc<Stream {           │
//!                 │     inbound:  ChunkQueue │
//!                 │     outbound: ChunkQueue │
//!                 │   }>                     │
//!                 │ >                        │
//!                 └────────────┬─────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//!     [Ingress bridge]    [Dispatcher]       [Egress bridge]
//!     inbound.offer()     inbound.pop()      outbound.pop()
//!                         outbound.offer()
//!                         + peer fan-out
//! ```
//!
//! Registry access is only for create/lookup/remove; queue I/O never
//! happens under the registry lock.

pub mod entry;
pub mod error;
pub mod queue;
pub mod store;

pub use entry::Stream;
pub use error::RegistryError;
pub use queue::{ChunkQueue, DEFAULT_QUEUE_CAPACITY};
pub use store::StreamRegistry;
