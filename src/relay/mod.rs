//! Peer relay: wire protocol, interest routing and chunk dispatch
//!
//! ```text
//!   Stream.inbound ──► [dispatcher] ──► Stream.outbound ──► egress bridge
//!                          │
//!                          │ one copy per downstream peer
//!                          ▼
//!                    PeerHandle.forward() ──► session send duty ──► wire
//!
//!   wire ──► session receive loop ──► Stream.inbound (on the peer node)
//! ```
//!
//! The interest table decides the fan-out; each peer's delivery is
//! independently lossy, so no subscriber can stall another.

pub mod dispatch;
pub mod interest;
pub mod message;
pub mod peer;
pub mod session;

pub use dispatch::{pump_stream, spawn_dispatcher};
pub use interest::InterestTable;
pub use message::{
    read_message, write_message, Message, ProtocolError, MAX_FRAME_SIZE, MSG_DATA, MSG_HANDSHAKE,
    MSG_REQUEST,
};
pub use peer::{PeerCommand, PeerHandle};
pub use session::{RelaySession, SessionPhase};
