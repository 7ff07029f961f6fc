//! `udp-arq` — a reliable, ordered byte stream over unreliable datagrams.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────┐   data segments   ┌──────────┐
//!  │  Sender  │──────────────────▶│ Receiver │
//!  └────┬─────┘                   └─────┬────┘
//!       │      cumulative ACKs          │
//!       │◀──────────────────────────────┘
//!       │
//!  ┌────▼──────────────────────────────────┐
//!  │  SendWindow / InOrderGate             │
//!  │  (pure per-session protocol state)    │
//!  └────┬──────────────────────────────────┘
//!       │ frames
//!  ┌────▼──────┐
//!  │ LossyLink │  (fault injection: probabilistic drop)
//!  └────┬──────┘
//!  ┌────▼──────┐
//!  │  Socket   │  (thin async wrapper around tokio UdpSocket)
//!  └───────────┘
//! ```
//!
//! A session runs as three phases: a three-message handshake, a windowed
//! transfer with cumulative acknowledgment and adaptive window sizing, and
//! a four-message teardown.  Handshake and transfer retransmit without
//! bound on the fixed receive timeout; teardown carries a bounded retry
//! budget.
//!
//! Each module has a single responsibility:
//! - [`frame`]      — wire format (serialise / deserialise)
//! - [`socket`]     — async UDP socket abstraction with bounded receives
//! - [`simulator`]  — lossy network layer for exercising the reliability path
//! - [`state`]      — finite-state-machine types
//! - [`window`]     — send-side sliding-window state machine
//! - [`gate`]       — receive-side in-order gate and delivery store
//! - [`handshake`]  — connection establishment
//! - [`teardown`]   — connection close negotiation
//! - [`sender`]     — initiator session: handshake → transfer → teardown
//! - [`receiver`]   — responder session: handshake → receive → teardown
//! - [`config`]     — endpoint tunables
//! - [`error`]      — session-terminal failures

pub mod config;
pub mod error;
pub mod frame;
pub mod gate;
pub mod handshake;
pub mod receiver;
pub mod sender;
pub mod simulator;
pub mod socket;
pub mod state;
pub mod teardown;
pub mod window;

pub use config::{ReceiverConfig, SenderConfig};
pub use error::SessionError;
pub use receiver::Receiver;
pub use sender::Sender;
