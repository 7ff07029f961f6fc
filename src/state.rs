//! Connection finite-state-machine (FSM) types.
//!
//! This module defines the role of an endpoint and every state a session
//! can occupy, mirroring the TCP state diagram (RFC 793 §3.2) reduced to
//! the transitions this protocol actually performs.  State transitions are
//! *not* implemented here — they live in the handshake, transfer and
//! teardown paths — but keeping the types in their own module makes it easy
//! to add guard logic or tracing without touching session plumbing.

/// Which side of the connection this endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Active opener: sends SYN, transmits data, initiates the close.
    Initiator,
    /// Passive opener: answers SYN, delivers data, answers the close.
    Responder,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Initiator => write!(f, "initiator"),
            Role::Responder => write!(f, "responder"),
        }
    }
}

/// All states of the connection FSM.
///
/// ```text
///  CLOSED ──SYN sent──▶ SYN_SENT ──SYN-ACK──▶ ESTABLISHED   (initiator)
///  CLOSED ──SYN rcvd──▶ SYN_RECEIVED ──seq ≥ 1──▶ ESTABLISHED (responder)
///
///  ESTABLISHED ──FIN sent──▶ FIN_WAIT_1 ──FIN-ACK──▶ FIN_WAIT_2
///      ──closing ACK sent──▶ TIME_WAIT ──final ACK / retries──▶ CLOSED
///
///  ESTABLISHED ──FIN rcvd──▶ CLOSE_WAIT ──FIN-ACK sent──▶ LAST_ACK
///      ──ACK rcvd / retries──▶ CLOSED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection exists; initial and final state.
    Closed,
    /// SYN has been sent; waiting for SYN-ACK.
    SynSent,
    /// SYN received and SYN-ACK sent; waiting for any frame with seq ≥ 1.
    SynReceived,
    /// Handshake complete; data transfer in progress.
    Established,
    /// Local side sent FIN; waiting for FIN-ACK.
    FinWait1,
    /// FIN acknowledged; closing ACK about to go out.
    FinWait2,
    /// Peer's FIN received; FIN-ACK pending.
    CloseWait,
    /// FIN-ACK sent; waiting for the peer's closing ACK.
    LastAck,
    /// Closing ACK sent; waiting out the bounded final-acknowledgment window.
    TimeWait,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Closed
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
