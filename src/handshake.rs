//! Connection establishment.
//!
//! A three-message exchange brings both endpoints to `Established`:
//!
//! ```text
//!  Initiator                        Responder
//!     │ ── SYN (seq 0) ──────────────▶ │
//!     │ ◀───────────── SYN|ACK (seq 0) │
//!     │ ── ACK (seq 1) ──────────────▶ │
//!  ESTABLISHED                    ESTABLISHED
//! ```
//!
//! Sequence numbers 0 and 1 are consumed here; data starts at 2.  Both
//! sides retransmit without bound on timeout — establishment either
//! succeeds or the operator kills the process.
//!
//! The termination conditions are asymmetric.  The initiator requires the
//! flag byte to be exactly `SYN|ACK`.  The responder completes on *any*
//! frame whose sequence number is at least 1 and never inspects the
//! acknowledgment field; when the completing frame is a data segment (the
//! ACK was lost), its payload is discarded here and recovered by the
//! sender's normal retransmission.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::SessionError;
use crate::frame::{flags, Frame};
use crate::simulator::LossyLink;
use crate::socket::SocketError;
use crate::state::ConnectionState;

/// Active open: drive the initiator from `Closed` to `Established`.
pub async fn initiate(
    link: &LossyLink,
    peer: SocketAddr,
    state: &mut ConnectionState,
    recv_timeout: Duration,
    window: u16,
) -> Result<(), SessionError> {
    let syn = Frame::control(0, 0, flags::SYN, window);
    link.send_frame(&syn, peer).await?;
    *state = ConnectionState::SynSent;
    log::debug!("[hs] → SYN");

    loop {
        match link.recv_frame(recv_timeout).await {
            Ok((frame, src)) => {
                if src != peer {
                    continue;
                }
                if frame.header.flags == (flags::SYN | flags::ACK) {
                    let ack = Frame::control(1, 0, flags::ACK, window);
                    link.send_frame(&ack, peer).await?;
                    *state = ConnectionState::Established;
                    log::debug!("[hs] ← SYN|ACK; → ACK — established");
                    return Ok(());
                }
                // Anything else is stale traffic; keep waiting.
            }
            Err(SocketError::Timeout) => {
                log::debug!("[hs] timeout — resending SYN");
                link.send_frame(&syn, peer).await?;
            }
            Err(SocketError::Malformed(e)) => {
                log::debug!("[hs] ignoring malformed datagram: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Passive open: drive the responder from `Closed` to `Established`.
///
/// Returns the peer address learned from the first SYN.
pub async fn respond(
    link: &LossyLink,
    state: &mut ConnectionState,
    recv_timeout: Duration,
    window: u16,
) -> Result<SocketAddr, SessionError> {
    // Wait for a SYN; the source of that frame becomes the peer.
    let peer = loop {
        match link.recv_frame(recv_timeout).await {
            Ok((frame, src)) => {
                if frame.header.flags & flags::SYN != 0 {
                    break src;
                }
            }
            Err(SocketError::Timeout) => {
                log::debug!("[hs] still listening for SYN");
            }
            Err(SocketError::Malformed(e)) => {
                log::debug!("[hs] ignoring malformed datagram: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    };

    let syn_ack = Frame::control(0, 0, flags::SYN | flags::ACK, window);
    link.send_frame(&syn_ack, peer).await?;
    *state = ConnectionState::SynReceived;
    log::debug!("[hs] ← SYN from {peer}; → SYN|ACK");

    // Completion: any frame from the peer carrying sequence >= 1.  The
    // acknowledgment field is deliberately not checked.
    loop {
        match link.recv_frame(recv_timeout).await {
            Ok((frame, src)) => {
                if src != peer {
                    continue;
                }
                if frame.header.seq >= 1 {
                    *state = ConnectionState::Established;
                    log::debug!("[hs] ← seq {} — established", frame.header.seq);
                    return Ok(peer);
                }
                // A repeated SYN (seq 0): the peer missed our SYN|ACK.
                log::debug!("[hs] ← seq 0 — resending SYN|ACK");
                link.send_frame(&syn_ack, peer).await?;
            }
            Err(SocketError::Timeout) => {
                log::debug!("[hs] timeout — resending SYN|ACK");
                link.send_frame(&syn_ack, peer).await?;
            }
            Err(SocketError::Malformed(e)) => {
                log::debug!("[hs] ignoring malformed datagram: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }
}
