//! Connection teardown.
//!
//! A four-message half-duplex close negotiated once transfer completes
//! (all sequence numbers are absolute; `F` is the FIN sequence,
//! `total_segments + 2`):
//!
//! ```text
//!  Initiator                          Responder
//!     │ ── FIN (seq F) ─────────────────▶ │
//!     │ ◀──────────── FIN|ACK (ack F)     │
//!     │ ── ACK (seq F+1) ───────────────▶ │
//!     │ ◀··············· ACK (ack F+1)    │   (never actually sent)
//! ```
//!
//! The FIN is retransmitted without bound until answered.  The waits after
//! it are bounded: each side tolerates [`CLOSE_RETRY_LIMIT`] consecutive
//! timeouts before force-closing.  The responder stops listening as soon as
//! it sees the closing ACK and acknowledges nothing further, so the
//! initiator's final wait is expected to exhaust its budget — that
//! exhaustion is the normal end of a session and surfaces as
//! [`SessionError::TeardownGiveUp`].

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::SessionError;
use crate::frame::{flags, Frame};
use crate::gate::InOrderGate;
use crate::simulator::LossyLink;
use crate::socket::SocketError;
use crate::state::ConnectionState;

/// Consecutive timeouts either side tolerates after its FIN exchange before
/// force-closing.
pub const CLOSE_RETRY_LIMIT: u32 = 5;

/// Initiator-side close: FIN, await FIN|ACK, closing ACK, bounded final wait.
///
/// `fin_seq` is the sequence number the FIN travels with (`base + 2` once
/// every segment is acknowledged).
pub async fn initiate(
    link: &LossyLink,
    peer: SocketAddr,
    state: &mut ConnectionState,
    fin_seq: u32,
    recv_timeout: Duration,
    close_wait_timeout: Duration,
    window: u16,
) -> Result<(), SessionError> {
    let fin = Frame::control(fin_seq, 0, flags::FIN, window);
    link.send_frame(&fin, peer).await?;
    *state = ConnectionState::FinWait1;
    log::debug!("[fin] → FIN seq={fin_seq}");

    // Unbounded: the FIN goes out again on every timeout until answered.
    loop {
        match link.recv_frame(recv_timeout).await {
            Ok((frame, src)) => {
                if src != peer {
                    continue;
                }
                if frame.header.flags == (flags::FIN | flags::ACK) && frame.header.ack == fin_seq
                {
                    log::debug!("[fin] ← FIN|ACK ack={fin_seq}");
                    break;
                }
                // Stale data-phase acknowledgment; keep waiting.
            }
            Err(SocketError::Timeout) => {
                log::debug!("[fin] timeout — resending FIN");
                link.send_frame(&fin, peer).await?;
            }
            Err(SocketError::Malformed(e)) => {
                log::debug!("[fin] ignoring malformed datagram: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }
    *state = ConnectionState::FinWait2;

    let closing_ack = Frame::control(fin_seq + 1, 0, flags::ACK, window);
    link.send_frame(&closing_ack, peer).await?;
    *state = ConnectionState::TimeWait;
    log::debug!("[fin] → ACK seq={}", fin_seq + 1);

    // Bounded: the peer goes quiet once it has the closing ACK, so this
    // wait normally runs its full budget.
    let mut timeouts = 0u32;
    loop {
        match link.recv_frame(close_wait_timeout).await {
            Ok((frame, src)) => {
                if src != peer {
                    continue;
                }
                if frame.header.flags == flags::ACK && frame.header.ack == fin_seq + 1 {
                    log::debug!("[fin] ← final ACK — closed");
                    *state = ConnectionState::Closed;
                    return Ok(());
                }
                // The peer missed our closing ACK; send it again.
                log::debug!("[fin] ← unexpected frame — resending closing ACK");
                link.send_frame(&closing_ack, peer).await?;
            }
            Err(SocketError::Timeout) => {
                timeouts += 1;
                if timeouts >= CLOSE_RETRY_LIMIT {
                    log::warn!("[fin] no final ACK after {timeouts} timeouts — force-closing");
                    *state = ConnectionState::Closed;
                    return Err(SessionError::TeardownGiveUp);
                }
                log::debug!("[fin] timeout {timeouts} — resending closing ACK");
                link.send_frame(&closing_ack, peer).await?;
            }
            Err(SocketError::Malformed(e)) => {
                log::debug!("[fin] ignoring malformed datagram: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Responder-side close, entered when the in-order FIN arrives.
///
/// Sends FIN|ACK (consuming one sequence number), then waits for the
/// peer's closing ACK, resending the FIN|ACK on every timeout or mismatch
/// within the same bounded budget.
pub async fn respond(
    link: &LossyLink,
    peer: SocketAddr,
    state: &mut ConnectionState,
    gate: &mut InOrderGate,
    recv_timeout: Duration,
    window: u16,
) -> Result<(), SessionError> {
    *state = ConnectionState::CloseWait;

    let fin_ack_num = gate.consume_fin();
    let fin_ack = Frame::control(0, fin_ack_num, flags::FIN | flags::ACK, window);
    link.send_frame(&fin_ack, peer).await?;
    *state = ConnectionState::LastAck;
    log::debug!("[fin] ← FIN; → FIN|ACK ack={fin_ack_num}");

    let mut timeouts = 0u32;
    loop {
        match link.recv_frame(recv_timeout).await {
            Ok((frame, src)) => {
                if src != peer {
                    continue;
                }
                if frame.header.flags & flags::ACK != 0 && frame.header.seq == gate.expected() {
                    log::debug!("[fin] ← closing ACK seq={} — closed", frame.header.seq);
                    *state = ConnectionState::Closed;
                    return Ok(());
                }
                log::debug!("[fin] ← unexpected frame — resending FIN|ACK");
                link.send_frame(&fin_ack, peer).await?;
            }
            Err(SocketError::Timeout) => {
                timeouts += 1;
                if timeouts >= CLOSE_RETRY_LIMIT {
                    log::warn!("[fin] no closing ACK after {timeouts} timeouts — force-closing");
                    *state = ConnectionState::Closed;
                    return Err(SessionError::TeardownGiveUp);
                }
                log::debug!("[fin] timeout {timeouts} — resending FIN|ACK");
                link.send_frame(&fin_ack, peer).await?;
            }
            Err(SocketError::Malformed(e)) => {
                log::debug!("[fin] ignoring malformed datagram: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }
}
