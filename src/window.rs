//! Send-side sliding-window state machine.
//!
//! [`SendWindow`] tracks the transmit pipeline for one session: which
//! segments are unacknowledged, how many segments the next round may carry,
//! and the in-flight buffer used for retransmission.
//!
//! # Protocol contract
//!
//! - Segments are numbered by index; segment `i` travels with sequence
//!   number `i + 2` (0 and 1 are consumed by the handshake).
//! - ACKs are **cumulative**: an acknowledgment equal to `base + 2`
//!   confirms the oldest unacknowledged segment and advances `base` by one.
//! - Any other acknowledgment is authoritative feedback about the last
//!   in-order segment the receiver holds: `base` resets to `ack - 2`
//!   (saturating at zero) and the round counts as failed.
//! - On a receive timeout the window halves (floor 2) and the round ends;
//!   `base` is unchanged, so the next round retransmits from it.
//! - A fully acknowledged round squares the window, capped at `max_window`.
//!
//! `cwnd`, `ssthresh` and the duplicate-ACK counter are tracked alongside
//! the round window; the adaptation policy consults `window_size` alone.
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility.

use std::collections::HashMap;
use std::ops::Range;
use std::time::Instant;

use crate::frame::DATA_SEQ_START;

/// Smallest window the adaptation policy will shrink to.
pub const MIN_WINDOW: usize = 2;

/// Verdict of processing one acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckVerdict {
    /// The acknowledgment matched `base + 2`; the window advanced one segment.
    Advanced,
    /// Any other acknowledgment; `base` was reset from it and the current
    /// round is marked failed.
    Fallback,
}

/// A transmitted segment awaiting acknowledgment.
#[derive(Debug, Clone)]
pub struct InFlight {
    /// The encoded frame, ready for retransmission.
    pub bytes: Vec<u8>,
    /// Wall-clock time of the most recent transmission.
    pub sent_at: Instant,
}

/// Send-side state for one session.
///
/// ```text
///     base            next_to_send
///       │                  │
///  ─────┼──────────────────┼──────────────────▶ segment index
///       │ ◀── in flight ──▶│ ◀── unsent ────▶   (total at the right edge)
/// ```
#[derive(Debug)]
pub struct SendWindow {
    /// Lowest unacknowledged segment index (left window edge).
    base: usize,

    /// Index one past the highest segment handed to the socket so far.
    next_to_send: usize,

    /// Total number of segments in this transfer.
    total: usize,

    /// Number of segments transmitted per round.
    window_size: usize,

    /// Ceiling for [`window_size`](Self::window_size) growth.
    max_window: usize,

    /// Congestion window; tracked, not consulted.
    cwnd: u32,

    /// Slow-start threshold; tracked, not consulted.
    ssthresh: u32,

    /// Mismatched-acknowledgment counter; reset on every exact advance,
    /// never consulted for fast retransmit.
    dup_ack_count: u32,

    /// Transmitted segments by index.  Entries persist for the lifetime of
    /// the transfer so a fallback can never reference a missing slot.
    in_flight: HashMap<usize, InFlight>,
}

impl SendWindow {
    /// Create a window for a transfer of `total` segments.
    pub fn new(total: usize, initial_window: usize, max_window: usize) -> Self {
        assert!(initial_window >= 1, "initial_window must be at least 1");
        Self {
            base: 0,
            next_to_send: 0,
            total,
            window_size: initial_window,
            max_window: max_window.max(MIN_WINDOW),
            cwnd: 1,
            ssthresh: 16,
            dup_ack_count: 0,
            in_flight: HashMap::new(),
        }
    }

    /// Lowest unacknowledged segment index.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Index one past the highest segment transmitted so far.
    pub fn next_to_send(&self) -> usize {
        self.next_to_send
    }

    /// Current round width in segments.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Mismatched-acknowledgment count since the last exact advance.
    pub fn dup_ack_count(&self) -> u32 {
        self.dup_ack_count
    }

    /// `true` once every segment has been cumulatively acknowledged.
    pub fn is_complete(&self) -> bool {
        self.base >= self.total
    }

    /// Segment indices the next round must transmit:
    /// `[base, base + window_size)` clamped to the transfer length.
    pub fn round_range(&self) -> Range<usize> {
        self.base..(self.base + self.window_size).min(self.total)
    }

    /// Sequence number carried by segment `index` on the wire.
    pub fn seq_of(index: usize) -> u32 {
        index as u32 + DATA_SEQ_START
    }

    /// Record a just-transmitted segment in the in-flight buffer.
    ///
    /// Retransmissions overwrite the previous entry, refreshing its
    /// timestamp.
    pub fn record_sent(&mut self, index: usize, bytes: Vec<u8>) {
        debug_assert!(index < self.total);
        self.in_flight.insert(
            index,
            InFlight {
                bytes,
                sent_at: Instant::now(),
            },
        );
        self.next_to_send = self.next_to_send.max(index + 1);
        debug_assert!(self.base <= self.next_to_send && self.next_to_send <= self.total);
    }

    /// The in-flight entry for `index`, if it has ever been transmitted.
    pub fn in_flight(&self, index: usize) -> Option<&InFlight> {
        self.in_flight.get(&index)
    }

    /// Number of transmitted-but-unacknowledged segments.
    pub fn unacked(&self) -> usize {
        self.next_to_send - self.base
    }

    /// Process one cumulative acknowledgment.
    ///
    /// `ack == base + 2` advances the window a single segment.  Any other
    /// value resets `base` to `ack - 2` (saturating at zero — the receiver
    /// re-acknowledges sequence 1 when the very first segment is missing).
    pub fn on_ack(&mut self, ack: u32) -> AckVerdict {
        if ack == Self::seq_of(self.base) {
            self.base += 1;
            self.dup_ack_count = 0;
            AckVerdict::Advanced
        } else {
            self.base = ack.saturating_sub(DATA_SEQ_START) as usize;
            self.dup_ack_count += 1;
            debug_assert!(self.base <= self.next_to_send);
            AckVerdict::Fallback
        }
    }

    /// Apply the timeout policy: halve the window (floor [`MIN_WINDOW`]).
    ///
    /// `base` is untouched; the unacknowledged segments go out again next
    /// round.  A timed-out round skips [`adapt`](Self::adapt).
    pub fn on_timeout(&mut self) {
        self.window_size = (self.window_size / 2).max(MIN_WINDOW);
    }

    /// Round-end window adaptation.
    ///
    /// A round in which every acknowledgment advanced the window squares
    /// the window size (capped at `max_window`); any mismatch halves it
    /// (floor [`MIN_WINDOW`]).
    pub fn adapt(&mut self, all_correct: bool) {
        if all_correct {
            self.window_size = (self.window_size * self.window_size).min(self.max_window);
        } else {
            self.window_size = (self.window_size / 2).max(MIN_WINDOW);
        }
    }
}

/// Slice `payload` into `mss`-sized segments; the last may be shorter.
///
/// An empty payload yields no segments — the session then goes straight
/// from handshake to teardown.
pub fn segment_payload(payload: &[u8], mss: usize) -> Vec<Vec<u8>> {
    assert!(mss > 0, "mss must be positive");
    payload.chunks(mss).map(<[u8]>::to_vec).collect()
}
