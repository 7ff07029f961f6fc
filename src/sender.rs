//! Windowed transmit engine.
//!
//! [`Sender`] drives a full initiator session: handshake, round-based
//! window transmission with cumulative-acknowledgment collection and
//! window-size adaptation, then teardown.
//!
//! # Round structure
//!
//! While unacknowledged segments remain:
//! 1. Transmit every segment in `[base, base + window_size)`, recording
//!    each in the in-flight buffer.
//! 2. Await exactly as many frames as were sent, each receive bounded by
//!    the configured timeout.  An acknowledgment of `base + 2` advances
//!    the window; anything else resets `base` from the acknowledgment and
//!    fails the round.
//! 3. A timeout halves the window and abandons the round; the
//!    unacknowledged segments go out again next round.
//! 4. A fully acknowledged round squares the window (capped); a failed one
//!    halves it.
//!
//! Transfer retries without bound — only teardown carries a retry budget.
//!
//! The [`SendWindow`] sits behind a mutex locked only around state
//! mutation and never across a socket await, so transmission and
//! acknowledgment handling could later move to separate tasks without
//! changing the locking discipline.

use std::net::SocketAddr;
use std::sync::Mutex;

use crate::config::SenderConfig;
use crate::error::SessionError;
use crate::frame::{flags, Frame};
use crate::handshake;
use crate::simulator::LossyLink;
use crate::socket::{Socket, SocketError};
use crate::state::{ConnectionState, Role};
use crate::teardown;
use crate::window::{segment_payload, AckVerdict, SendWindow};

/// The transmitting endpoint of a session.
pub struct Sender {
    link: LossyLink,
    cfg: SenderConfig,
    role: Role,
    state: ConnectionState,
}

impl Sender {
    /// Bind the local socket and wrap it in the fault-injection layer.
    pub async fn bind(cfg: SenderConfig) -> Result<Self, SessionError> {
        cfg.validate()?;
        let socket = Socket::bind(cfg.bind).await?;
        let link = match cfg.seed {
            Some(seed) => LossyLink::with_seed(socket, cfg.loss_probability, seed),
            None => LossyLink::new(socket, cfg.loss_probability),
        };
        Ok(Self {
            link,
            cfg,
            role: Role::Initiator,
            state: ConnectionState::Closed,
        })
    }

    /// Address the local socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.link.local_addr()
    }

    /// Current FSM state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Drive a complete session: handshake, transfer of `payload`, teardown.
    ///
    /// Returns [`SessionError::TeardownGiveUp`] when the close handshake is
    /// abandoned after its bounded retries — the transfer itself has been
    /// fully acknowledged by then.
    pub async fn run(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        log::info!(
            "[tx] {} session to {}: {} byte(s)",
            self.role,
            self.cfg.peer,
            payload.len()
        );

        handshake::initiate(
            &self.link,
            self.cfg.peer,
            &mut self.state,
            self.cfg.recv_timeout,
            self.cfg.initial_window as u16,
        )
        .await?;

        let (fin_seq, advertised) = self.transfer(payload).await?;

        teardown::initiate(
            &self.link,
            self.cfg.peer,
            &mut self.state,
            fin_seq,
            self.cfg.recv_timeout,
            self.cfg.close_wait_timeout,
            advertised,
        )
        .await
    }

    /// Windowed transfer loop.
    ///
    /// Returns the FIN sequence number (`base + 2` at completion) and the
    /// final window advertisement for the teardown frames.
    async fn transfer(&mut self, payload: &[u8]) -> Result<(u32, u16), SessionError> {
        let segments = segment_payload(payload, self.cfg.mss);
        let total = segments.len();
        let window = Mutex::new(SendWindow::new(
            total,
            self.cfg.initial_window,
            self.cfg.max_window(),
        ));
        log::info!("[tx] transfer: {total} segment(s) of <= {} bytes", self.cfg.mss);

        loop {
            // Build this round's frames under the lock; transmit outside it.
            let frames = {
                let mut w = window.lock().unwrap();
                if w.is_complete() {
                    break;
                }
                let advertised = clamp_window(w.window_size());
                let round: Vec<Frame> = w
                    .round_range()
                    .map(|i| Frame::data(SendWindow::seq_of(i), advertised, segments[i].clone()))
                    .collect();
                for (i, frame) in w.round_range().zip(round.iter()) {
                    w.record_sent(i, frame.encode());
                }
                round
            };

            let count_sent = frames.len();
            for frame in &frames {
                self.link.send_frame(frame, self.cfg.peer).await?;
            }
            log::debug!(
                "[tx] round: {} segment(s) from seq {}",
                count_sent,
                frames[0].header.seq
            );

            // Await one frame per transmitted segment.
            let mut all_correct = true;
            let mut timed_out = false;
            let mut received = 0usize;
            while received < count_sent {
                match self.link.recv_frame(self.cfg.recv_timeout).await {
                    Ok((frame, src)) => {
                        if src != self.cfg.peer {
                            continue;
                        }
                        if frame.header.flags & flags::ACK != 0 {
                            let mut w = window.lock().unwrap();
                            match w.on_ack(frame.header.ack) {
                                AckVerdict::Advanced => {
                                    log::debug!("[tx] ← ACK {}", frame.header.ack);
                                }
                                AckVerdict::Fallback => {
                                    all_correct = false;
                                    log::debug!(
                                        "[tx] ← ACK {} — falling back to base {}",
                                        frame.header.ack,
                                        w.base()
                                    );
                                }
                            }
                        }
                        received += 1;
                    }
                    Err(SocketError::Timeout) => {
                        let mut w = window.lock().unwrap();
                        w.on_timeout();
                        timed_out = true;
                        log::debug!(
                            "[tx] ACK timeout — window shrunk to {}, retransmitting next round",
                            w.window_size()
                        );
                        break;
                    }
                    Err(SocketError::Malformed(e)) => {
                        log::debug!("[tx] ignoring malformed datagram: {e}");
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            // A timed-out round already took its halving penalty.
            if !timed_out {
                let mut w = window.lock().unwrap();
                w.adapt(all_correct);
                log::debug!(
                    "[tx] round done: base {} / {total}, window {}",
                    w.base(),
                    w.window_size()
                );
            }
        }

        let w = window.lock().unwrap();
        log::info!("[tx] transfer complete: {total} segment(s) acknowledged");
        Ok((SendWindow::seq_of(w.base()), clamp_window(w.window_size())))
    }
}

/// The window header field is 16 bits; the in-memory window is clamped when
/// advertised.
fn clamp_window(window: usize) -> u16 {
    window.min(u16::MAX as usize) as u16
}
