//! Ordered receive engine.
//!
//! [`Receiver`] drives a full responder session: handshake, the in-order
//! receive loop, then teardown, returning the reassembled byte stream.
//!
//! The receive loop is a pure gate.  Exactly one sequence number is
//! acceptable at any moment; everything else — duplicates from sender
//! retransmission, segments that ran ahead of a loss — is answered with a
//! cumulative re-acknowledgment of the last good delivery and discarded.
//! That re-acknowledgment is what steers the sender back to the confirmed
//! point.
//!
//! Receive timeouts keep the loop alive (the sender recovers by
//! retransmitting; there is nothing to do here but keep listening).  Only
//! transport-level I/O failures end the session.

use std::net::SocketAddr;

use crate::config::ReceiverConfig;
use crate::error::SessionError;
use crate::frame::{flags, Frame};
use crate::gate::{InOrderGate, SegmentVerdict};
use crate::handshake;
use crate::simulator::LossyLink;
use crate::socket::{Socket, SocketError};
use crate::state::{ConnectionState, Role};
use crate::teardown;

/// The receiving endpoint of a session.
pub struct Receiver {
    link: LossyLink,
    cfg: ReceiverConfig,
    role: Role,
    state: ConnectionState,
    gate: InOrderGate,
}

impl Receiver {
    /// Bind the local socket and wrap it in the fault-injection layer.
    pub async fn bind(cfg: ReceiverConfig) -> Result<Self, SessionError> {
        cfg.validate()?;
        let socket = Socket::bind(cfg.bind).await?;
        let link = match cfg.seed {
            Some(seed) => LossyLink::with_seed(socket, cfg.loss_probability, seed),
            None => LossyLink::new(socket, cfg.loss_probability),
        };
        Ok(Self {
            link,
            cfg,
            role: Role::Responder,
            state: ConnectionState::Closed,
            gate: InOrderGate::new(),
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

    /// Next sequence number the in-order gate will accept.
    pub fn expected(&self) -> u32 {
        self.gate.expected()
    }

    /// Drive a complete session and return the delivered byte stream,
    /// segments concatenated in sequence order.
    ///
    /// An abandoned responder-side teardown is logged; the delivered data
    /// is returned regardless.
    pub async fn run(&mut self) -> Result<Vec<u8>, SessionError> {
        log::info!("[rx] {} session on {}", self.role, self.local_addr());

        let peer = handshake::respond(
            &self.link,
            &mut self.state,
            self.cfg.recv_timeout,
            self.cfg.advertised_window,
        )
        .await?;

        self.receive_data(peer).await?;

        match teardown::respond(
            &self.link,
            peer,
            &mut self.state,
            &mut self.gate,
            self.cfg.recv_timeout,
            self.cfg.advertised_window,
        )
        .await
        {
            Ok(()) => {}
            Err(SessionError::TeardownGiveUp) => {
                log::warn!("[rx] close abandoned; returning delivered data");
            }
            Err(e) => return Err(e),
        }

        let data = self.gate.assemble();
        log::info!(
            "[rx] session done: {} segment(s), {} byte(s)",
            self.gate.delivered(),
            data.len()
        );
        Ok(data)
    }

    /// In-order receive loop; returns when the qualifying FIN arrives.
    async fn receive_data(&mut self, peer: SocketAddr) -> Result<(), SessionError> {
        loop {
            match self.link.recv_frame(self.cfg.recv_timeout).await {
                Ok((frame, src)) => {
                    if src != peer {
                        continue;
                    }
                    let h = &frame.header;

                    if h.flags & flags::FIN != 0 && self.gate.is_expected_fin(h.seq) {
                        log::debug!("[rx] ← FIN seq={} — entering teardown", h.seq);
                        return Ok(());
                    }

                    let (verdict, ack) = self.gate.on_segment(h.seq, &frame.payload);
                    let reply = Frame::control(0, ack, flags::ACK, self.cfg.advertised_window);
                    self.link.send_frame(&reply, peer).await?;

                    match verdict {
                        SegmentVerdict::Accepted => log::debug!(
                            "[rx] ← DATA seq={} len={}; → ACK {ack}",
                            h.seq,
                            frame.payload.len()
                        ),
                        SegmentVerdict::Reacknowledged => log::debug!(
                            "[rx] ← seq={} while expecting {}; → ACK {ack}",
                            h.seq,
                            self.gate.expected()
                        ),
                    }
                }
                Err(SocketError::Timeout) => {
                    log::debug!("[rx] idle — still listening");
                }
                Err(SocketError::Malformed(e)) => {
                    log::debug!("[rx] ignoring malformed datagram: {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
