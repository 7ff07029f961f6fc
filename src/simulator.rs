//! Fault-injection layer for deterministic testing.
//!
//! Real networks drop packets.  To exercise the reliability mechanisms
//! without depending on actual network conditions, [`LossyLink`] wraps a
//! [`crate::socket::Socket`] and silently discards each outgoing frame with
//! a configurable probability.  Loss applies to *every* outgoing frame —
//! data, ACKs, handshake and teardown alike — so both directions of a
//! session see the same fault model the protocol is built to tolerate.
//!
//! The RNG is a seedable `StdRng`: construct with [`LossyLink::with_seed`]
//! in tests so fault patterns are reproducible.  Receives pass through
//! unchanged.

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::frame::Frame;
use crate::socket::{Socket, SocketError};

/// A socket wrapper that probabilistically drops outgoing frames.
#[derive(Debug)]
pub struct LossyLink {
    socket: Socket,
    /// Probability in `[0.0, 1.0]` that any given outgoing frame is dropped.
    loss_probability: f64,
    rng: Mutex<StdRng>,
}

impl LossyLink {
    /// Wrap `socket`, dropping outgoing frames with `loss_probability`.
    ///
    /// The RNG is seeded from system entropy; use [`with_seed`] when the
    /// fault pattern must be reproducible.
    ///
    /// [`with_seed`]: LossyLink::with_seed
    pub fn new(socket: Socket, loss_probability: f64) -> Self {
        Self {
            socket,
            loss_probability,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Like [`LossyLink::new`] but with a fixed RNG seed.
    pub fn with_seed(socket: Socket, loss_probability: f64, seed: u64) -> Self {
        Self {
            socket,
            loss_probability,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Address the underlying socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr
    }

    /// Sample the fault model once.
    fn roll_drop(&self) -> bool {
        if self.loss_probability <= 0.0 {
            return false;
        }
        self.rng.lock().unwrap().gen::<f64>() < self.loss_probability
    }

    /// Send `frame` to `dest`, unless the fault model drops it.
    ///
    /// A dropped frame is reported as sent — exactly what the wire would do.
    pub async fn send_frame(&self, frame: &Frame, dest: SocketAddr) -> Result<(), SocketError> {
        if self.roll_drop() {
            log::debug!(
                "[sim] dropped frame seq={} flags={:#04b}",
                frame.header.seq,
                frame.header.flags
            );
            return Ok(());
        }
        self.socket.send_frame(frame, dest).await
    }

    /// Receive the next frame; faults are injected on send only.
    pub async fn recv_frame(
        &self,
        timeout: Duration,
    ) -> Result<(Frame, SocketAddr), SocketError> {
        self.socket.recv_frame(timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn loopback_link(loss: f64, seed: u64) -> LossyLink {
        let socket = Socket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .expect("bind");
        LossyLink::with_seed(socket, loss, seed)
    }

    #[tokio::test]
    async fn zero_loss_never_drops() {
        let link = loopback_link(0.0, 1).await;
        for _ in 0..1000 {
            assert!(!link.roll_drop());
        }
    }

    #[tokio::test]
    async fn full_loss_always_drops() {
        let link = loopback_link(1.0, 1).await;
        for _ in 0..1000 {
            assert!(link.roll_drop());
        }
    }

    #[tokio::test]
    async fn same_seed_same_pattern() {
        let a = loopback_link(0.5, 42).await;
        let b = loopback_link(0.5, 42).await;
        let pattern_a: Vec<bool> = (0..64).map(|_| a.roll_drop()).collect();
        let pattern_b: Vec<bool> = (0..64).map(|_| b.roll_drop()).collect();
        assert_eq!(pattern_a, pattern_b);
    }
}
