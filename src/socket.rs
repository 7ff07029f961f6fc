//! Async UDP socket abstraction.
//!
//! [`Socket`] is a thin wrapper around `tokio::net::UdpSocket` that speaks
//! [`crate::frame::Frame`] instead of raw bytes.  All protocol logic lives
//! elsewhere; this module owns only byte I/O.
//!
//! Every receive is bounded: [`Socket::recv_frame`] takes an explicit
//! timeout and fails with [`SocketError::Timeout`] when no datagram arrives
//! within it, so no caller can stall indefinitely.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use crate::frame::{Frame, FrameError};

/// Maximum UDP payload size (theoretical limit; in practice kept much smaller).
const MAX_DATAGRAM: usize = 65_535;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can arise from socket operations.
#[derive(Debug)]
pub enum SocketError {
    /// No datagram arrived within the receive bound.
    Timeout,
    /// The received datagram could not be decoded as a valid frame.
    Malformed(FrameError),
    /// Underlying I/O error from the OS.
    Io(std::io::Error),
}

impl std::fmt::Display for SocketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "no datagram within the receive timeout"),
            Self::Malformed(e) => write!(f, "frame decode error: {e}"),
            Self::Io(e) => write!(f, "socket I/O error: {e}"),
        }
    }
}

impl std::error::Error for SocketError {}

impl From<std::io::Error> for SocketError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<FrameError> for SocketError {
    fn from(e: FrameError) -> Self {
        Self::Malformed(e)
    }
}

// ---------------------------------------------------------------------------
// Socket
// ---------------------------------------------------------------------------

/// An async, frame-oriented UDP socket.
///
/// All methods are `&self` so the socket can be shared across tasks if needed.
#[derive(Debug)]
pub struct Socket {
    /// Address this socket is bound to (filled in after OS assigns ephemeral port).
    pub local_addr: SocketAddr,
    inner: UdpSocket,
}

impl Socket {
    /// Bind a new socket to `local_addr`.
    ///
    /// Passing `127.0.0.1:0` lets the OS choose an ephemeral port.
    pub async fn bind(local_addr: SocketAddr) -> Result<Self, SocketError> {
        let inner = UdpSocket::bind(local_addr).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self { local_addr, inner })
    }

    /// Encode `frame` and send it as a single UDP datagram to `dest`.
    pub async fn send_frame(&self, frame: &Frame, dest: SocketAddr) -> Result<(), SocketError> {
        let bytes = frame.encode();
        self.inner.send_to(&bytes, dest).await?;
        Ok(())
    }

    /// Receive the next datagram and decode it into a [`Frame`].
    ///
    /// Returns `(frame, sender_address)`.  Datagrams that fail to decode are
    /// returned as [`SocketError::Malformed`] — the caller decides whether to
    /// retry.  Waits at most `timeout` before returning
    /// [`SocketError::Timeout`].
    pub async fn recv_frame(
        &self,
        timeout: Duration,
    ) -> Result<(Frame, SocketAddr), SocketError> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (n, addr) = tokio::time::timeout(timeout, self.inner.recv_from(&mut buf))
            .await
            .map_err(|_elapsed| SocketError::Timeout)??;
        let frame = Frame::decode(&buf[..n])?;
        Ok((frame, addr))
    }
}
