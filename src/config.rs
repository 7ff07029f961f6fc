//! Session configuration.
//!
//! Plain structs carrying the protocol's tunables with the defaults the
//! transport was designed around: 10 % simulated loss, a 500 ms sender
//! receive timeout against a 5 s receiver timeout, an initial round window
//! of 2 segments and 1024-byte segments.

use std::net::SocketAddr;
use std::time::Duration;

use crate::window::MIN_WINDOW;

/// Total advertised window budget in bytes; the round-window growth cap is
/// this divided by the segment size.
pub const MAX_WINDOW_BYTES: usize = 655_350;

/// Configuration errors reported when a field is out of range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `loss_probability` outside `[0.0, 1.0]`.
    LossProbabilityOutOfRange,
    /// `mss` must be positive.
    ZeroSegmentSize,
    /// `initial_window` must be at least one segment.
    ZeroWindow,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LossProbabilityOutOfRange => {
                write!(f, "loss probability must lie in [0.0, 1.0]")
            }
            Self::ZeroSegmentSize => write!(f, "maximum segment size must be positive"),
            Self::ZeroWindow => write!(f, "initial window must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// Tunables for the transmitting endpoint.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Local address to bind; `127.0.0.1:0` picks an ephemeral port.
    pub bind: SocketAddr,
    /// Peer (receiver) address.
    pub peer: SocketAddr,
    /// Probability that the fault-injection layer drops an outgoing frame.
    pub loss_probability: f64,
    /// Bound on every blocking receive during handshake and transfer.
    pub recv_timeout: Duration,
    /// Bound on each wait for the final closing acknowledgment.
    pub close_wait_timeout: Duration,
    /// Round window at the start of the transfer, in segments.
    pub initial_window: usize,
    /// Maximum segment size in bytes.
    pub mss: usize,
    /// Fixed RNG seed for the fault-injection layer; `None` seeds from
    /// entropy.
    pub seed: Option<u64>,
}

impl SenderConfig {
    /// Defaults for a sender talking to `peer`.
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            bind: "127.0.0.1:0".parse().unwrap(),
            peer,
            loss_probability: 0.1,
            recv_timeout: Duration::from_millis(500),
            close_wait_timeout: Duration::from_secs(5),
            initial_window: MIN_WINDOW,
            mss: 1024,
            seed: None,
        }
    }

    /// Round-window growth cap for this segment size.
    pub fn max_window(&self) -> usize {
        MAX_WINDOW_BYTES / self.mss
    }

    /// Check every field is within its legal range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.loss_probability) {
            return Err(ConfigError::LossProbabilityOutOfRange);
        }
        if self.mss == 0 {
            return Err(ConfigError::ZeroSegmentSize);
        }
        if self.initial_window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// Tunables for the receiving endpoint.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Local address to bind.
    pub bind: SocketAddr,
    /// Probability that the fault-injection layer drops an outgoing frame
    /// (acknowledgments included).
    pub loss_probability: f64,
    /// Bound on every blocking receive.
    pub recv_timeout: Duration,
    /// Window value advertised in outgoing frames.
    pub advertised_window: u16,
    /// Fixed RNG seed for the fault-injection layer; `None` seeds from
    /// entropy.
    pub seed: Option<u64>,
}

impl ReceiverConfig {
    /// Defaults for a receiver bound to `bind`.
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            loss_probability: 0.1,
            recv_timeout: Duration::from_secs(5),
            advertised_window: 5,
            seed: None,
        }
    }

    /// Check every field is within its legal range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.loss_probability) {
            return Err(ConfigError::LossProbabilityOutOfRange);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:9000".parse().unwrap()
    }

    #[test]
    fn sender_defaults_are_valid() {
        let cfg = SenderConfig::new(addr());
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.mss, 1024);
        assert_eq!(cfg.initial_window, 2);
        assert_eq!(cfg.recv_timeout, Duration::from_millis(500));
    }

    #[test]
    fn receiver_defaults_are_valid() {
        let cfg = ReceiverConfig::new(addr());
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.advertised_window, 5);
        assert_eq!(cfg.recv_timeout, Duration::from_secs(5));
    }

    #[test]
    fn max_window_derives_from_segment_size() {
        let cfg = SenderConfig::new(addr());
        assert_eq!(cfg.max_window(), MAX_WINDOW_BYTES / 1024);
    }

    #[test]
    fn out_of_range_loss_rejected() {
        let mut cfg = SenderConfig::new(addr());
        cfg.loss_probability = 1.5;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::LossProbabilityOutOfRange)
        );
    }

    #[test]
    fn zero_mss_rejected() {
        let mut cfg = SenderConfig::new(addr());
        cfg.mss = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroSegmentSize));
    }
}
