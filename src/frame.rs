//! Wire-format definitions for protocol frames.
//!
//! Every datagram exchanged between peers is a [`Frame`].  This module is
//! responsible for:
//! - Defining the on-wire binary layout (header fields, flags, payload).
//! - Serialising a [`Frame`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Frame`], returning errors
//!   for malformed or truncated input.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    Acknowledgment Number                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Flags     |        Window Size            |  Payload Len  .
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! .  (cont.)      |                Payload ...                    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total header size: [`HEADER_LEN`] = 13 bytes.
//! seq(4) + ack(4) + flags(1) + window(2) + payload_len(2)
//!
//! The header carries **no checksum**: corruption introduced below the
//! transport is undetectable at this layer.

/// Bit-flag constants for the `flags` header field.
pub mod flags {
    /// Synchronise sequence numbers (handshake initiation).
    pub const SYN: u8 = 0b0000_0001;
    /// Acknowledgement field is valid.
    pub const ACK: u8 = 0b0000_0010;
    /// Finish — sender has no more data to send.
    pub const FIN: u8 = 0b0000_0100;
}

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 13;

/// First sequence number carried by a data segment.
///
/// Sequence numbers 0 and 1 are reserved for the handshake's SYN and
/// completing ACK, so segment `i` travels as `i + DATA_SEQ_START`.
pub const DATA_SEQ_START: u32 = 2;

// Byte offsets of each field within the serialised header.
const OFF_SEQ: usize = 0;
const OFF_ACK: usize = 4;
const OFF_FLAGS: usize = 8;
const OFF_WINDOW: usize = 9;
const OFF_PAYLOAD_LEN: usize = 11;

/// Fixed-size protocol header.
///
/// Fields are in host byte order; [`Frame::encode`] converts to big-endian
/// on the wire and [`Frame::decode`] converts back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Sequence number of this frame (segment index + 2 for data frames).
    pub seq: u32,
    /// Acknowledgment number (cumulative; meaningful when `ACK` is set).
    pub ack: u32,
    /// Bitmask of [`flags`] constants.
    pub flags: u8,
    /// Advertised window, in segments on the sender side and receive slots
    /// on the receiver side.
    pub window: u16,
    /// Length of the payload in bytes.
    ///
    /// On encode this is computed from the actual payload length.
    /// On decode this is authoritative: trailing bytes beyond it are dropped.
    pub payload_len: u16,
}

/// A complete protocol datagram: header + payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Build a data frame carrying one segment.
    pub fn data(seq: u32, window: u16, payload: Vec<u8>) -> Self {
        Self::new(seq, 0, 0, window, payload)
    }

    /// Build a payload-less control frame (SYN / ACK / FIN combinations).
    pub fn control(seq: u32, ack: u32, flags: u8, window: u16) -> Self {
        Self::new(seq, ack, flags, window, Vec::new())
    }

    fn new(seq: u32, ack: u32, flags: u8, window: u16, payload: Vec<u8>) -> Self {
        Self {
            header: Header {
                seq,
                ack,
                flags,
                window,
                payload_len: payload.len() as u16,
            },
            payload,
        }
    }

    /// Serialise this frame into a newly allocated byte vector.
    ///
    /// `header.payload_len` is computed from the actual payload; any value
    /// already stored in that field is ignored.
    pub fn encode(&self) -> Vec<u8> {
        debug_assert!(self.payload.len() <= u16::MAX as usize);
        let payload_len = self.payload.len();
        let mut buf = vec![0u8; HEADER_LEN + payload_len];

        buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&self.header.seq.to_be_bytes());
        buf[OFF_ACK..OFF_ACK + 4].copy_from_slice(&self.header.ack.to_be_bytes());
        buf[OFF_FLAGS] = self.header.flags;
        buf[OFF_WINDOW..OFF_WINDOW + 2].copy_from_slice(&self.header.window.to_be_bytes());
        buf[OFF_PAYLOAD_LEN..OFF_PAYLOAD_LEN + 2]
            .copy_from_slice(&(payload_len as u16).to_be_bytes());

        buf[HEADER_LEN..].copy_from_slice(&self.payload);
        buf
    }

    /// Parse a [`Frame`] from a raw byte slice.
    ///
    /// Returns [`Err`] if:
    /// - `buf` is shorter than [`HEADER_LEN`], or
    /// - fewer than `payload_len` bytes follow the header.
    ///
    /// Bytes beyond the declared `payload_len` are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < HEADER_LEN {
            return Err(FrameError::BufferTooShort);
        }

        let seq = u32::from_be_bytes(buf[OFF_SEQ..OFF_SEQ + 4].try_into().unwrap());
        let ack = u32::from_be_bytes(buf[OFF_ACK..OFF_ACK + 4].try_into().unwrap());
        let flags = buf[OFF_FLAGS];
        let window = u16::from_be_bytes(buf[OFF_WINDOW..OFF_WINDOW + 2].try_into().unwrap());
        let payload_len =
            u16::from_be_bytes(buf[OFF_PAYLOAD_LEN..OFF_PAYLOAD_LEN + 2].try_into().unwrap());

        if buf.len() < HEADER_LEN + payload_len as usize {
            return Err(FrameError::Truncated);
        }

        Ok(Frame {
            header: Header {
                seq,
                ack,
                flags,
                window,
                payload_len,
            },
            payload: buf[HEADER_LEN..HEADER_LEN + payload_len as usize].to_vec(),
        })
    }
}

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Buffer shorter than the fixed header size.
    BufferTooShort,
    /// `payload_len` field claims more bytes than the buffer holds.
    Truncated,
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::BufferTooShort => write!(f, "buffer too short to contain a header"),
            FrameError::Truncated => {
                write!(f, "payload_len field claims more bytes than present")
            }
        }
    }
}

impl std::error::Error for FrameError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(seq: u32, ack: u32, flags: u8, window: u16, payload: &[u8]) -> Frame {
        Frame::new(seq, ack, flags, window, payload.to_vec())
    }

    #[test]
    fn encode_decode_roundtrip() {
        let frame = make_frame(42, 7, flags::SYN, 5, b"hello");
        let decoded = Frame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn encode_sets_correct_payload_len() {
        let frame = make_frame(1, 2, flags::ACK, 8, b"world");
        let bytes = frame.encode();
        let len_field = u16::from_be_bytes([bytes[OFF_PAYLOAD_LEN], bytes[OFF_PAYLOAD_LEN + 1]]);
        assert_eq!(len_field, frame.payload.len() as u16);
    }

    #[test]
    fn decode_empty_buffer_returns_error() {
        assert_eq!(Frame::decode(&[]), Err(FrameError::BufferTooShort));
    }

    #[test]
    fn decode_short_header_returns_error() {
        assert_eq!(
            Frame::decode(&[0u8; HEADER_LEN - 1]),
            Err(FrameError::BufferTooShort)
        );
    }

    #[test]
    fn decode_truncated_payload_returns_error() {
        let mut bytes = make_frame(0, 0, 0, 0, b"data").encode();
        bytes.pop(); // payload_len still claims 4 bytes, but buf is one short
        assert_eq!(Frame::decode(&bytes), Err(FrameError::Truncated));
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let mut bytes = make_frame(9, 0, 0, 0, b"data").encode();
        bytes.extend_from_slice(b"junk");
        let decoded = Frame::decode(&bytes).unwrap();
        assert_eq!(decoded.payload, b"data");
        assert_eq!(decoded.header.payload_len, 4);
    }

    #[test]
    fn syn_flag_is_set_correctly() {
        let bytes = make_frame(0, 0, flags::SYN, 0, b"").encode();
        assert_eq!(bytes[OFF_FLAGS] & flags::SYN, flags::SYN);
    }

    #[test]
    fn empty_payload_roundtrip() {
        let frame = make_frame(0, 1000, flags::ACK, 65535, b"");
        let decoded = Frame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded.payload, Vec::<u8>::new());
        assert_eq!(decoded.header.payload_len, 0);
    }

    #[test]
    fn header_len_constant_is_correct() {
        // seq(4) + ack(4) + flags(1) + window(2) + payload_len(2) = 13
        assert_eq!(HEADER_LEN, 13);
    }

    #[test]
    fn encoded_length_equals_header_plus_payload() {
        let payload = b"exactly twelve!";
        let bytes = make_frame(0, 0, 0, 0, payload).encode();
        assert_eq!(bytes.len(), HEADER_LEN + payload.len());
    }

    #[test]
    fn multiple_flag_bits() {
        let f = flags::SYN | flags::ACK;
        let bytes = make_frame(1, 2, f, 5, b"").encode();
        assert_eq!(bytes[OFF_FLAGS], f);
    }

    #[test]
    fn fin_ack_combination() {
        let f = flags::FIN | flags::ACK;
        let decoded = Frame::decode(&make_frame(3, 4, f, 5, b"").encode()).unwrap();
        assert_eq!(decoded.header.flags, f);
    }

    #[test]
    fn seq_ack_big_endian_on_wire() {
        let bytes = make_frame(0x0102_0304, 0x0506_0708, 0, 0, b"").encode();
        assert_eq!(&bytes[OFF_SEQ..OFF_SEQ + 4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[OFF_ACK..OFF_ACK + 4], &[0x05, 0x06, 0x07, 0x08]);
    }
}
