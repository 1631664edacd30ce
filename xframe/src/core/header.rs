//! Fragment header layout and serialization.
//!
//! # Header Format
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           Frame ID                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |        Sequence Number        |        Total Fragments        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |         Payload Size          |         CRC32 (high)          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          CRC32 (low)          |          Payload...           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! All fields are big-endian. The CRC covers the payload only.

use crate::error::{Error, Result};

/// Header size in bytes.
pub const HEADER_SIZE: usize = 14;

/// Header carried at the front of every fragment datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Frame this fragment belongs to.
    pub frame_id: u32,

    /// 0-based position of the fragment within the frame.
    pub sequence: u16,

    /// Number of fragments the frame was split into.
    pub total_fragments: u16,

    /// Payload length as announced by the sender. Informational only;
    /// receivers use the datagram length.
    pub payload_size: u16,

    /// CRC-32 of the payload bytes.
    pub checksum: u32,
}

impl PacketHeader {
    /// Writes the header into the front of `buf`.
    ///
    /// Returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::BufferTooSmall);
        }

        buf[0..4].copy_from_slice(&self.frame_id.to_be_bytes());
        buf[4..6].copy_from_slice(&self.sequence.to_be_bytes());
        buf[6..8].copy_from_slice(&self.total_fragments.to_be_bytes());
        buf[8..10].copy_from_slice(&self.payload_size.to_be_bytes());
        buf[10..14].copy_from_slice(&self.checksum.to_be_bytes());

        Ok(HEADER_SIZE)
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        [
            (self.frame_id >> 24) as u8,
            (self.frame_id >> 16) as u8,
            (self.frame_id >> 8) as u8,
            self.frame_id as u8,
            (self.sequence >> 8) as u8,
            self.sequence as u8,
            (self.total_fragments >> 8) as u8,
            self.total_fragments as u8,
            (self.payload_size >> 8) as u8,
            self.payload_size as u8,
            (self.checksum >> 24) as u8,
            (self.checksum >> 16) as u8,
            (self.checksum >> 8) as u8,
            self.checksum as u8,
        ]
    }

    /// Reads a header from the front of `buf`. Trailing bytes are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::MalformedHeader { len: buf.len() });
        }

        Ok(Self {
            frame_id: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            sequence: u16::from_be_bytes([buf[4], buf[5]]),
            total_fragments: u16::from_be_bytes([buf[6], buf[7]]),
            payload_size: u16::from_be_bytes([buf[8], buf[9]]),
            checksum: u32::from_be_bytes([buf[10], buf[11], buf[12], buf[13]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PacketHeader {
        PacketHeader {
            frame_id: 0x0102_0304,
            sequence: 0x0506,
            total_fragments: 0x0708,
            payload_size: 0x090A,
            checksum: 0x0B0C_0D0E,
        }
    }

    #[test]
    fn test_wire_layout_is_big_endian() {
        let bytes = sample().to_bytes();
        assert_eq!(
            bytes,
            [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E]
        );
    }

    #[test]
    fn test_encode_matches_to_bytes() {
        let mut buf = [0u8; 32];
        let n = sample().encode(&mut buf).unwrap();
        assert_eq!(n, HEADER_SIZE);
        assert_eq!(buf[..HEADER_SIZE], sample().to_bytes());
    }

    #[test]
    fn test_encode_short_buffer() {
        let mut buf = [0u8; HEADER_SIZE - 1];
        assert!(matches!(sample().encode(&mut buf), Err(Error::BufferTooSmall)));
    }

    #[test]
    fn test_decode() {
        let decoded = PacketHeader::decode(&sample().to_bytes()).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_decode_short_input() {
        let result = PacketHeader::decode(&[0u8; 10]);
        assert!(matches!(result, Err(Error::MalformedHeader { len: 10 })));
    }
}
