//! Fragment datagrams: a header followed by a payload slice.

use super::checksum;
use super::header::{HEADER_SIZE, PacketHeader};
use crate::error::{Error, Result};

/// A fragment ready to go on the wire. Borrows its payload from the frame.
#[derive(Debug, Clone, Copy)]
pub struct Packet<'a> {
    pub header: PacketHeader,
    pub payload: &'a [u8],
}

impl<'a> Packet<'a> {
    /// Builds a packet for `payload`, filling in size and checksum.
    ///
    /// The caller guarantees `payload.len()` fits in a `u16`.
    pub fn new(frame_id: u32, sequence: u16, total_fragments: u16, payload: &'a [u8]) -> Self {
        Self {
            header: PacketHeader {
                frame_id,
                sequence,
                total_fragments,
                payload_size: payload.len() as u16,
                checksum: checksum::compute(payload),
            },
            payload,
        }
    }

    /// Splits a received datagram into header and payload.
    ///
    /// Datagrams without at least one payload byte are rejected before any
    /// checksum work is done.
    pub fn parse(datagram: &'a [u8]) -> Result<Self> {
        if datagram.len() <= HEADER_SIZE {
            return Err(Error::MalformedHeader { len: datagram.len() });
        }

        let header = PacketHeader::decode(datagram)?;
        Ok(Self {
            header,
            payload: &datagram[HEADER_SIZE..],
        })
    }

    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Serializes header and payload into one datagram.
    pub fn encode(&self) -> Vec<u8> {
        let mut datagram = Vec::with_capacity(self.wire_size());
        datagram.extend_from_slice(&self.header.to_bytes());
        datagram.extend_from_slice(self.payload);
        datagram
    }

    pub fn verify(&self) -> bool {
        checksum::verify(self.payload, self.header.checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fills_size_and_checksum() {
        let packet = Packet::new(9, 1, 3, b"payload");
        assert_eq!(packet.header.payload_size, 7);
        assert_eq!(packet.header.checksum, checksum::compute(b"payload"));
        assert!(packet.verify());
    }

    #[test]
    fn test_encode_then_parse() {
        let packet = Packet::new(42, 2, 4, b"abc");
        let datagram = packet.encode();
        assert_eq!(datagram.len(), HEADER_SIZE + 3);

        let parsed = Packet::parse(&datagram).unwrap();
        assert_eq!(parsed.header, packet.header);
        assert_eq!(parsed.payload, b"abc");
    }

    #[test]
    fn test_checksum_is_crc32_ieee() {
        // Receivers on the wire expect the IEEE polynomial check value.
        let packet = Packet::new(1, 0, 1, b"123456789");
        assert_eq!(packet.header.checksum, 0xCBF4_3926);
    }

    #[test]
    fn test_verify_detects_bit_flip() {
        let mut payload = vec![0x5Au8; 1024];
        let datagram = Packet::new(3, 0, 1, &payload).encode();
        payload[513] ^= 0x01;

        let mut corrupt = datagram.clone();
        corrupt[HEADER_SIZE..].copy_from_slice(&payload);
        assert!(Packet::parse(&datagram).unwrap().verify());
        assert!(!Packet::parse(&corrupt).unwrap().verify());
    }

    #[test]
    fn test_parse_rejects_header_only() {
        let datagram = Packet::new(1, 0, 1, b"x").encode();
        let result = Packet::parse(&datagram[..HEADER_SIZE]);
        assert!(matches!(result, Err(Error::MalformedHeader { len: HEADER_SIZE })));
    }

    #[test]
    fn test_parse_rejects_short_datagram() {
        let result = Packet::parse(&[0u8; 10]);
        assert!(matches!(result, Err(Error::MalformedHeader { len: 10 })));
    }

    #[test]
    fn test_payload_length_comes_from_datagram() {
        let mut packet = Packet::new(1, 0, 1, b"hello");
        packet.header.payload_size = 999;
        let datagram = packet.encode();

        let parsed = Packet::parse(&datagram).unwrap();
        assert_eq!(parsed.payload, b"hello");
        assert!(parsed.verify());
    }
}
