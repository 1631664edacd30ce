//! Wire-level building blocks:
//! - Header: fixed 14-byte fragment header
//! - Packet: header plus payload slice, as sent in one datagram
//! - Checksum: CRC32 over fragment payloads

pub mod checksum;
mod header;
mod packet;

pub use header::{HEADER_SIZE, PacketHeader};
pub use packet::Packet;
