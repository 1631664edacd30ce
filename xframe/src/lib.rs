//! # XFrame - Best-Effort Frame Streaming over UDP
//!
//! XFrame moves large opaque frames (camera images, typically) from one
//! producer to many receivers over UDP:
//!
//! - **Fragmentation**: frames are split into bounded fragments with a
//!   fixed 14-byte header
//! - **CRC32 checksum**: every fragment payload is verified on arrival
//! - **Out-of-order reassembly**: fragments may arrive in any order, twice,
//!   or not at all
//! - **Fan-out**: receivers register with a literal `register` datagram and
//!   get every frame from then on
//!
//! Delivery is best-effort. There are no acknowledgments or retransmissions;
//! a frame that loses a fragment is dropped when the next frame starts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────── server ─────────────────────────┐
//! │  FrameSource ──▶ Distributor ──▶ fragment() ──▶ socket  │
//! │                      ▲                                   │
//! │               ClientRegistry ◀── registration listener  │
//! └───────────────────────────┬──────────────────────────────┘
//!                             │ UDP
//! ┌──────────────────────── client ─────────────────────────┐
//! │  socket ──▶ FrameReceiver ──▶ FrameAssembler ──▶ FrameSink│
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use xframe::{fragment, FrameAssembler};
//!
//! let frame = vec![0x42u8; 2600];
//! let assembler = FrameAssembler::new();
//!
//! let mut output = None;
//! for packet in fragment(&frame, 1, 1024).unwrap() {
//!     let datagram = packet.encode();
//!     output = assembler.push_datagram(&datagram).unwrap();
//! }
//! assert_eq!(output, Some(frame));
//! ```

#![deny(unsafe_code)]

use std::time::Duration;

pub mod assembler;
pub mod config;
pub mod core;
pub mod distributor;
pub mod error;
pub mod fragment;
pub mod listener;
pub mod receiver;
pub mod registry;

// Re-export commonly used types
pub use assembler::{AssemblerState, AssemblerStats, FrameAssembler};
pub use config::{ReceiverConfig, ServerConfig};
pub use crate::core::{HEADER_SIZE, Packet, PacketHeader, checksum};
pub use distributor::{CycleReport, Distributor, DistributorStats, FrameSource};
pub use error::{Error, Result};
pub use fragment::{Fragments, fragment};
pub use listener::{is_registration, run_registration_listener};
pub use receiver::{FrameReceiver, FrameSink};
pub use registry::ClientRegistry;

/// Datagram a receiver sends to subscribe to the stream.
pub const REGISTER_SIGNAL: &[u8] = b"register";

/// Default maximum fragment payload in bytes.
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 1024;

/// Largest UDP payload over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65507;

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default distribution cadence, roughly 30 frames per second.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);
