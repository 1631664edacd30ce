use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use crate::core::HEADER_SIZE;
use crate::error::{Error, Result};
use crate::{DEFAULT_FRAME_INTERVAL, DEFAULT_MAX_PAYLOAD_SIZE, DEFAULT_SERVER_PORT, MAX_DATAGRAM_SIZE};

/// Producer-side settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub max_payload_size: usize,
    pub frame_interval: Duration,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self {
            bind_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_SERVER_PORT)),
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_payload_size == 0 {
            return Err(Error::InvalidConfig("max_payload_size must be non-zero"));
        }
        if self.max_payload_size + HEADER_SIZE > MAX_DATAGRAM_SIZE {
            return Err(Error::InvalidConfig("max_payload_size exceeds datagram limit"));
        }
        if self.frame_interval.is_zero() {
            return Err(Error::InvalidConfig("frame_interval must be non-zero"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver-side settings.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    pub bind_addr: SocketAddr,
    pub recv_buffer_size: usize,
}

impl ReceiverConfig {
    pub fn new() -> Self {
        Self {
            bind_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
            recv_buffer_size: MAX_DATAGRAM_SIZE,
        }
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.recv_buffer_size <= HEADER_SIZE {
            return Err(Error::InvalidConfig("recv_buffer_size must exceed the header size"));
        }
        Ok(())
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self::new()
    }
}
