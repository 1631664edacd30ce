//! Client-side receive loop.
//!
//! Registers with a server, then feeds every datagram it gets into a
//! [`FrameAssembler`] and hands completed frames to a [`FrameSink`].

use std::net::SocketAddr;
use std::ops::ControlFlow;

use log::{debug, info, warn};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::REGISTER_SIGNAL;
use crate::assembler::{AssemblerStats, FrameAssembler};
use crate::config::ReceiverConfig;
use crate::error::{Error, Result};

/// Consumer of reassembled frames, e.g. a decoder and display.
pub trait FrameSink {
    /// Called once per complete frame. Returning `Break` stops the
    /// receive loop.
    fn on_frame(&mut self, frame: Vec<u8>) -> ControlFlow<()>;
}

impl<F> FrameSink for F
where
    F: FnMut(Vec<u8>) -> ControlFlow<()>,
{
    fn on_frame(&mut self, frame: Vec<u8>) -> ControlFlow<()> {
        self(frame)
    }
}

/// One receiving endpoint: a socket plus the assembler that owns its
/// partial frame.
#[derive(Debug)]
pub struct FrameReceiver {
    socket: UdpSocket,
    assembler: FrameAssembler,
    recv_buffer_size: usize,
}

impl FrameReceiver {
    /// Binds the local socket. Failure here is fatal for the receiver.
    pub async fn bind(config: &ReceiverConfig) -> Result<Self> {
        config.validate()?;
        let socket = UdpSocket::bind(config.bind_addr).await?;
        info!("Receiver bound to {}", socket.local_addr()?);

        Ok(Self {
            socket,
            assembler: FrameAssembler::new(),
            recv_buffer_size: config.recv_buffer_size,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Announces this endpoint to the server.
    ///
    /// Registration is a single unacknowledged datagram; call again if the
    /// server may have missed it.
    pub async fn register(&self, server: SocketAddr) -> Result<()> {
        self.socket.send_to(REGISTER_SIGNAL, server).await?;
        info!("Registration sent to {}", server);
        Ok(())
    }

    /// Receives until `cancel` fires or the sink asks to stop.
    ///
    /// Malformed, corrupt and incomplete fragments are logged and skipped;
    /// only socket errors end the loop with an error.
    pub async fn run<S>(&self, sink: &mut S, cancel: CancellationToken) -> Result<()>
    where
        S: FrameSink + ?Sized,
    {
        let mut buf = vec![0u8; self.recv_buffer_size];

        loop {
            let n = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Receive loop cancelled");
                    return Ok(());
                }
                received = self.socket.recv_from(&mut buf) => received?.0,
            };

            match self.assembler.push_datagram(&buf[..n]) {
                Ok(Some(frame)) => {
                    if sink.on_frame(frame).is_break() {
                        info!("Receive loop stopped by consumer");
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(e @ Error::MalformedHeader { .. }) => {
                    warn!("Received packet too small: {}", e);
                }
                Err(e @ Error::ChecksumMismatch { .. }) => {
                    debug!("{}", e);
                }
                Err(e) if e.is_recoverable() => {
                    warn!("{}", e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn stats(&self) -> AssemblerStats {
        self.assembler.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Packet;
    use crate::fragment::fragment;
    use std::sync::Arc;
    use std::time::Duration;

    async fn receiver() -> FrameReceiver {
        let config = ReceiverConfig::new().with_bind_addr("127.0.0.1:0".parse().unwrap());
        FrameReceiver::bind(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_register_sends_signal() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let rx = receiver().await;
        rx.register(server.local_addr().unwrap()).await.unwrap();

        let mut buf = [0u8; 64];
        let (n, from) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], REGISTER_SIGNAL);
        assert_eq!(from, rx.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_delivers_frames_and_skips_noise() {
        let rx = receiver().await;
        let target = rx.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let frame: Vec<u8> = (0..3000).map(|i| (i % 199) as u8).collect();
        let mut datagrams: Vec<Vec<u8>> = fragment(&frame, 1, 1024)
            .unwrap()
            .map(|p| p.encode())
            .collect();

        let mut corrupt = datagrams[0].clone();
        *corrupt.last_mut().unwrap() ^= 0xFF;
        datagrams.insert(0, corrupt);
        datagrams.insert(0, b"short".to_vec());

        for d in &datagrams {
            sender.send_to(d, target).await.unwrap();
        }

        let mut frames = Vec::new();
        let mut sink = |f: Vec<u8>| -> ControlFlow<()> {
            frames.push(f);
            ControlFlow::Break(())
        };
        tokio::time::timeout(Duration::from_secs(5), rx.run(&mut sink, CancellationToken::new()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(frames, vec![frame]);
        let stats = rx.stats();
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.checksum_errors, 1);
    }

    #[tokio::test]
    async fn test_cancel_stops_idle_loop() {
        let rx = Arc::new(receiver().await);
        let cancel = CancellationToken::new();

        let task = {
            let rx = Arc::clone(&rx);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut sink = |_: Vec<u8>| -> ControlFlow<()> { ControlFlow::Continue(()) };
                rx.run(&mut sink, cancel).await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_single_packet_frames() {
        let rx = receiver().await;
        let target = rx.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        for id in 1..=3u32 {
            let payload = [id as u8; 8];
            let datagram = Packet::new(id, 0, 1, &payload).encode();
            sender.send_to(&datagram, target).await.unwrap();
        }

        let mut ids = Vec::new();
        let mut sink = |f: Vec<u8>| -> ControlFlow<()> {
            ids.push(f[0]);
            if ids.len() == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        tokio::time::timeout(Duration::from_secs(5), rx.run(&mut sink, CancellationToken::new()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ids, vec![1, 2, 3]);
    }
}
