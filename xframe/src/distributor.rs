//! Server-side distribution loop: capture, fragment, fan out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, info, trace, warn};
use tokio::net::UdpSocket;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::fragment::fragment;
use crate::registry::ClientRegistry;

/// Producer of opaque frames, e.g. a camera plus encoder.
///
/// Called synchronously on the distribution task once per tick, so it must
/// be cheap. Sources that do blocking I/O should wrap it in
/// `tokio::task::block_in_place`.
pub trait FrameSource {
    /// Returns the next frame, or `None` when nothing is available this
    /// cycle. An empty vector is treated the same as `None`.
    fn next_frame(&mut self) -> Option<Vec<u8>>;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Option<Vec<u8>>,
{
    fn next_frame(&mut self) -> Option<Vec<u8>> {
        self()
    }
}

/// Outcome of one distribution cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleReport {
    /// The source had no frame.
    Skipped,
    Sent {
        frame_id: u32,
        fragments: u16,
        clients: usize,
        /// Clients for which a send failed part-way.
        failed: usize,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DistributorStats {
    pub frames_sent: u64,
    pub frames_skipped: u64,
    /// Cycles aborted by a fragmentation or registry error.
    pub frames_failed: u64,
    pub packets_sent: u64,
    pub send_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    frames_sent: AtomicU64,
    frames_skipped: AtomicU64,
    frames_failed: AtomicU64,
    packets_sent: AtomicU64,
    send_failures: AtomicU64,
}

/// Fragments frames from a [`FrameSource`] and sends them to every
/// registered receiver.
///
/// Owns the frame id counter: each distributed frame takes the next id,
/// starting at 1 and wrapping at `u32::MAX`.
#[derive(Debug)]
pub struct Distributor {
    socket: Arc<UdpSocket>,
    registry: Arc<ClientRegistry>,
    max_payload_size: usize,
    frame_interval: Duration,
    frame_id: AtomicU32,
    counters: Counters,
}

impl Distributor {
    pub fn new(
        socket: Arc<UdpSocket>,
        registry: Arc<ClientRegistry>,
        config: &ServerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            socket,
            registry,
            max_payload_size: config.max_payload_size,
            frame_interval: config.frame_interval,
            frame_id: AtomicU32::new(0),
            counters: Counters::default(),
        })
    }

    fn next_frame_id(&self) -> u32 {
        self.frame_id.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Runs one capture → fragment → fan-out cycle.
    ///
    /// Fragmentation errors abort the cycle. Send errors only affect the
    /// destination they occurred on: the rest of that frame is not sent to
    /// it, every other destination still gets the whole frame.
    pub async fn run_cycle<S>(&self, source: &mut S) -> Result<CycleReport>
    where
        S: FrameSource + ?Sized,
    {
        let frame = match source.next_frame() {
            Some(frame) if !frame.is_empty() => frame,
            _ => {
                trace!("No frame available, skipping cycle");
                self.counters.frames_skipped.fetch_add(1, Ordering::Relaxed);
                return Ok(CycleReport::Skipped);
            }
        };

        let frame_id = self.next_frame_id();
        let fragments = match fragment(&frame, frame_id, self.max_payload_size) {
            Ok(fragments) => fragments,
            Err(e) => {
                self.counters.frames_failed.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        let total = fragments.total_fragments();
        let datagrams: Vec<Vec<u8>> = fragments.map(|packet| packet.encode()).collect();

        let clients = match self.registry.snapshot() {
            Ok(clients) => clients,
            Err(e) => {
                self.counters.frames_failed.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        debug!(
            "Frame {}: {} bytes, {} fragments, {} clients",
            frame_id,
            frame.len(),
            total,
            clients.len()
        );

        let mut failed = 0;
        for addr in &clients {
            if let Err(e) = self.send_frame(&datagrams, *addr).await {
                warn!("{}", e);
                self.counters.send_failures.fetch_add(1, Ordering::Relaxed);
                failed += 1;
            }
        }

        self.counters.frames_sent.fetch_add(1, Ordering::Relaxed);
        Ok(CycleReport::Sent {
            frame_id,
            fragments: total,
            clients: clients.len(),
            failed,
        })
    }

    async fn send_frame(&self, datagrams: &[Vec<u8>], addr: std::net::SocketAddr) -> Result<()> {
        for datagram in datagrams {
            self.socket
                .send_to(datagram, addr)
                .await
                .map_err(|source| Error::SendFailure { addr, source })?;
            self.counters.packets_sent.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Runs cycles at the configured frame interval until `cancel` fires.
    ///
    /// Cycle errors are logged; the loop itself never stops on them.
    pub async fn run<S>(&self, source: &mut S, cancel: CancellationToken)
    where
        S: FrameSource + ?Sized,
    {
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Distribution loop started: interval={:?}, max payload={} bytes",
            self.frame_interval, self.max_payload_size
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.run_cycle(source).await {
                warn!("Distribution cycle aborted: {}", e);
            }
        }
        info!("Distribution loop stopped");
    }

    /// Id of the most recently distributed frame, 0 before the first one.
    pub fn last_frame_id(&self) -> u32 {
        self.frame_id.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> DistributorStats {
        DistributorStats {
            frames_sent: self.counters.frames_sent.load(Ordering::Relaxed),
            frames_skipped: self.counters.frames_skipped.load(Ordering::Relaxed),
            frames_failed: self.counters.frames_failed.load(Ordering::Relaxed),
            packets_sent: self.counters.packets_sent.load(Ordering::Relaxed),
            send_failures: self.counters.send_failures.load(Ordering::Relaxed),
        }
    }
}
