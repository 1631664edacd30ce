use std::sync::Arc;

use log::*;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use xframe::{ClientRegistry, Distributor, FrameSource, Result, ServerConfig, run_registration_listener};

/// Binds the server socket and drives the registration listener and the
/// distribution loop until cancelled.
pub struct StreamServer {
    config: ServerConfig,
}

impl StreamServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Fails only if the socket cannot be bound or the config is invalid.
    pub async fn run<S>(&self, source: &mut S, cancel: CancellationToken) -> Result<()>
    where
        S: FrameSource + Send + ?Sized,
    {
        self.config.validate()?;

        let socket = Arc::new(UdpSocket::bind(self.config.bind_addr).await?);
        info!("Server started on {}", socket.local_addr()?);

        let registry = Arc::new(ClientRegistry::new());
        let distributor = Distributor::new(Arc::clone(&socket), Arc::clone(&registry), &self.config)?;

        let listener = tokio::spawn(run_registration_listener(
            Arc::clone(&socket),
            Arc::clone(&registry),
            cancel.clone(),
        ));

        distributor.run(source, cancel.clone()).await;

        // The distribution loop only returns once cancelled.
        if let Err(e) = listener.await {
            error!("Registration listener failed: {}", e);
        }

        let stats = distributor.stats();
        info!(
            "=== Server Stopped === frames sent: {}, skipped: {}, packets: {}, send failures: {}, clients: {}",
            stats.frames_sent,
            stats.frames_skipped,
            stats.packets_sent,
            stats.send_failures,
            registry.len()
        );
        Ok(())
    }
}
