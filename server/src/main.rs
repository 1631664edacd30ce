mod source;
mod stream_server;

use std::net::SocketAddr;
use std::path::PathBuf;

use log::{error, info};
use tokio_util::sync::CancellationToken;
use xframe::{FrameSource, ServerConfig};

use crate::source::{FileSource, PatternSource};
use crate::stream_server::StreamServer;

const PATTERN_FRAME_SIZE: usize = 48 * 1024; // roughly one 640x480 JPEG

/// Usage: server [BIND_ADDR] [FRAME_FILE]
///
/// Without FRAME_FILE, synthetic frames are streamed.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let mut config = ServerConfig::default();
    if let Some(addr) = args.next() {
        config = config.with_bind_addr(addr.parse::<SocketAddr>()?);
    }

    let mut source: Box<dyn FrameSource + Send> = match args.next() {
        Some(path) => {
            info!("Streaming frames from {}", path);
            Box::new(FileSource::new(PathBuf::from(path)))
        }
        None => {
            info!("Streaming synthetic {} KB frames", PATTERN_FRAME_SIZE / 1024);
            Box::new(PatternSource::new(PATTERN_FRAME_SIZE))
        }
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            info!("Shutting down...");
            cancel.cancel();
        });
    }

    StreamServer::new(config).run(source.as_mut(), cancel).await?;
    Ok(())
}
