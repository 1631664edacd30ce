mod sink;

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;

use log::{error, info};
use tokio_util::sync::CancellationToken;
use xframe::{DEFAULT_SERVER_PORT, FrameReceiver, ReceiverConfig};

use crate::sink::LogSink;

/// Usage: client [SERVER_ADDR] [OUTPUT_FILE] [FRAME_LIMIT]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let server: SocketAddr = match args.next() {
        Some(addr) => addr.parse()?,
        None => SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_SERVER_PORT)),
    };
    let output = args.next().map(PathBuf::from);
    let mut sink = LogSink::new(output);
    if let Some(limit) = args.next() {
        sink = sink.with_limit(limit.parse()?);
    }

    let receiver = FrameReceiver::bind(&ReceiverConfig::default()).await?;
    info!("Connecting to server at {}...", server);
    receiver.register(server).await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            cancel.cancel();
        });
    }

    let result = receiver.run(&mut sink, cancel).await;

    sink.report();
    let stats = receiver.stats();
    info!(
        "Fragments: {} accepted, {} duplicates, {} corrupt, {} malformed, {} out of range; frames abandoned: {}",
        stats.packets_accepted,
        stats.duplicates,
        stats.checksum_errors,
        stats.malformed,
        stats.out_of_range,
        stats.frames_abandoned
    );

    result?;
    Ok(())
}
