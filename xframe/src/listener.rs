//! Server-side registration listener.

use std::sync::Arc;

use log::{error, info, trace, warn};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::REGISTER_SIGNAL;
use crate::registry::ClientRegistry;

/// Exact match against the registration datagram.
pub fn is_registration(datagram: &[u8]) -> bool {
    datagram == REGISTER_SIGNAL
}

/// Receives on `socket` until `cancel` fires, registering every sender
/// whose datagram is exactly [`REGISTER_SIGNAL`].
///
/// Read errors are logged and the loop continues. On Linux an ICMP port
/// unreachable from a departed receiver surfaces here as a read error.
pub async fn run_registration_listener(
    socket: Arc<UdpSocket>,
    registry: Arc<ClientRegistry>,
    cancel: CancellationToken,
) {
    // Anything longer than the signal is not a registration anyway.
    let mut buf = [0u8; 1024];

    info!("Registration listener started");
    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => break,
            received = socket.recv_from(&mut buf) => received,
        };

        match received {
            Ok((n, peer)) if is_registration(&buf[..n]) => {
                if let Err(e) = registry.register(peer) {
                    error!("Failed to register {}: {}", peer, e);
                }
            }
            Ok((n, peer)) => {
                trace!("Ignoring {} byte datagram from {}", n, peer);
            }
            Err(e) => {
                warn!("Read error: {}", e);
            }
        }
    }
    info!("Registration listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_is_registration() {
        assert!(is_registration(b"register"));
        assert!(!is_registration(b"register\n"));
        assert!(!is_registration(b"registe"));
        assert!(!is_registration(b"REGISTER"));
        assert!(!is_registration(b""));
    }

    async fn wait_for(registry: &ClientRegistry, count: usize) {
        for _ in 0..100 {
            if registry.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_registers_exact_signal_only() {
        let server = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let server_addr = server.local_addr().unwrap();
        let registry = Arc::new(ClientRegistry::new());
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_registration_listener(
            Arc::clone(&server),
            Arc::clone(&registry),
            cancel.clone(),
        ));

        let noisy = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        noisy.send_to(b"hello", server_addr).await.unwrap();

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(REGISTER_SIGNAL, server_addr).await.unwrap();
        client.send_to(REGISTER_SIGNAL, server_addr).await.unwrap();

        wait_for(&registry, 1).await;
        // Give the duplicate and the noise time to be processed too.
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&client.local_addr().unwrap()));
        assert!(!registry.contains(&noisy.local_addr().unwrap()));

        cancel.cancel();
        task.await.unwrap();
    }
}
