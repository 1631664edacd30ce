//! Receiver endpoints known to the server.
//!
//! Entries are keyed by the canonical string form of the address and live
//! until the process exits; there is no unregistration.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard};

use log::info;

use crate::error::{Error, Result};

/// Mutex-guarded set of registered receivers.
///
/// Shared by `Arc` between the registration listener and the distributor.
/// The lock is held only for the map access itself.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<String, SocketAddr>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, SocketAddr>>> {
        self.clients.lock().map_err(|_| Error::RegistryUnavailable)
    }

    /// Adds `addr` if it is not already known.
    ///
    /// Returns true when the address was new.
    pub fn register(&self, addr: SocketAddr) -> Result<bool> {
        let key = addr.to_string();
        let mut clients = self.lock()?;
        if clients.contains_key(&key) {
            return Ok(false);
        }
        clients.insert(key, addr);
        let total = clients.len();
        drop(clients);

        info!("New client registered: {} ({} total)", addr, total);
        Ok(true)
    }

    /// Copies the current membership out from under the lock.
    pub fn snapshot(&self) -> Result<Vec<SocketAddr>> {
        Ok(self.lock()?.values().copied().collect())
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.lock()
            .map(|clients| clients.contains_key(&addr.to_string()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|clients| clients.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn poison(&self) {
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = self.clients.lock();
                    panic!("poison the registry");
                })
                .join();
        });
    }
}
