use crate::cache::InventoryCache;
use crate::error::FetchError;
use crate::inventory::{InventoryItem, InventorySnapshot, OwnerId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

type FetchResult = Result<InventorySnapshot, FetchError>;

enum Role {
    Leader(broadcast::Sender<FetchResult>),
    Waiter(broadcast::Receiver<FetchResult>),
}

/// Deduplicates concurrent fetches per owner.
///
/// The first caller for an owner becomes the leader: it runs the upstream
/// fetch, publishes a successful result to the cache, and fans the outcome
/// out to everyone who joined in the meantime. Joiners never touch the
/// upstream API. The in-flight marker is dropped the instant the fetch
/// resolves, so a later request starts a fresh fetch.
pub struct FetchCoordinator {
    cache: Arc<InventoryCache>,
    in_flight: Mutex<HashMap<OwnerId, broadcast::Sender<FetchResult>>>,
}

impl FetchCoordinator {
    pub fn new(cache: Arc<InventoryCache>) -> Self {
        Self {
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn fetch_or_join<F, Fut>(&self, owner: OwnerId, fetch: F) -> FetchResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<InventoryItem>, FetchError>>,
    {
        // The table lock is only ever held for the register/consult step,
        // never across the upstream call.
        let role = {
            let mut in_flight = self.in_flight.lock().unwrap();
            match in_flight.get(&owner) {
                Some(tx) => Role::Waiter(tx.subscribe()),
                None => {
                    let (tx, _) = broadcast::channel(1);
                    in_flight.insert(owner.clone(), tx.clone());
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Waiter(mut rx) => rx
                .recv()
                .await
                .unwrap_or_else(|_| Err(FetchError::Interrupted)),
            Role::Leader(tx) => {
                let result = match fetch().await {
                    Ok(items) => Ok(self.cache.put(owner.clone(), items)),
                    Err(e) => Err(e),
                };

                // Remove the marker and release the waiters under the lock,
                // so every caller either joined this fetch or starts the next.
                let mut in_flight = self.in_flight.lock().unwrap();
                in_flight.remove(&owner);
                let _ = tx.send(result.clone());

                result
            }
        }
    }
}
