pub mod handle;

pub use handle::{LoadState, ResourceHandle};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{debug, error, info, warn};

use crate::loader::ResourceLoader;
use crate::types::{CacheError, ResourceData};

/// Table of resource handles keyed by resource key. At most one underlying
/// fetch per key; concurrent requesters share the same handle and result.
pub struct ResourceCache {
    loader: Arc<dyn ResourceLoader>,
    table: Mutex<HashMap<String, Arc<ResourceHandle>>>,
}

impl ResourceCache {
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            loader,
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Loads `key`, deduplicating against any load already in flight.
    /// Failures are absorbed: the caller gets `None` and one log entry.
    pub async fn load(&self, key: &str) -> Option<Arc<ResourceData>> {
        self.load_inner(key, None).await.ok()
    }

    /// Like `load`, but records `owner` on the handle once the load succeeds.
    pub async fn load_owned(&self, key: &str, owner: &str) -> Option<Arc<ResourceData>> {
        self.load_inner(key, Some(owner)).await.ok()
    }

    async fn load_inner(
        &self,
        key: &str,
        owner: Option<&str>,
    ) -> Result<Arc<ResourceData>, CacheError> {
        if key.trim().is_empty() {
            let err = CacheError::InvalidKey(key.to_string());
            error!("[cache] {}", err);
            return Err(err);
        }

        // Atomic check-or-insert. The lock is never held across an await;
        // whoever inserts the handle runs the one underlying fetch.
        let (handle, leads) = {
            let mut table = self.table.lock().unwrap();
            match table.get(key) {
                Some(handle) => (handle.clone(), false),
                None => {
                    let handle = Arc::new(ResourceHandle::pending(key));
                    table.insert(key.to_string(), handle.clone());
                    (handle, true)
                }
            }
        };

        if leads {
            self.run_fetch(&handle).await;
        }

        match handle.resolved().await {
            LoadState::Succeeded(data) => {
                if let Some(tag) = owner {
                    handle.add_owner(tag);
                }
                Ok(data)
            }
            LoadState::Failed(reason) => Err(CacheError::LoadFailure {
                key: key.to_string(),
                reason,
            }),
            // resolved() never yields Pending.
            LoadState::Pending => Err(CacheError::LoadFailure {
                key: key.to_string(),
                reason: "load did not resolve".to_string(),
            }),
        }
    }

    // On failure the handle leaves the table so a later load retries.
    async fn run_fetch(&self, handle: &Arc<ResourceHandle>) {
        match self.loader.fetch(handle.key()).await {
            Ok(bytes) => {
                let data = Arc::new(ResourceData::new(handle.key(), bytes));
                debug!("[cache] loaded '{}' ({} bytes)", handle.key(), data.len());
                handle.resolve(LoadState::Succeeded(data));
            }
            Err(err) => {
                let failure = CacheError::LoadFailure {
                    key: handle.key().to_string(),
                    reason: format!("{:#}", err),
                };
                error!("[cache] {}", failure);
                handle.resolve(LoadState::Failed(format!("{:#}", err)));
                self.remove_if_current(handle.key(), handle);
            }
        }
    }

    /// Non-suspending lookup; `None` unless the load already succeeded.
    pub fn try_get(&self, key: &str) -> Option<Arc<ResourceData>> {
        match self.handle_for(key).map(|handle| handle.state()) {
            Some(LoadState::Succeeded(data)) => Some(data),
            _ => {
                warn!("[cache] resource '{}' isn't loaded yet", key);
                None
            }
        }
    }

    /// Administrative release: drops the handle regardless of owners.
    pub fn release(&self, key: &str) {
        let removed = self.table.lock().unwrap().remove(key);
        match removed {
            Some(_) => info!("[cache] released '{}'", key),
            None => debug!("[cache] release for unknown key '{}'", key),
        }
    }

    /// Removes `owner` from every handle referencing it; handles left with
    /// no owners are dropped from the table.
    pub fn release_by_owner(&self, owner: &str) {
        let mut table = self.table.lock().unwrap();
        table.retain(|key, handle| {
            if !handle.remove_owner(owner) {
                return true;
            }
            if handle.owner_count() > 0 {
                return true;
            }
            info!("[cache] released '{}' (no owners remain)", key);
            false
        });
    }

    /// Keys whose loads have succeeded, sorted.
    pub fn loaded_keys(&self) -> Vec<String> {
        let table = self.table.lock().unwrap();
        let mut keys: Vec<String> = table
            .iter()
            .filter(|(_, handle)| handle.state().is_succeeded())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.table.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handle_for(&self, key: &str) -> Option<Arc<ResourceHandle>> {
        self.table.lock().unwrap().get(key).cloned()
    }

    // Only removes `key` while it still maps to `handle`; a failed fetch
    // must not evict a fresh handle inserted after an administrative release.
    fn remove_if_current(&self, key: &str, handle: &Arc<ResourceHandle>) {
        let mut table = self.table.lock().unwrap();
        if let Some(current) = table.get(key) {
            if Arc::ptr_eq(current, handle) {
                table.remove(key);
            }
        }
    }
}
