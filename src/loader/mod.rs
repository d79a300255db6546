pub mod fs;
pub mod http;

pub use fs::FsLoader;
pub use http::HttpLoader;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Notify;

/// Fetches the raw bytes for a resource key. Implementations may suspend;
/// the cache treats any error uniformly as a failed load.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>>;
}

/// Loader over a fixed in-memory key/payload map, for demo data and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    entries: HashMap<String, Vec<u8>>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(key.into(), bytes.into());
        self
    }
}

#[async_trait]
impl ResourceLoader for StaticLoader {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no entry for key '{}'", key))
    }
}

// Mock loader for testing
pub struct MockLoader {
    payload: Vec<u8>,
    fail: AtomicBool,
    gate: Option<Arc<Notify>>,
    fetches: AtomicUsize,
}

impl MockLoader {
    pub fn new() -> Self {
        Self {
            payload: b"mock payload".to_vec(),
            fail: AtomicBool::new(false),
            gate: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_payload(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.payload = bytes.into();
        self
    }

    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    /// Fetches park until the gate is notified, letting a test observe
    /// in-flight loads.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// How many fetches have been issued against this loader.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for MockLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceLoader for MockLoader {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("mock fetch failed for '{}'", key);
        }
        Ok(self.payload.clone())
    }
}
