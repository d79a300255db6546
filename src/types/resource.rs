use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A resolved resource: the raw payload fetched for a key plus load
/// metadata. Every requester of the same key shares one instance behind
/// `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceData {
    pub key: String,
    pub bytes: Vec<u8>,
    pub loaded_at: DateTime<Utc>,
}

impl ResourceData {
    pub fn new(key: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            bytes,
            loaded_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Load failures. These are absorbed at the cache boundary: callers get
/// `None` and the failure reaches the log exactly once.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid resource key {0:?}")]
    InvalidKey(String),

    #[error("load failed for '{key}': {reason}")]
    LoadFailure { key: String, reason: String },
}
