use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::types::ResourceData;

/// Completion state of one load. A handle moves Pending → Succeeded | Failed
/// exactly once and never reverts.
#[derive(Debug, Clone)]
pub enum LoadState {
    Pending,
    Succeeded(Arc<ResourceData>),
    Failed(String),
}

impl LoadState {
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Pending)
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, LoadState::Succeeded(_))
    }
}

/// One in-flight-or-completed load: the key, the eventual shared result, and
/// the owner tags currently holding a claim. State lives in a watch channel
/// so waiting is scoped to this handle alone, never the whole table.
#[derive(Debug)]
pub struct ResourceHandle {
    key: String,
    state: watch::Sender<LoadState>,
    owners: Mutex<HashSet<String>>,
}

impl ResourceHandle {
    pub fn pending(key: impl Into<String>) -> Self {
        let (state, _) = watch::channel(LoadState::Pending);
        Self {
            key: key.into(),
            state,
            owners: Mutex::new(HashSet::new()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// Resolves the handle. The first outcome sticks; later calls and
    /// attempts to resolve back to Pending are ignored.
    pub fn resolve(&self, outcome: LoadState) {
        self.state.send_if_modified(|state| {
            if state.is_pending() && !outcome.is_pending() {
                *state = outcome;
                true
            } else {
                false
            }
        });
    }

    /// Suspends until the handle leaves Pending, then returns the final
    /// state. Returns immediately when already resolved.
    pub async fn resolved(&self) -> LoadState {
        let mut rx = self.state.subscribe();
        let state = match rx.wait_for(|state| !state.is_pending()).await {
            Ok(state) => (*state).clone(),
            // The sender lives on this handle, so the channel cannot close
            // while anyone holds it; treat it as a failed load anyway.
            Err(_) => LoadState::Failed("state channel closed".to_string()),
        };
        state
    }

    /// Records an owner tag. Blank tags are ignored and duplicates collapse.
    pub fn add_owner(&self, tag: &str) {
        if tag.trim().is_empty() {
            return;
        }
        self.owners.lock().unwrap().insert(tag.to_string());
    }

    /// Removes an owner tag, reporting whether it was present.
    pub fn remove_owner(&self, tag: &str) -> bool {
        self.owners.lock().unwrap().remove(tag)
    }

    pub fn has_owner(&self, tag: &str) -> bool {
        self.owners.lock().unwrap().contains(tag)
    }

    pub fn owner_count(&self) -> usize {
        self.owners.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn succeeded(key: &str) -> LoadState {
        LoadState::Succeeded(Arc::new(ResourceData::new(key, vec![1])))
    }

    #[test]
    fn test_first_resolution_sticks() {
        let handle = ResourceHandle::pending("k");
        assert!(handle.state().is_pending());

        handle.resolve(succeeded("k"));
        assert!(handle.state().is_succeeded());

        handle.resolve(LoadState::Failed("late".to_string()));
        assert!(handle.state().is_succeeded());

        handle.resolve(LoadState::Pending);
        assert!(handle.state().is_succeeded());
    }

    #[test]
    fn test_owner_set_ignores_blank_and_duplicate_tags() {
        let handle = ResourceHandle::pending("k");
        handle.add_owner("audio");
        handle.add_owner("audio");
        handle.add_owner("");
        handle.add_owner("   ");
        assert_eq!(handle.owner_count(), 1);
        assert!(handle.has_owner("audio"));

        assert!(handle.remove_owner("audio"));
        assert!(!handle.remove_owner("audio"));
        assert_eq!(handle.owner_count(), 0);
    }

    #[tokio::test]
    async fn test_resolved_wakes_waiters() {
        let handle = Arc::new(ResourceHandle::pending("k"));

        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.resolved().await })
        };
        tokio::task::yield_now().await;

        handle.resolve(succeeded("k"));
        let state = waiter.await.unwrap();
        assert!(state.is_succeeded());
    }

    #[tokio::test]
    async fn test_resolved_returns_immediately_when_done() {
        let handle = ResourceHandle::pending("k");
        handle.resolve(LoadState::Failed("no transport".to_string()));
        match handle.resolved().await {
            LoadState::Failed(reason) => assert!(reason.contains("no transport")),
            other => panic!("expected failed state, got {:?}", other),
        }
    }
}
