use std::sync::Arc;

use log::info;
use tokio::sync::watch;

/// Process-wide pause flag for startup sequencing. Clones share the same
/// underlying state. Phase executors wait on the gate immediately before
/// invoking a unit, so a pause issued mid-run halts at the next unit boundary.
#[derive(Debug, Clone)]
pub struct PauseGate {
    state: Arc<watch::Sender<bool>>,
}

impl PauseGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Defers every phase call that has not started yet.
    pub fn pause(&self) {
        self.state.send_replace(true);
        info!("[pauser] paused");
    }

    /// Lets deferred phase calls proceed.
    pub fn resume(&self) {
        self.state.send_replace(false);
        info!("[pauser] resumed");
    }

    pub fn is_paused(&self) -> bool {
        *self.state.borrow()
    }

    /// Suspends until the gate is clear.
    pub async fn wait_if_paused(&self) {
        if !self.is_paused() {
            return;
        }
        let mut rx = self.state.subscribe();
        // The sender lives on self, so the channel cannot close while a
        // clone of this gate is waiting.
        let _ = rx.wait_for(|paused| !paused).await;
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_transitions_are_visible_to_clones() {
        let gate = PauseGate::new();
        let observer = gate.clone();
        assert!(!gate.is_paused());

        gate.pause();
        assert!(observer.is_paused());

        gate.resume();
        assert!(!observer.is_paused());
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_clear() {
        let gate = PauseGate::new();
        timeout(Duration::from_millis(100), gate.wait_if_paused())
            .await
            .expect("wait should not block on a clear gate");
    }

    #[tokio::test]
    async fn test_wait_parks_until_resume() {
        let gate = PauseGate::new();
        gate.pause();

        let passed = Arc::new(AtomicBool::new(false));
        let waiter = {
            let gate = gate.clone();
            let passed = passed.clone();
            tokio::spawn(async move {
                gate.wait_if_paused().await;
                passed.store(true, Ordering::SeqCst);
            })
        };

        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert!(!passed.load(Ordering::SeqCst));

        gate.resume();
        timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter timed out")
            .expect("waiter panicked");
        assert!(passed.load(Ordering::SeqCst));
    }
}
