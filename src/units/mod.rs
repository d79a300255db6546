pub mod preload;

pub use preload::{PreloadFactory, PreloadUnit};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{UnitDecl, DEFAULT_GROUP};

/// Completion flags for one unit's two phases. Monotonic: each moves
/// false→true once and never resets.
#[derive(Debug, Default)]
pub struct InitFlags {
    pre_init_done: AtomicBool,
    init_done: AtomicBool,
}

impl InitFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pre_init_done(&self) -> bool {
        self.pre_init_done.load(Ordering::SeqCst)
    }

    pub fn init_done(&self) -> bool {
        self.init_done.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_pre_init_done(&self) {
        self.pre_init_done.store(true, Ordering::SeqCst);
    }

    pub(crate) fn mark_init_done(&self) {
        self.init_done.store(true, Ordering::SeqCst);
    }
}

/// A unit of startup work: an optional pre-phase, a required main phase, and
/// the placement metadata the orchestrator uses to slot it into a group.
#[async_trait]
pub trait InitUnit: Send + Sync {
    fn name(&self) -> &str;

    /// Rank inside the group; ties keep registration order.
    fn order(&self) -> i32 {
        0
    }

    fn group_name(&self) -> &str {
        DEFAULT_GROUP
    }

    fn use_pre_init(&self) -> bool {
        false
    }

    /// Units whose backing object is gone report false and are skipped.
    fn is_alive(&self) -> bool {
        true
    }

    fn flags(&self) -> &InitFlags;

    async fn pre_init(&self) -> Result<()> {
        Ok(())
    }

    async fn init(&self) -> Result<()>;
}

/// Builds a concrete unit from one manifest declaration at spawn time.
/// `None` means the declaration has no backing object and is skipped.
pub trait UnitFactory: Send + Sync {
    fn build(&self, decl: &UnitDecl) -> Option<Arc<dyn InitUnit>>;
}
