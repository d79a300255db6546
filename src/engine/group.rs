use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, error};

use super::pause::PauseGate;
use crate::types::ExecutionMode;
use crate::units::InitUnit;

/// The two ordered steps a unit performs during startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreInit,
    Init,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::PreInit => write!(f, "pre-init"),
            Phase::Init => write!(f, "init"),
        }
    }
}

/// A named set of units driven through both phases under one execution mode.
/// Members stay sorted by `order`; ties keep registration order.
pub struct ExecutionGroup {
    name: String,
    mode: ExecutionMode,
    members: Vec<Arc<dyn InitUnit>>,
}

impl ExecutionGroup {
    pub fn new(name: impl Into<String>, mode: ExecutionMode) -> Self {
        Self {
            name: name.into(),
            mode,
            members: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn members(&self) -> &[Arc<dyn InitUnit>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Adds a unit unless the same instance is already present.
    pub fn add(&mut self, unit: Arc<dyn InitUnit>) {
        if self.contains(&unit) {
            return;
        }
        self.members.push(unit);
        self.refresh();
    }

    /// Removes a unit by instance identity.
    pub fn remove(&mut self, unit: &Arc<dyn InitUnit>) -> bool {
        let before = self.members.len();
        self.members.retain(|member| !Arc::ptr_eq(member, unit));
        before != self.members.len()
    }

    pub fn contains(&self, unit: &Arc<dyn InitUnit>) -> bool {
        self.members.iter().any(|member| Arc::ptr_eq(member, unit))
    }

    /// Drops members whose backing object is gone; returns how many went.
    pub fn prune_dead(&mut self) -> usize {
        let before = self.members.len();
        self.members.retain(|member| member.is_alive());
        before - self.members.len()
    }

    fn refresh(&mut self) {
        // Stable sort keeps registration order for equal ranks.
        self.members.sort_by_key(|member| member.order());
    }

    /// Runs the pre-phase subset, then the main phase for every member.
    /// The pre-phase set finishes entirely before the main phase starts.
    pub async fn run(&self, pause: &PauseGate) {
        if self.members.is_empty() {
            return;
        }
        debug!("[{}] group starting ({} unit(s))", self.name, self.len());

        let pre: Vec<_> = self
            .members
            .iter()
            .filter(|unit| unit.is_alive() && unit.use_pre_init())
            .cloned()
            .collect();
        if !pre.is_empty() {
            self.run_phase(Phase::PreInit, &pre, pause).await;
        }

        let main: Vec<_> = self
            .members
            .iter()
            .filter(|unit| unit.is_alive())
            .cloned()
            .collect();
        self.run_phase(Phase::Init, &main, pause).await;
    }

    async fn run_phase(&self, phase: Phase, units: &[Arc<dyn InitUnit>], pause: &PauseGate) {
        match self.mode {
            ExecutionMode::Sequential => {
                for unit in units {
                    if !unit.is_alive() {
                        continue;
                    }
                    pause.wait_if_paused().await;
                    run_unit_phase(unit.as_ref(), phase).await;
                    tokio::task::yield_now().await;
                }
            }
            ExecutionMode::Concurrent => {
                pause.wait_if_paused().await;
                // Calls start in member (rank) order; completion order is
                // up to the units. The join waits for every call, failed
                // ones included.
                let calls = units
                    .iter()
                    .filter(|unit| unit.is_alive())
                    .map(|unit| run_unit_phase(unit.as_ref(), phase));
                join_all(calls).await;
            }
        }
    }
}

/// Invokes one phase call, absorbing failure: an error is logged with the
/// unit's identity and the done-flag stays false.
async fn run_unit_phase(unit: &dyn InitUnit, phase: Phase) {
    debug!("[{}] {} start", unit.name(), phase);
    let outcome = match phase {
        Phase::PreInit => unit.pre_init().await,
        Phase::Init => unit.init().await,
    };
    match outcome {
        Ok(()) => {
            match phase {
                Phase::PreInit => unit.flags().mark_pre_init_done(),
                Phase::Init => unit.flags().mark_init_done(),
            }
            debug!("[{}] {} done", unit.name(), phase);
        }
        Err(err) => {
            error!("[{}] {} failed: {:#}", unit.name(), phase, err);
        }
    }
}
