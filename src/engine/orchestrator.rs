use std::sync::Arc;

use log::{debug, info, warn};

use super::group::ExecutionGroup;
use super::pause::PauseGate;
use crate::types::{
    ExecutionMode, GroupSnapshot, GroupSpec, StartupManifest, UnitDecl, UnitSnapshot,
    DEFAULT_GROUP,
};
use crate::units::{InitUnit, UnitFactory};

/// Owns the execution groups and drives every startup run. Groups come from
/// the configured specs plus a trailing sequential default group that
/// absorbs units with no matching group.
pub struct Orchestrator {
    specs: Vec<GroupSpec>,
    groups: Vec<ExecutionGroup>,
    pause: PauseGate,
}

impl Orchestrator {
    /// Groups are materialized lazily on first use, not here.
    pub fn new(specs: Vec<GroupSpec>, pause: PauseGate) -> Self {
        Self {
            specs,
            groups: Vec::new(),
            pause,
        }
    }

    pub fn from_manifest(manifest: &StartupManifest, pause: PauseGate) -> Self {
        Self::new(manifest.groups.clone(), pause)
    }

    fn ensure_groups(&mut self) {
        if self.groups.is_empty() {
            self.materialize_groups();
        }
    }

    fn materialize_groups(&mut self) {
        for spec in &self.specs {
            if self.groups.iter().any(|group| group.name() == spec.name) {
                warn!("[orchestrator] duplicate group '{}' ignored", spec.name);
                continue;
            }
            self.groups
                .push(ExecutionGroup::new(spec.name.as_str(), spec.mode));
        }
        if !self.groups.iter().any(|group| group.name() == DEFAULT_GROUP) {
            self.groups
                .push(ExecutionGroup::new(DEFAULT_GROUP, ExecutionMode::Sequential));
        }
        debug!("[orchestrator] materialized {} group(s)", self.groups.len());
    }

    fn group_mut(&mut self, name: &str) -> &mut ExecutionGroup {
        if let Some(idx) = self.groups.iter().position(|group| group.name() == name) {
            return &mut self.groups[idx];
        }
        if name != DEFAULT_GROUP {
            debug!(
                "[orchestrator] no group named '{}', falling back to '{}'",
                name, DEFAULT_GROUP
            );
            return self.group_mut(DEFAULT_GROUP);
        }
        self.groups
            .push(ExecutionGroup::new(DEFAULT_GROUP, ExecutionMode::Sequential));
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    /// Places a unit into the group it names. Idempotent per instance.
    pub fn register_unit(&mut self, unit: Arc<dyn InitUnit>) {
        self.ensure_groups();
        debug!(
            "[orchestrator] registering unit '{}' (group '{}')",
            unit.name(),
            unit.group_name()
        );
        let group = self.group_mut(unit.group_name());
        group.add(unit);
    }

    pub fn unregister_unit(&mut self, unit: &Arc<dyn InitUnit>) {
        self.ensure_groups();
        let group = self.group_mut(unit.group_name());
        if group.remove(unit) {
            debug!("[orchestrator] unregistered unit '{}'", unit.name());
        }
    }

    /// True when any group holds a unit with this name.
    pub fn is_registered(&self, name: &str) -> bool {
        self.groups
            .iter()
            .any(|group| group.members().iter().any(|unit| unit.name() == name))
    }

    /// Builds and registers units for the given declarations. Already
    /// registered names are skipped; an empty build only costs a warning.
    pub fn spawn(&mut self, decls: &[UnitDecl], factory: &dyn UnitFactory) {
        self.ensure_groups();
        for decl in decls {
            if self.is_registered(&decl.name) {
                debug!(
                    "[orchestrator] unit '{}' already registered, skipping spawn",
                    decl.name
                );
                continue;
            }
            match factory.build(decl) {
                Some(unit) => self.register_unit(unit),
                None => warn!(
                    "[orchestrator] factory produced no backing object for '{}'",
                    decl.name
                ),
            }
        }
        self.prune_dead();
    }

    pub fn prune_dead(&mut self) -> usize {
        let removed: usize = self
            .groups
            .iter_mut()
            .map(|group| group.prune_dead())
            .sum();
        if removed > 0 {
            warn!("[orchestrator] dropped {} dead unit(s)", removed);
        }
        removed
    }

    /// Runs every group in declaration order, each group finishing both
    /// phases before the next begins.
    pub async fn run_all(&mut self) {
        self.ensure_groups();
        self.prune_dead();
        info!("[orchestrator] running {} group(s)", self.groups.len());
        for group in &self.groups {
            debug!("[orchestrator] entering group '{}'", group.name());
            group.run(&self.pause).await;
            tokio::task::yield_now().await;
        }
        info!("[orchestrator] startup run complete");
    }

    /// Read-only view of every group and its members in run order.
    pub fn units_by_group(&self) -> Vec<GroupSnapshot> {
        self.groups
            .iter()
            .map(|group| GroupSnapshot {
                name: group.name().to_string(),
                mode: group.mode(),
                units: group
                    .members()
                    .iter()
                    .map(|unit| UnitSnapshot {
                        name: unit.name().to_string(),
                        order: unit.order(),
                        use_pre_init: unit.use_pre_init(),
                        pre_init_done: unit.flags().pre_init_done(),
                        init_done: unit.flags().init_done(),
                        alive: unit.is_alive(),
                    })
                    .collect(),
            })
            .collect()
    }
}
