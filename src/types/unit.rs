use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How an execution group drives its members through a phase: one at a time
/// in rank order, or all started together and joined together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Concurrent,
}

/// Reserved group that units with an unknown or absent group name fall into.
pub const DEFAULT_GROUP: &str = "default";

/// Declarative description of one execution group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(default)]
    pub mode: ExecutionMode,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>, mode: ExecutionMode) -> Self {
        Self {
            name: name.into(),
            mode,
        }
    }
}

/// One unit declaration, consumed once at spawn time: which backing object
/// to build, where it sits in the startup order, and the resource keys it
/// preloads during its main phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDecl {
    pub name: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub use_pre_init: bool,
    #[serde(default = "default_group_name")]
    pub group: String,
    #[serde(default)]
    pub resources: Vec<String>,
}

fn default_group_name() -> String {
    DEFAULT_GROUP.to_string()
}

impl UnitDecl {
    pub fn new(name: impl Into<String>, order: i32, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order,
            use_pre_init: false,
            group: group.into(),
            resources: Vec::new(),
        }
    }
}

/// The declarative startup input: group layout plus the units to spawn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartupManifest {
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub units: Vec<UnitDecl>,
}

impl StartupManifest {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("failed to parse startup manifest YAML")
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse startup manifest JSON")
    }

    /// Reads a manifest file, picking the format from the extension:
    /// `.json` is JSON, anything else is YAML.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&text),
            _ => Self::from_yaml(&text),
        }
    }
}

/// Read-only view of one registered unit, for status inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub name: String,
    pub order: i32,
    pub use_pre_init: bool,
    pub pre_init_done: bool,
    pub init_done: bool,
    pub alive: bool,
}

/// Read-only view of one execution group and its members, in member order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub name: String,
    pub mode: ExecutionMode,
    pub units: Vec<UnitSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_from_yaml_with_defaults() {
        let manifest = StartupManifest::from_yaml(
            r#"
groups:
  - name: core
  - name: world
    mode: concurrent
units:
  - name: audio
    order: 2
    group: core
  - name: terrain
    group: world
    use_pre_init: true
    resources:
      - world/heightmap
      - world/tiles
  - name: stray
"#,
        )
        .unwrap();

        assert_eq!(manifest.groups.len(), 2);
        assert_eq!(manifest.groups[0].mode, ExecutionMode::Sequential);
        assert_eq!(manifest.groups[1].mode, ExecutionMode::Concurrent);

        let audio = &manifest.units[0];
        assert_eq!(audio.order, 2);
        assert!(!audio.use_pre_init);
        assert!(audio.resources.is_empty());

        let terrain = &manifest.units[1];
        assert!(terrain.use_pre_init);
        assert_eq!(terrain.resources.len(), 2);

        // Units without a group land in the reserved default group.
        assert_eq!(manifest.units[2].group, DEFAULT_GROUP);
        assert_eq!(manifest.units[2].order, 0);
    }

    #[test]
    fn test_manifest_from_json() {
        let manifest = StartupManifest::from_json(
            r#"{"groups":[{"name":"core","mode":"sequential"}],"units":[{"name":"audio","group":"core"}]}"#,
        )
        .unwrap();
        assert_eq!(manifest.groups.len(), 1);
        assert_eq!(manifest.units[0].name, "audio");
    }

    #[test]
    fn test_manifest_rejects_malformed_input() {
        assert!(StartupManifest::from_yaml("units: 3").is_err());
        assert!(StartupManifest::from_json("{").is_err());
    }

    #[tokio::test]
    async fn test_manifest_from_path_selects_format() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("boot.yaml");
        let json = dir.path().join("boot.json");
        tokio::fs::write(&yaml, "units:\n  - name: audio\n")
            .await
            .unwrap();
        tokio::fs::write(&json, r#"{"units":[{"name":"audio"}]}"#)
            .await
            .unwrap();

        let from_yaml = StartupManifest::from_path(&yaml).await.unwrap();
        let from_json = StartupManifest::from_path(&json).await.unwrap();
        assert_eq!(from_yaml.units[0].name, "audio");
        assert_eq!(from_json.units[0].name, "audio");

        assert!(StartupManifest::from_path(dir.path().join("missing.yaml"))
            .await
            .is_err());
    }
}
