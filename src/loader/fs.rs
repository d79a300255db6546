use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::ResourceLoader;

/// Loader that reads resources from files under a root directory, with the
/// resource key as the relative path.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ResourceLoader for FsLoader {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let relative = Path::new(key);
        if relative.is_absolute()
            || relative
                .components()
                .any(|part| matches!(part, Component::ParentDir))
        {
            anyhow::bail!("resource key '{}' escapes the loader root", key);
        }

        let path = self.root.join(relative);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read resource {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_reads_relative_keys() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("ui")).await.unwrap();
        tokio::fs::write(dir.path().join("ui/panel.bin"), b"pixels")
            .await
            .unwrap();

        let loader = FsLoader::new(dir.path());
        let bytes = loader.fetch("ui/panel.bin").await.unwrap();
        assert_eq!(bytes, b"pixels");
    }

    #[tokio::test]
    async fn test_fetch_fails_for_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FsLoader::new(dir.path());
        assert!(loader.fetch("nope.bin").await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FsLoader::new(dir.path());
        assert!(loader.fetch("../secrets.bin").await.is_err());
        assert!(loader.fetch("/etc/hosts").await.is_err());
    }
}
