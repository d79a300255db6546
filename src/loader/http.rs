use anyhow::{Context, Result};
use async_trait::async_trait;

use super::ResourceLoader;

/// Loader that fetches resources over HTTP, with the resource key appended
/// to a base URL.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLoader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ResourceLoader for HttpLoader {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let url = self.url_for(key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        if !response.status().is_success() {
            anyhow::bail!("fetch for '{}' returned {}", key, response.status());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read body for '{}'", key))?;
        Ok(bytes.to_vec())
    }
}
