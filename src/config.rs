use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub manifest_path: Option<String>,
    pub asset_root: Option<String>,
    pub http_base: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            manifest_path: std::env::var("GROUNDWORK_MANIFEST").ok(),
            asset_root: std::env::var("GROUNDWORK_ASSET_ROOT").ok(),
            http_base: std::env::var("GROUNDWORK_HTTP_BASE").ok(),
        }
    }
}
