pub mod cache;
pub mod config;
pub mod engine;
pub mod loader;
pub mod types;
pub mod units;

pub use cache::ResourceCache;
pub use config::Config;
pub use engine::{Orchestrator, PauseGate};
pub use types::*;
