pub mod group;
pub mod orchestrator;
pub mod pause;

pub use group::{ExecutionGroup, Phase};
pub use orchestrator::Orchestrator;
pub use pause::PauseGate;
