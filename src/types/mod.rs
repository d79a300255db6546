pub mod resource;
pub mod unit;

pub use resource::{CacheError, ResourceData};
pub use unit::{
    ExecutionMode, GroupSnapshot, GroupSpec, StartupManifest, UnitDecl, UnitSnapshot,
    DEFAULT_GROUP,
};
