//! Destination engine: collaborator execution and store driving.
mod collaborators;
mod driver;
mod engine;
mod persist;
mod types;

pub use collaborators::{
    CapabilityProvider, CloudDirectory, Collaborators, DirectoryProbe, DiscoverySource,
    ProvisionalResolver,
};
pub use driver::StoreDriver;
pub use engine::EngineHandle;
pub use persist::{ensure_state_dir, PersistError, StateDir};
pub use types::{CloudSearchBatch, FailureKind, FetchError};
