//! # Playground registry.
//!
//! - [`Playground`], [`PlaygroundSource`] - the entity model (tagged sum type)
//! - [`Registry`] - identifier-keyed catalog with persistence
//! - [`PlaygroundStore`] - persistence seam, with [`JsonDirStore`] and [`MemoryStore`]

mod core;
mod playground;
mod store;

pub use core::Registry;
pub use playground::{
    DockerSource, GithubSource, Playground, PlaygroundId, PlaygroundKind, PlaygroundSource,
    PlaygroundStatus, PlaygroundWithStatus,
};
pub use store::{JsonDirStore, MemoryStore, PlaygroundStore};
