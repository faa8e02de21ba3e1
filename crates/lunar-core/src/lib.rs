//! Lunar Core -- shared vocabulary for the distribution, sealing and machine
//! crates.
//!
//! Everything here is engine-agnostic: grid positions and face directions,
//! resource kinds and the opaque container contract, the voxel world
//! collaborator, and per-face automation configuration.
//!
//! # Key Types
//!
//! - [`position::Position`] / [`position::Direction`] -- grid cells and the
//!   six face directions.
//! - [`position::Connections`] -- a six-bit face set.
//! - [`resource::ResourceContainer`] -- `amount`/`capacity`/`insert`/`extract`
//!   contract implemented by machine storage.
//! - [`world::World`] -- block lookup implemented by the host world.
//! - [`conduit::NodeCapability`] -- what a wire or pipe segment carries.
//! - [`automation::AutomationType`] -- per-face machine IO configuration.

pub mod automation;
pub mod conduit;
pub mod fixed;
pub mod id;
pub mod position;
pub mod resource;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use position::{Connections, Direction, Position};
