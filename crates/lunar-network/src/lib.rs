//! Distribution networks for wires and pipes.
//!
//! Conduit segments ([`ResourceNode`]) placed on the grid coalesce into
//! networks ([`NetworkState`]) of compatible, face-adjacent segments. The
//! [`ConnectivityGraph`] keeps position -> node -> network mappings
//! consistent as segments are placed and removed, merging networks that
//! become connected and splitting ones that lose a cut vertex. Machines
//! adjacent to segments are registered as [`Endpoint`]s; those whose facing
//! side accepts input receive what is inserted into the network.
//!
//! # Ordering
//!
//! Topology edits for a tick should be queued with
//! [`ConnectivityGraph::queue_edit`] and applied with
//! [`ConnectivityGraph::apply_edits`] before any routing happens.

pub mod error;
pub mod graph;
pub mod network;
pub mod node;
pub mod serialize;

pub use error::{NetworkError, TopologyViolation};
pub use graph::{ConnectivityGraph, EditResult, GridEdit};
pub use network::{NetworkId, NetworkState};
pub use node::{Endpoint, ResourceNode};
pub use serialize::{GraphSnapshot, SnapshotError};
