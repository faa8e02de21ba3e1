//! Sealed-area detection for oxygen sealers.
//!
//! [`SealedAreaSolver`] flood-fills air from a seed cell and classifies the
//! reachable space as sealed, leaking, or too large. [`SealedAreaCache`]
//! keeps one result per `(dimension, seed)` and drops it when a block change
//! lands on or next to a cell the fill depended on.

pub mod cache;
pub mod solver;

pub use cache::SealedAreaCache;
pub use solver::{DEFAULT_MAX_BLOCKS, SealedAreaSolver, SealedRegion, Verdict};
