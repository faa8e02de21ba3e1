//! Configuration loading for the lunar crates.
//!
//! A single `lunar.ron`, `lunar.toml` or `lunar.json` file is read into
//! [`ConfigData`] and resolved into the typed configs the network, sealing
//! and machine crates take.

pub mod loader;
pub mod resolve;
pub mod schema;

pub use loader::{DataLoadError, Format, load_config, load_config_dir};
pub use resolve::{NetworkConfig, ResolvedConfig};
pub use schema::ConfigData;
