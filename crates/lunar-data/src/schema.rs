//! On-disk configuration format.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. An empty file is a valid config.

use serde::{Deserialize, Serialize};

// ===========================================================================
// ConfigData
// ===========================================================================

/// Tunables read from `lunar.ron`, `lunar.toml` or `lunar.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigData {
    // Conduits
    pub wire_transfer_limit: u64,
    pub heavy_wire_transfer_limit: u64,
    pub pipe_transfer_limit: u64,

    // Machines
    pub machine_energy_storage_size: u64,
    pub electric_furnace_energy_consumption_rate: u64,
    pub electric_compressor_energy_consumption_rate: u64,
    pub oxygen_sealer_energy_consumption_rate: u64,

    // Sealing
    pub oxygen_tank_capacity: u64,
    /// Ticks between seal checks.
    pub seal_check_interval: u64,
    /// Largest enclosed area a sealer can hold, in cells.
    pub sealing_power: usize,
    pub oxygen_per_block: u64,
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            wire_transfer_limit: 240,
            heavy_wire_transfer_limit: 480,
            pipe_transfer_limit: 1_000,
            machine_energy_storage_size: 15_000,
            electric_furnace_energy_consumption_rate: 15,
            electric_compressor_energy_consumption_rate: 75,
            oxygen_sealer_energy_consumption_rate: 25,
            oxygen_tank_capacity: 50_000,
            seal_check_interval: 20,
            sealing_power: 1_024,
            oxygen_per_block: 1,
        }
    }
}
