use serde::{Deserialize, Serialize};

/// Energy storage and per-tick draw for the stock machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineEnergyConfig {
    /// Capacity of every machine's internal energy buffer.
    pub storage_size: u64,
    pub electric_furnace_per_tick: u64,
    pub electric_compressor_per_tick: u64,
    pub oxygen_sealer_per_tick: u64,
}

impl Default for MachineEnergyConfig {
    fn default() -> Self {
        Self {
            storage_size: 15_000,
            electric_furnace_per_tick: 15,
            electric_compressor_per_tick: 75,
            oxygen_sealer_per_tick: 25,
        }
    }
}
