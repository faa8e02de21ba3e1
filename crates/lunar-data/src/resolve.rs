//! Turns [`ConfigData`] into the typed configs each crate consumes.

use lunar_core::conduit::NodeCapability;
use lunar_core::id::FluidId;
use lunar_machine::{MachineEnergyConfig, SealerConfig};
use lunar_sealing::SealedAreaSolver;
use serde::{Deserialize, Serialize};

use crate::loader::DataLoadError;
use crate::schema::ConfigData;

/// Transfer limits for each conduit tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub wire_transfer_limit: u64,
    pub heavy_wire_transfer_limit: u64,
    pub pipe_transfer_limit: u64,
}

impl NetworkConfig {
    pub fn wire(&self) -> NodeCapability {
        NodeCapability::wire(self.wire_transfer_limit)
    }

    pub fn heavy_wire(&self) -> NodeCapability {
        NodeCapability::wire(self.heavy_wire_transfer_limit)
    }

    /// A pipe segment, optionally dedicated to one fluid channel.
    pub fn pipe(&self, channel: Option<u8>) -> NodeCapability {
        NodeCapability::pipe(self.pipe_transfer_limit, channel)
    }
}

/// Everything a host needs to build networks, machines and sealers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub network: NetworkConfig,
    pub machines: MachineEnergyConfig,
    pub sealer: SealerConfig,
    pub solver: SealedAreaSolver,
}

impl ResolvedConfig {
    pub fn resolve(data: &ConfigData) -> Result<Self, DataLoadError> {
        positive("wire_transfer_limit", data.wire_transfer_limit)?;
        positive("heavy_wire_transfer_limit", data.heavy_wire_transfer_limit)?;
        positive("pipe_transfer_limit", data.pipe_transfer_limit)?;
        positive("seal_check_interval", data.seal_check_interval)?;
        positive("sealing_power", data.sealing_power as u64)?;
        if data.wire_transfer_limit == data.heavy_wire_transfer_limit {
            // Wire tiers are told apart by their limit.
            return Err(DataLoadError::InvalidValue {
                field: "heavy_wire_transfer_limit",
                reason: "must differ from wire_transfer_limit".to_string(),
            });
        }

        let machines = MachineEnergyConfig {
            storage_size: data.machine_energy_storage_size,
            electric_furnace_per_tick: data.electric_furnace_energy_consumption_rate,
            electric_compressor_per_tick: data.electric_compressor_energy_consumption_rate,
            oxygen_sealer_per_tick: data.oxygen_sealer_energy_consumption_rate,
        };
        Ok(Self {
            network: NetworkConfig {
                wire_transfer_limit: data.wire_transfer_limit,
                heavy_wire_transfer_limit: data.heavy_wire_transfer_limit,
                pipe_transfer_limit: data.pipe_transfer_limit,
            },
            machines,
            sealer: SealerConfig {
                energy_per_tick: data.oxygen_sealer_energy_consumption_rate,
                oxygen_per_block: data.oxygen_per_block,
                seal_check_interval: data.seal_check_interval,
                tank_capacity: data.oxygen_tank_capacity,
                energy_capacity: data.machine_energy_storage_size,
                oxygen: FluidId(0),
            },
            solver: SealedAreaSolver::new(data.sealing_power),
        })
    }
}

fn positive(field: &'static str, value: u64) -> Result<(), DataLoadError> {
    if value == 0 {
        return Err(DataLoadError::InvalidValue {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}
