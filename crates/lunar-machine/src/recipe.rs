//! Item-processing machines: the electric furnace and the compressor.

use lunar_core::fixed::{Fixed64, Ticks};
use lunar_core::resource::{ResourceBuffer, ResourceContainer, Simulation};
use serde::{Deserialize, Serialize};

use crate::config::MachineEnergyConfig;
use crate::controller::{MachineLogic, MachineProcessController, TickReport};
use crate::inventory::{Inventory, ItemAmount};
use crate::phase::MachineProcessState;
use crate::status::{BlockReason, ConfigFault, MachineStatus, RedstoneMode};

/// Consumes `inputs` and produces `outputs` after `duration` processing
/// ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub inputs: Vec<ItemAmount>,
    pub outputs: Vec<ItemAmount>,
    pub duration: Ticks,
}

impl Recipe {
    pub fn new(inputs: Vec<ItemAmount>, outputs: Vec<ItemAmount>, duration: Ticks) -> Self {
        Self {
            inputs,
            outputs,
            duration,
        }
    }
}

/// A machine that runs the first recipe whose inputs are present.
///
/// The selected operation is the recipe's index in `recipes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeMachine {
    pub recipes: Vec<Recipe>,
    pub inventory: Inventory,
    pub energy: ResourceBuffer,
    pub energy_per_tick: u64,
    pub redstone_powered: bool,
    state: MachineProcessState<usize>,
}

impl RecipeMachine {
    pub fn new(
        recipes: Vec<Recipe>,
        inventory: Inventory,
        energy: ResourceBuffer,
        energy_per_tick: u64,
    ) -> Self {
        Self {
            recipes,
            inventory,
            energy,
            energy_per_tick,
            redstone_powered: false,
            state: MachineProcessState::default(),
        }
    }

    /// One input slot, one output slot.
    pub fn electric_furnace(recipes: Vec<Recipe>, config: &MachineEnergyConfig) -> Self {
        Self::new(
            recipes,
            Inventory::new(1, 1, 64),
            ResourceBuffer::energy(config.storage_size),
            config.electric_furnace_per_tick,
        )
    }

    /// A 3x3 crafting grid feeding one output slot.
    pub fn electric_compressor(recipes: Vec<Recipe>, config: &MachineEnergyConfig) -> Self {
        Self::new(
            recipes,
            Inventory::new(9, 1, 64),
            ResourceBuffer::energy(config.storage_size),
            config.electric_compressor_per_tick,
        )
    }

    pub fn tick(&mut self) -> TickReport {
        let mut state = std::mem::take(&mut self.state);
        let report = MachineProcessController::tick(&mut state, self);
        self.state = state;
        report
    }

    pub fn state(&self) -> &MachineProcessState<usize> {
        &self.state
    }

    pub fn status(&self) -> MachineStatus {
        self.state.status
    }

    pub fn progress(&self) -> Fixed64 {
        self.state.progress()
    }

    /// The recipe currently in flight.
    pub fn active_recipe(&self) -> Option<&Recipe> {
        self.state.operation.and_then(|i| self.recipes.get(i))
    }

    pub fn set_redstone_mode(&mut self, mode: RedstoneMode) {
        self.state.redstone = mode;
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }
}

impl MachineLogic for RecipeMachine {
    type Operation = usize;

    fn validate(&self) -> Result<(), ConfigFault> {
        if self.recipes.is_empty() {
            return Err(ConfigFault::NoRecipes);
        }
        for (recipe, r) in self.recipes.iter().enumerate() {
            if r.duration == 0 {
                return Err(ConfigFault::ZeroDuration { recipe });
            }
            if r.outputs.is_empty() {
                return Err(ConfigFault::NoOutputs { recipe });
            }
        }
        Ok(())
    }

    fn redstone_powered(&self) -> bool {
        self.redstone_powered
    }

    fn check_preconditions(&mut self) -> Option<BlockReason> {
        let per_tick = self.energy_per_tick;
        (!self.energy.can_extract(per_tick)).then_some(BlockReason::NotEnoughEnergy)
    }

    fn find_operation(&mut self) -> Option<usize> {
        self.recipes
            .iter()
            .position(|r| self.inventory.has_inputs(&r.inputs))
    }

    fn cost(&self, _op: &usize) -> u64 {
        self.energy_per_tick
    }

    fn duration(&self, op: &usize) -> Ticks {
        self.recipes.get(*op).map_or(1, |r| r.duration)
    }

    fn gather(&mut self, op: &usize) -> Result<(), BlockReason> {
        let Some(recipe) = self.recipes.get(*op) else {
            return Err(BlockReason::NotEnoughResources);
        };
        if self.inventory.take_inputs(&recipe.inputs) {
            Ok(())
        } else {
            Err(BlockReason::NotEnoughResources)
        }
    }

    fn draw(&mut self, cost: u64) -> bool {
        if self.energy.extract(cost, Simulation::Simulate) != cost {
            return false;
        }
        let drawn = self.energy.extract(cost, Simulation::Act);
        debug_assert_eq!(drawn, cost);
        true
    }

    fn can_emit(&mut self, op: &usize) -> bool {
        self.recipes
            .get(*op)
            .is_some_and(|r| self.inventory.fits_outputs(&r.outputs))
    }

    fn emit(&mut self, op: &usize) {
        if let Some(recipe) = self.recipes.get(*op) {
            let stored = self.inventory.store_outputs(&recipe.outputs);
            debug_assert!(stored, "emit called without room for outputs");
        }
    }
}
