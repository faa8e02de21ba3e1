//! The oxygen sealer: fills the enclosed space above it with breathable air.
//!
//! Every tick the sealer needs energy and a non-empty oxygen tank. Every
//! `seal_check_interval` ticks (or as soon as its cached region was
//! invalidated) it re-reads the space above it through the shared
//! [`SealedAreaCache`]. A sealed region lets a cycle start: the cycle pays
//! `oxygen_per_block` for each enclosed cell up front, draws energy for
//! `seal_check_interval` processing ticks, then publishes the enclosed cells
//! as breathable.

use std::collections::BTreeSet;

use lunar_core::fixed::{Fixed64, Ticks};
use lunar_core::id::FluidId;
use lunar_core::position::Position;
use lunar_core::resource::{ResourceBuffer, ResourceContainer, Simulation};
use lunar_core::world::World;
use lunar_sealing::{SealedAreaCache, SealedRegion, Verdict};
use serde::{Deserialize, Serialize};

use crate::controller::{MachineLogic, MachineProcessController, TickReport};
use crate::phase::MachineProcessState;
use crate::status::{BlockReason, ConfigFault, MachineStatus, RedstoneMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealerConfig {
    pub energy_per_tick: u64,
    /// Oxygen consumed per enclosed cell per cycle.
    pub oxygen_per_block: u64,
    pub seal_check_interval: Ticks,
    pub tank_capacity: u64,
    pub energy_capacity: u64,
    pub oxygen: FluidId,
}

impl Default for SealerConfig {
    fn default() -> Self {
        Self {
            energy_per_tick: 25,
            oxygen_per_block: 1,
            seal_check_interval: 20,
            tank_capacity: 50_000,
            energy_capacity: 15_000,
            oxygen: FluidId(0),
        }
    }
}

/// One sealing cycle over a region of `blocks` enclosed cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealCycle {
    pub blocks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OxygenSealer {
    pub position: Position,
    pub energy: ResourceBuffer,
    pub oxygen: ResourceBuffer,
    pub config: SealerConfig,
    pub redstone_powered: bool,
    /// Ticks until the next seal check.
    countdown: Ticks,
    verdict: Option<Verdict>,
    inside: usize,
    outside: usize,
    /// Enclosed cells from the last seal check, published on emit.
    observed: BTreeSet<Position>,
    breathable: BTreeSet<Position>,
    state: MachineProcessState<SealCycle>,
}

impl OxygenSealer {
    pub fn new(position: Position, config: SealerConfig) -> Self {
        Self {
            position,
            energy: ResourceBuffer::energy(config.energy_capacity),
            oxygen: ResourceBuffer::fluid(config.oxygen, config.tank_capacity),
            config,
            redstone_powered: false,
            countdown: config.seal_check_interval,
            verdict: None,
            inside: 0,
            outside: 0,
            observed: BTreeSet::new(),
            breathable: BTreeSet::new(),
            state: MachineProcessState::default(),
        }
    }

    /// The cell the seal check floods from.
    pub fn seed(&self) -> Position {
        self.position.above()
    }

    pub fn tick<W: World + ?Sized>(&mut self, world: &W, cache: &mut SealedAreaCache) -> TickReport {
        let mut state = std::mem::take(&mut self.state);
        let report = {
            let mut logic = SealerLogic {
                sealer: self,
                world,
                cache,
            };
            MachineProcessController::tick(&mut state, &mut logic)
        };
        self.state = state;
        if report.phase.is_blocked() || report.phase.is_failed() {
            if !self.breathable.is_empty() {
                log::debug!("sealer at {:?} lost its sealed area", self.position);
            }
            self.breathable.clear();
        }
        report
    }

    pub fn state(&self) -> &MachineProcessState<SealCycle> {
        &self.state
    }

    pub fn status(&self) -> MachineStatus {
        self.state.status
    }

    pub fn progress(&self) -> Fixed64 {
        self.state.progress()
    }

    /// Verdict of the last seal check, if one has run.
    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    /// Enclosed cells seen by the last seal check.
    pub fn inside_area(&self) -> usize {
        self.inside
    }

    /// Cells reached by the last seal check before it stopped unsealed.
    pub fn outside_area(&self) -> usize {
        self.outside
    }

    /// Cells this sealer currently keeps breathable.
    pub fn breathable(&self) -> &BTreeSet<Position> {
        &self.breathable
    }

    pub fn is_breathable(&self, pos: Position) -> bool {
        self.breathable.contains(&pos)
    }

    pub fn set_redstone_mode(&mut self, mode: RedstoneMode) {
        self.state.redstone = mode;
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.breathable.clear();
        self.countdown = self.config.seal_check_interval;
    }

    fn observe(&mut self, region: &SealedRegion) {
        self.verdict = Some(region.verdict);
        self.inside = region.total_inside_blocks();
        self.outside = region.total_outside_blocks();
        self.observed.clone_from(&region.sealed);
    }
}

// ---------------------------------------------------------------------------
// Tick context
// ---------------------------------------------------------------------------

/// A sealer borrowed together with the world and cache it checks against.
struct SealerLogic<'a, W: ?Sized> {
    sealer: &'a mut OxygenSealer,
    world: &'a W,
    cache: &'a mut SealedAreaCache,
}

impl<W: World + ?Sized> SealerLogic<'_, W> {
    /// Re-read the region when the interval elapses or the cached entry
    /// was dropped.
    fn seal_check(&mut self) -> Option<BlockReason> {
        let seed = self.sealer.seed();
        let interval = self.sealer.config.seal_check_interval;
        self.sealer.countdown = self.sealer.countdown.saturating_sub(1);
        let cached = self.cache.contains(self.world.dimension(), seed);
        if self.sealer.countdown == 0 || !cached || self.sealer.verdict.is_none() {
            self.sealer.countdown = interval;
            let region = self.cache.get_or_solve(self.world, seed);
            self.sealer.observe(region);
        }
        match self.sealer.verdict? {
            Verdict::Sealed => None,
            Verdict::TooLarge => Some(BlockReason::AreaTooLarge),
            Verdict::Leaking | Verdict::Obstructed => Some(BlockReason::AreaNotSealed),
        }
    }
}

impl<W: World + ?Sized> MachineLogic for SealerLogic<'_, W> {
    type Operation = SealCycle;

    fn validate(&self) -> Result<(), ConfigFault> {
        if self.sealer.config.seal_check_interval == 0 {
            return Err(ConfigFault::ZeroCheckInterval);
        }
        Ok(())
    }

    fn redstone_powered(&self) -> bool {
        self.sealer.redstone_powered
    }

    fn check_preconditions(&mut self) -> Option<BlockReason> {
        let per_tick = self.sealer.config.energy_per_tick;
        if !self.sealer.energy.can_extract(per_tick) {
            return Some(BlockReason::NotEnoughEnergy);
        }
        if self.sealer.oxygen.is_empty() {
            return Some(BlockReason::NotEnoughOxygen);
        }
        self.seal_check()
    }

    fn find_operation(&mut self) -> Option<SealCycle> {
        (self.sealer.verdict == Some(Verdict::Sealed)).then_some(SealCycle {
            blocks: self.sealer.inside,
        })
    }

    fn cost(&self, _op: &SealCycle) -> u64 {
        self.sealer.config.energy_per_tick
    }

    fn duration(&self, _op: &SealCycle) -> Ticks {
        self.sealer.config.seal_check_interval
    }

    fn gather(&mut self, op: &SealCycle) -> Result<(), BlockReason> {
        let needed = self.sealer.config.oxygen_per_block.saturating_mul(op.blocks as u64);
        if self.sealer.oxygen.extract(needed, Simulation::Simulate) != needed {
            return Err(BlockReason::NotEnoughOxygen);
        }
        let taken = self.sealer.oxygen.extract(needed, Simulation::Act);
        debug_assert_eq!(taken, needed);
        Ok(())
    }

    fn draw(&mut self, cost: u64) -> bool {
        if self.sealer.energy.extract(cost, Simulation::Simulate) != cost {
            return false;
        }
        let drawn = self.sealer.energy.extract(cost, Simulation::Act);
        debug_assert_eq!(drawn, cost);
        true
    }

    fn can_emit(&mut self, _op: &SealCycle) -> bool {
        true
    }

    fn emit(&mut self, _op: &SealCycle) {
        self.sealer.breathable.clone_from(&self.sealer.observed);
        log::trace!(
            "sealer at {:?} sealed {} cells",
            self.sealer.position,
            self.sealer.breathable.len()
        );
    }

    fn working_status(&self, _op: &SealCycle) -> MachineStatus {
        MachineStatus::Sealed
    }
}
