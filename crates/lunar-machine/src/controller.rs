//! The per-tick processing state machine shared by every machine.
//!
//! A machine cycles `Idle -> Gathering -> Processing -> Emitting -> Idle`.
//! Each call to [`MachineProcessController::tick`] evaluates exactly one
//! transition. What a machine actually consumes and produces lives behind
//! the [`MachineLogic`] trait; the controller only sequences it.
//!
//! Order of checks on every tick:
//!
//! 1. A `Failed` machine stays failed until reset.
//! 2. [`MachineLogic::validate`]: a configuration fault fails the machine.
//! 3. Redstone gate: a disabled machine is blocked with `RedstoneDisabled`.
//! 4. [`MachineLogic::check_preconditions`]: a reason blocks the machine,
//!    remembering the step it was in.
//! 5. The current step (or the remembered one, for a blocked machine) runs.

use std::fmt;

use lunar_core::fixed::Ticks;
use serde::{Deserialize, Serialize};

use crate::phase::{MachinePhase, MachineProcessState, WorkPhase};
use crate::status::{BlockReason, ConfigFault, MachineStatus};

// ---------------------------------------------------------------------------
// Collaborator trait
// ---------------------------------------------------------------------------

/// What a concrete machine supplies to the controller.
pub trait MachineLogic {
    /// The unit of work selected in `Idle` (a recipe index, a seal cycle).
    type Operation: Clone + PartialEq + fmt::Debug;

    /// Reject configurations the machine can never run with.
    fn validate(&self) -> Result<(), ConfigFault> {
        Ok(())
    }

    /// Whether the machine currently receives a redstone signal.
    fn redstone_powered(&self) -> bool {
        false
    }

    /// Conditions that must hold on every tick, in the machine's own order.
    /// May refresh cached observations (a seal check, for instance).
    fn check_preconditions(&mut self) -> Option<BlockReason>;

    fn find_operation(&mut self) -> Option<Self::Operation>;

    /// Energy drawn per processing tick.
    fn cost(&self, op: &Self::Operation) -> u64;

    /// Processing ticks. Zero is treated as one.
    fn duration(&self, op: &Self::Operation) -> Ticks;

    /// Reserve and consume the operation's inputs. All or nothing.
    fn gather(&mut self, op: &Self::Operation) -> Result<(), BlockReason>;

    /// Extract `cost` energy. False if it is not fully available.
    fn draw(&mut self, cost: u64) -> bool;

    fn can_emit(&mut self, op: &Self::Operation) -> bool;

    fn emit(&mut self, op: &Self::Operation);

    /// Status reported while an operation is in flight.
    fn working_status(&self, _op: &Self::Operation) -> MachineStatus {
        MachineStatus::Active
    }
}

// ---------------------------------------------------------------------------
// Tick report
// ---------------------------------------------------------------------------

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub previous: MachinePhase,
    pub phase: MachinePhase,
    pub status: MachineStatus,
    /// True if the phase (including a block reason) changed this tick.
    pub state_changed: bool,
    /// True if an operation's output was emitted this tick.
    pub emitted: bool,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MachineProcessController;

impl MachineProcessController {
    /// Advance `state` by one transition using `logic`.
    pub fn tick<L: MachineLogic>(
        state: &mut MachineProcessState<L::Operation>,
        logic: &mut L,
    ) -> TickReport {
        let previous = state.phase;
        let emitted = Self::evaluate(state, logic);

        if state.phase != previous {
            log::trace!("machine phase {previous:?} -> {:?}", state.phase);
            match state.phase {
                MachinePhase::Blocked { reason, resume } => {
                    log::debug!("machine blocked by {reason:?} while {resume:?}");
                }
                MachinePhase::Failed { fault } => {
                    log::debug!("machine failed: {fault}");
                }
                _ => {}
            }
        }

        TickReport {
            previous,
            phase: state.phase,
            status: state.status,
            state_changed: state.phase != previous,
            emitted,
        }
    }

    /// Returns whether an output was emitted.
    fn evaluate<L: MachineLogic>(
        state: &mut MachineProcessState<L::Operation>,
        logic: &mut L,
    ) -> bool {
        let Some(step) = state.phase.work_phase() else {
            return false;
        };

        if let Err(fault) = logic.validate() {
            state.phase = MachinePhase::Failed { fault };
            state.status = MachineStatus::Failed(fault);
            state.operation = None;
            state.remaining = 0;
            state.total = 0;
            return false;
        }

        if !state.redstone.allows(logic.redstone_powered()) {
            Self::block(state, BlockReason::RedstoneDisabled, step);
            return false;
        }

        if let Some(reason) = logic.check_preconditions() {
            Self::block(state, reason, step);
            return false;
        }

        match step {
            WorkPhase::Idle => {
                Self::select(state, logic);
                false
            }
            WorkPhase::Gathering => {
                Self::gather(state, logic);
                false
            }
            WorkPhase::Processing => {
                Self::process(state, logic);
                false
            }
            WorkPhase::Emitting => Self::emit(state, logic),
        }
    }

    fn block<Op>(state: &mut MachineProcessState<Op>, reason: BlockReason, resume: WorkPhase) {
        state.phase = MachinePhase::Blocked { reason, resume };
        state.status = MachineStatus::Blocked(reason);
    }

    fn idle<Op>(state: &mut MachineProcessState<Op>) {
        state.phase = MachinePhase::Idle;
        state.status = MachineStatus::Idle;
        state.operation = None;
        state.remaining = 0;
        state.total = 0;
    }

    /// The in-flight operation, or back to `Idle` if there is none.
    fn current<Op: Clone>(state: &mut MachineProcessState<Op>) -> Option<Op> {
        let op = state.operation.clone();
        if op.is_none() {
            log::warn!("machine in {:?} without an operation, returning to idle", state.phase);
            Self::idle(state);
        }
        op
    }

    fn select<L: MachineLogic>(state: &mut MachineProcessState<L::Operation>, logic: &mut L) {
        match logic.find_operation() {
            Some(op) => {
                state.status = logic.working_status(&op);
                state.operation = Some(op);
                state.phase = MachinePhase::Gathering;
            }
            None => Self::idle(state),
        }
    }

    /// Gathers for whatever operation is valid now. The stored one is only
    /// kept when nothing else is, so the block reports why it cannot start.
    fn gather<L: MachineLogic>(state: &mut MachineProcessState<L::Operation>, logic: &mut L) {
        let Some(stored) = Self::current(state) else {
            return;
        };
        let op = match logic.find_operation() {
            Some(found) if found != stored => {
                log::debug!("replacing stale operation {stored:?} with {found:?}");
                state.operation = Some(found.clone());
                found
            }
            _ => stored,
        };
        match logic.gather(&op) {
            Ok(()) => {
                let duration = logic.duration(&op).max(1);
                state.total = duration;
                state.remaining = duration;
                state.status = logic.working_status(&op);
                state.phase = MachinePhase::Processing;
            }
            Err(reason) => Self::block(state, reason, WorkPhase::Gathering),
        }
    }

    fn process<L: MachineLogic>(state: &mut MachineProcessState<L::Operation>, logic: &mut L) {
        let Some(op) = Self::current(state) else {
            return;
        };
        if !logic.draw(logic.cost(&op)) {
            Self::block(state, BlockReason::NotEnoughEnergy, WorkPhase::Processing);
            return;
        }
        state.remaining = state.remaining.saturating_sub(1);
        state.status = logic.working_status(&op);
        state.phase = if state.remaining == 0 {
            MachinePhase::Emitting
        } else {
            MachinePhase::Processing
        };
    }

    fn emit<L: MachineLogic>(state: &mut MachineProcessState<L::Operation>, logic: &mut L) -> bool {
        let Some(op) = Self::current(state) else {
            return false;
        };
        if !logic.can_emit(&op) {
            Self::block(state, BlockReason::OutputFull, WorkPhase::Emitting);
            return false;
        }
        logic.emit(&op);
        let status = logic.working_status(&op);
        Self::idle(state);
        // The machine is idle but its last cycle's result is still in effect.
        state.status = status;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A machine whose resources are plain counters.
    #[derive(Debug, Default)]
    struct Scripted {
        energy: u64,
        inputs: u32,
        output_space: u32,
        outputs: u32,
        duration: Ticks,
        powered: bool,
        broken: bool,
        kind: u32,
    }

    impl Scripted {
        fn ready() -> Self {
            Self {
                energy: 100,
                inputs: 1,
                output_space: 1,
                duration: 2,
                kind: 7,
                ..Default::default()
            }
        }
    }

    impl MachineLogic for Scripted {
        type Operation = u32;

        fn validate(&self) -> Result<(), ConfigFault> {
            if self.broken {
                Err(ConfigFault::NoRecipes)
            } else {
                Ok(())
            }
        }

        fn redstone_powered(&self) -> bool {
            self.powered
        }

        fn check_preconditions(&mut self) -> Option<BlockReason> {
            (self.energy == 0).then_some(BlockReason::NotEnoughEnergy)
        }

        fn find_operation(&mut self) -> Option<u32> {
            (self.inputs > 0).then_some(self.kind)
        }

        fn cost(&self, _op: &u32) -> u64 {
            10
        }

        fn duration(&self, _op: &u32) -> Ticks {
            self.duration
        }

        fn gather(&mut self, _op: &u32) -> Result<(), BlockReason> {
            if self.inputs == 0 {
                return Err(BlockReason::NotEnoughResources);
            }
            self.inputs -= 1;
            Ok(())
        }

        fn draw(&mut self, cost: u64) -> bool {
            if self.energy < cost {
                return false;
            }
            self.energy -= cost;
            true
        }

        fn can_emit(&mut self, _op: &u32) -> bool {
            self.output_space > 0
        }

        fn emit(&mut self, _op: &u32) {
            self.output_space -= 1;
            self.outputs += 1;
        }
    }

    fn run(state: &mut MachineProcessState<u32>, logic: &mut Scripted) -> TickReport {
        MachineProcessController::tick(state, logic)
    }

    // -----------------------------------------------------------------------
    // Test 1: full cycle advances one transition per tick
    // -----------------------------------------------------------------------
    #[test]
    fn full_cycle_one_transition_per_tick() {
        let mut state = MachineProcessState::default();
        let mut logic = Scripted::ready();

        let r = run(&mut state, &mut logic);
        assert_eq!((r.previous, r.phase), (MachinePhase::Idle, MachinePhase::Gathering));
        assert!(r.state_changed);
        assert_eq!(state.operation, Some(7));

        let r = run(&mut state, &mut logic);
        assert_eq!(r.phase, MachinePhase::Processing);
        assert_eq!(logic.inputs, 0);
        assert_eq!(state.remaining, 2);

        let r = run(&mut state, &mut logic);
        assert_eq!(r.phase, MachinePhase::Processing);
        assert!(!r.state_changed);
        assert_eq!(r.status, MachineStatus::Active);
        assert_eq!(state.remaining, 1);

        let r = run(&mut state, &mut logic);
        assert_eq!(r.phase, MachinePhase::Emitting);
        assert_eq!(logic.energy, 80);

        let r = run(&mut state, &mut logic);
        assert_eq!(r.phase, MachinePhase::Idle);
        assert!(r.emitted);
        assert_eq!(logic.outputs, 1);
        assert_eq!(state.operation, None);

        // Nothing left to do.
        let r = run(&mut state, &mut logic);
        assert_eq!(r.phase, MachinePhase::Idle);
        assert_eq!(r.status, MachineStatus::Idle);
        assert!(!r.state_changed);
    }

    // -----------------------------------------------------------------------
    // Test 2: zero duration still processes for one tick
    // -----------------------------------------------------------------------
    #[test]
    fn zero_duration_processes_once() {
        let mut state = MachineProcessState::default();
        let mut logic = Scripted { duration: 0, ..Scripted::ready() };
        run(&mut state, &mut logic);
        run(&mut state, &mut logic);
        assert_eq!(state.total, 1);
        assert_eq!(run(&mut state, &mut logic).phase, MachinePhase::Emitting);
    }

    // -----------------------------------------------------------------------
    // Test 3: blocked machine resumes the interrupted phase
    // -----------------------------------------------------------------------
    #[test]
    fn blocked_resumes_interrupted_phase() {
        let mut state = MachineProcessState::default();
        let mut logic = Scripted { duration: 3, ..Scripted::ready() };
        run(&mut state, &mut logic);
        run(&mut state, &mut logic);
        run(&mut state, &mut logic);
        assert_eq!(state.remaining, 2);

        logic.energy = 0;
        let r = run(&mut state, &mut logic);
        assert_eq!(
            r.phase,
            MachinePhase::Blocked {
                reason: BlockReason::NotEnoughEnergy,
                resume: WorkPhase::Processing
            }
        );
        assert_eq!(r.status, MachineStatus::Blocked(BlockReason::NotEnoughEnergy));
        assert_eq!(state.remaining, 2);

        // Still blocked: no change reported.
        assert!(!run(&mut state, &mut logic).state_changed);

        logic.energy = 100;
        let r = run(&mut state, &mut logic);
        assert_eq!(r.phase, MachinePhase::Processing);
        assert_eq!(state.remaining, 1);
        assert_eq!(state.operation, Some(7));
    }

    // -----------------------------------------------------------------------
    // Test 4: draw failure mid-processing blocks without progress
    // -----------------------------------------------------------------------
    #[test]
    fn insufficient_draw_blocks() {
        let mut state = MachineProcessState::default();
        let mut logic = Scripted { energy: 15, ..Scripted::ready() };
        run(&mut state, &mut logic);
        run(&mut state, &mut logic);
        run(&mut state, &mut logic);
        assert_eq!(logic.energy, 5);
        let r = run(&mut state, &mut logic);
        assert_eq!(r.phase.work_phase(), Some(WorkPhase::Processing));
        assert_eq!(r.status.block_reason(), Some(BlockReason::NotEnoughEnergy));
        assert_eq!(state.remaining, 1);
    }

    // -----------------------------------------------------------------------
    // Test 5: full output blocks in Emitting
    // -----------------------------------------------------------------------
    #[test]
    fn full_output_blocks_emit() {
        let mut state = MachineProcessState::default();
        let mut logic = Scripted { output_space: 0, duration: 1, ..Scripted::ready() };
        for _ in 0..3 {
            run(&mut state, &mut logic);
        }
        assert_eq!(state.phase, MachinePhase::Emitting);
        let r = run(&mut state, &mut logic);
        assert_eq!(
            r.phase,
            MachinePhase::Blocked { reason: BlockReason::OutputFull, resume: WorkPhase::Emitting }
        );
        assert!(!r.emitted);

        logic.output_space = 1;
        let r = run(&mut state, &mut logic);
        assert!(r.emitted);
        assert_eq!(r.phase, MachinePhase::Idle);
    }

    // -----------------------------------------------------------------------
    // Test 6: gather failure blocks in Gathering
    // -----------------------------------------------------------------------
    #[test]
    fn gather_failure_blocks() {
        let mut state = MachineProcessState::default();
        let mut logic = Scripted::ready();
        run(&mut state, &mut logic);
        logic.inputs = 0;
        let r = run(&mut state, &mut logic);
        assert_eq!(
            r.phase,
            MachinePhase::Blocked {
                reason: BlockReason::NotEnoughResources,
                resume: WorkPhase::Gathering
            }
        );
        logic.inputs = 1;
        assert_eq!(run(&mut state, &mut logic).phase, MachinePhase::Processing);
    }

    // -----------------------------------------------------------------------
    // Test 7: configuration fault is terminal until reset
    // -----------------------------------------------------------------------
    #[test]
    fn config_fault_is_terminal() {
        let mut state = MachineProcessState::default();
        let mut logic = Scripted { broken: true, ..Scripted::ready() };
        let r = run(&mut state, &mut logic);
        assert_eq!(r.phase, MachinePhase::Failed { fault: ConfigFault::NoRecipes });
        assert_eq!(r.status, MachineStatus::Failed(ConfigFault::NoRecipes));

        logic.broken = false;
        let r = run(&mut state, &mut logic);
        assert!(r.phase.is_failed());
        assert!(!r.state_changed);

        state.reset();
        assert_eq!(run(&mut state, &mut logic).phase, MachinePhase::Gathering);
    }

    // -----------------------------------------------------------------------
    // Test 8: redstone gate runs before preconditions
    // -----------------------------------------------------------------------
    #[test]
    fn redstone_gate_precedes_preconditions() {
        use crate::status::RedstoneMode;

        let mut state = MachineProcessState::default().with_redstone(RedstoneMode::High);
        let mut logic = Scripted { energy: 0, ..Scripted::ready() };
        let r = run(&mut state, &mut logic);
        assert_eq!(r.status, MachineStatus::Blocked(BlockReason::RedstoneDisabled));

        logic.powered = true;
        let r = run(&mut state, &mut logic);
        assert_eq!(r.status, MachineStatus::Blocked(BlockReason::NotEnoughEnergy));

        logic.energy = 100;
        let r = run(&mut state, &mut logic);
        assert_eq!(r.phase, MachinePhase::Gathering);
    }

    // -----------------------------------------------------------------------
    // Test 9: idle with no work stays idle
    // -----------------------------------------------------------------------
    #[test]
    fn no_operation_stays_idle() {
        let mut state = MachineProcessState::default();
        let mut logic = Scripted { inputs: 0, ..Scripted::ready() };
        let r = run(&mut state, &mut logic);
        assert_eq!(r.phase, MachinePhase::Idle);
        assert_eq!(r.status, MachineStatus::Idle);
        assert!(!r.state_changed);
    }

    // -----------------------------------------------------------------------
    // Test 10: gathering picks up an operation that replaced the selected one
    // -----------------------------------------------------------------------
    #[test]
    fn gather_switches_to_current_operation() {
        let mut state = MachineProcessState::default();
        let mut logic = Scripted::ready();
        run(&mut state, &mut logic);
        assert_eq!(state.operation, Some(7));

        logic.kind = 9;
        let r = run(&mut state, &mut logic);
        assert_eq!(r.phase, MachinePhase::Processing);
        assert_eq!(state.operation, Some(9));
        assert_eq!(logic.inputs, 0);
    }

    // -----------------------------------------------------------------------
    // Test 11: a blocked gather resumes with whatever became valid
    // -----------------------------------------------------------------------
    #[test]
    fn blocked_gather_resumes_with_new_operation() {
        let mut state = MachineProcessState::default();
        let mut logic = Scripted::ready();
        run(&mut state, &mut logic);
        logic.inputs = 0;
        let r = run(&mut state, &mut logic);
        assert_eq!(r.status.block_reason(), Some(BlockReason::NotEnoughResources));
        assert_eq!(state.operation, Some(7));

        logic.inputs = 1;
        logic.kind = 3;
        let r = run(&mut state, &mut logic);
        assert_eq!(r.phase, MachinePhase::Processing);
        assert_eq!(r.status, MachineStatus::Active);
        assert_eq!(state.operation, Some(3));
    }
}
