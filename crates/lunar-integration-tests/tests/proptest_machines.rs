//! Property-based tests for the machine state machine.

use lunar_core::test_utils::{iron_ingot, raw_iron};
use lunar_machine::{
    ItemAmount, MachineEnergyConfig, MachinePhase, Recipe, RecipeMachine, WorkPhase,
};
use proptest::prelude::*;

// ===========================================================================
// Helpers
// ===========================================================================

/// Phases reachable from `step` in a single evaluation.
fn successors(step: WorkPhase) -> &'static [WorkPhase] {
    match step {
        WorkPhase::Idle => &[WorkPhase::Idle, WorkPhase::Gathering],
        WorkPhase::Gathering => &[WorkPhase::Processing],
        WorkPhase::Processing => &[WorkPhase::Processing, WorkPhase::Emitting],
        WorkPhase::Emitting => &[WorkPhase::Idle],
    }
}

fn legal(previous: MachinePhase, next: MachinePhase) -> bool {
    let Some(from) = previous.work_phase() else {
        return next == previous;
    };
    match next {
        MachinePhase::Blocked { resume, .. } => {
            resume == from || successors(from).contains(&resume)
        }
        MachinePhase::Failed { .. } => true,
        _ => next
            .work_phase()
            .is_some_and(|to| successors(from).contains(&to)),
    }
}

fn furnace(duration: u64, energy: u64) -> RecipeMachine {
    let recipe = Recipe::new(
        vec![ItemAmount::new(raw_iron(), 1)],
        vec![ItemAmount::new(iron_ingot(), 1)],
        duration,
    );
    let mut machine = RecipeMachine::electric_furnace(vec![recipe], &MachineEnergyConfig::default());
    machine.energy.amount = energy;
    machine
}

#[derive(Debug, Clone)]
enum Action {
    Tick,
    AddOre(u32),
    Charge(u64),
    Unload,
}

fn arb_actions() -> impl Strategy<Value = Vec<Action>> {
    proptest::collection::vec(
        prop_oneof![
            8 => Just(Action::Tick),
            1 => (1..4u32).prop_map(Action::AddOre),
            1 => (0..200u64).prop_map(Action::Charge),
            1 => Just(Action::Unload),
        ],
        1..200,
    )
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Each tick makes at most one step along the cycle.
    #[test]
    fn one_transition_per_tick(duration in 1..6u64, actions in arb_actions()) {
        let mut machine = furnace(duration, 500);
        for action in &actions {
            match *action {
                Action::Tick => {
                    let report = machine.tick();
                    prop_assert!(
                        legal(report.previous, report.phase),
                        "{:?} -> {:?}", report.previous, report.phase
                    );
                    prop_assert_eq!(report.state_changed, report.previous != report.phase);
                }
                Action::AddOre(n) => {
                    let _ = machine.inventory.insert_input(raw_iron(), n);
                }
                Action::Charge(e) => {
                    machine.energy.amount = (machine.energy.amount + e).min(machine.energy.capacity);
                }
                Action::Unload => {
                    let _ = machine.inventory.take_output(iron_ingot(), u32::MAX);
                }
            }
        }
    }

    /// Ingots never outnumber the ore consumed; at most one is in flight.
    #[test]
    fn outputs_match_consumed_inputs(ore in 0..20u32, ticks in 0..150usize, energy in 0..2_000u64) {
        let mut machine = furnace(3, energy);
        let _ = machine.inventory.insert_input(raw_iron(), ore);
        let start_energy = machine.energy.amount;
        let mut emitted = 0u32;
        for _ in 0..ticks {
            if machine.tick().emitted {
                emitted += 1;
            }
        }
        let consumed = ore - machine.inventory.available(raw_iron());
        let produced = machine.inventory.produced(iron_ingot());
        prop_assert_eq!(produced, emitted);
        prop_assert!(produced <= consumed);
        prop_assert!(consumed - produced <= 1);
        // Every emitted ingot paid for three processing ticks.
        prop_assert!(start_energy - machine.energy.amount >= u64::from(produced) * 3 * 15);
    }
}
