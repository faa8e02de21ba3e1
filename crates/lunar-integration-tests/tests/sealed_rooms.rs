//! Sealed rooms, oxygen sealers and the shared region cache.

use lunar_core::test_utils::{GridWorld, pos, power_machine};
use lunar_core::world::{BlockChange, BlockKind, BlockListener, World};
use lunar_machine::{BlockReason, MachinePhase, MachineStatus, OxygenSealer, SealerConfig};
use lunar_sealing::{SealedAreaCache, SealedAreaSolver, Verdict};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Solid 3x3x3 shell with one air cell at the origin.
fn single_cell_room() -> GridWorld {
    let mut world = GridWorld::cube(4);
    world.hollow_box(pos(-1, -1, -1), pos(1, 1, 1));
    world
}

// ===========================================================================
// Solver scenarios
// ===========================================================================

#[test]
fn single_cell_room_breach() {
    init_logger();
    let mut world = single_cell_room();
    let solver = SealedAreaSolver::default();

    let region = solver.solve(&world, pos(0, 0, 0));
    assert!(region.breathable());
    assert_eq!(region.total_inside_blocks(), 1);

    world.clear(pos(0, 0, 1));
    let region = solver.solve(&world, pos(0, 0, 0));
    assert!(!region.breathable());
    assert_eq!(region.verdict, Verdict::Leaking);
}

#[test]
fn two_rooms_cache_independently() {
    init_logger();
    let mut world = GridWorld::cube(10);
    world.hollow_box(pos(-6, -1, -1), pos(-4, 1, 1));
    world.hollow_box(pos(4, -1, -1), pos(6, 1, 1));
    let mut cache = SealedAreaCache::default();

    assert!(cache.get_or_solve(&world, pos(-5, 0, 0)).breathable());
    assert!(cache.get_or_solve(&world, pos(5, 0, 0)).breathable());

    world.clear(pos(6, 0, 0));
    cache.block_changed(&world, pos(6, 0, 0), BlockChange::Removed);
    assert!(cache.contains(world.dimension(), pos(-5, 0, 0)));
    assert!(!cache.contains(world.dimension(), pos(5, 0, 0)));
    assert!(!cache.get_or_solve(&world, pos(5, 0, 0)).breathable());
    assert_eq!(cache.solve_count(), 3);
}

// ===========================================================================
// Oxygen sealer
// ===========================================================================

fn sealer_in_floor(config: SealerConfig) -> OxygenSealer {
    let mut sealer = OxygenSealer::new(pos(0, -1, 0), config);
    sealer.energy.amount = sealer.energy.capacity;
    sealer.oxygen.amount = 500;
    sealer
}

#[test]
fn sealer_keeps_room_breathable_until_breach() {
    init_logger();
    let mut world = single_cell_room();
    world.set(pos(0, -1, 0), power_machine());
    let mut cache = SealedAreaCache::default();
    let config = SealerConfig {
        seal_check_interval: 3,
        ..SealerConfig::default()
    };
    let mut sealer = sealer_in_floor(config);

    // Select, gather, three processing ticks, emit.
    let mut emitted_at = None;
    for tick in 0..6 {
        let report = sealer.tick(&world, &mut cache);
        assert_eq!(report.status, MachineStatus::Sealed);
        if report.emitted {
            emitted_at = Some(tick);
        }
    }
    assert_eq!(emitted_at, Some(5));
    assert!(sealer.is_breathable(pos(0, 0, 0)));
    assert_eq!(sealer.inside_area(), 1);

    // Breaking the wall drops the cached region; the next tick notices.
    world.clear(pos(-1, 0, 0));
    cache.block_changed(&world, pos(-1, 0, 0), BlockChange::Removed);
    let report = sealer.tick(&world, &mut cache);
    assert_eq!(report.status, MachineStatus::Blocked(BlockReason::AreaNotSealed));
    assert!(sealer.breathable().is_empty());

    // Repairing it lets the sealer pick up where it left off.
    world.set(pos(-1, 0, 0), BlockKind::Solid);
    cache.block_changed(&world, pos(-1, 0, 0), BlockChange::Placed);
    let report = sealer.tick(&world, &mut cache);
    assert_eq!(report.status, MachineStatus::Sealed);
    assert_eq!(report.phase, MachinePhase::Gathering);
}

#[test]
fn sealer_in_open_space_reports_too_large() {
    init_logger();
    let world = GridWorld::cube(16);
    let mut cache = SealedAreaCache::new(SealedAreaSolver::new(200));
    let mut sealer = sealer_in_floor(SealerConfig::default());
    let report = sealer.tick(&world, &mut cache);
    assert_eq!(report.status, MachineStatus::Blocked(BlockReason::AreaTooLarge));
    assert_eq!(sealer.verdict(), Some(Verdict::TooLarge));
    assert_eq!(sealer.outside_area(), 201);
}

#[test]
fn sealers_cache_their_own_seeds() {
    init_logger();
    let mut world = GridWorld::cube(8);
    world.hollow_box(pos(-2, -1, -2), pos(2, 3, 2));
    let mut cache = SealedAreaCache::default();
    let mut a = sealer_in_floor(SealerConfig::default());
    let mut b = OxygenSealer::new(pos(0, 3, 0), SealerConfig::default());
    b.energy.amount = 1_000;
    b.oxygen.amount = 500;

    a.tick(&world, &mut cache);
    assert_eq!(a.inside_area(), 27);
    // b floods from above the ceiling: outside the room.
    b.tick(&world, &mut cache);
    assert_ne!(b.verdict(), Some(Verdict::Sealed));
    assert_eq!(cache.len(), 2);
}
