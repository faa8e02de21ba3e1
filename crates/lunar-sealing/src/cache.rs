//! Per-seed cache of solved regions, keyed by dimension and seed.
//!
//! Regions stay cached until a block change touches one of their cells or
//! walls. Unaffected sealers keep reading the cached result without
//! re-running the fill.

use std::collections::BTreeMap;

use lunar_core::id::DimensionId;
use lunar_core::position::Position;
use lunar_core::world::{BlockChange, BlockListener, World};

use crate::solver::{SealedAreaSolver, SealedRegion};

type RegionKey = (DimensionId, Position);

#[derive(Debug, Clone, Default)]
pub struct SealedAreaCache {
    solver: SealedAreaSolver,
    regions: BTreeMap<RegionKey, SealedRegion>,
    /// Fills run since creation.
    solves: u64,
}

impl SealedAreaCache {
    pub fn new(solver: SealedAreaSolver) -> Self {
        Self {
            solver,
            regions: BTreeMap::new(),
            solves: 0,
        }
    }

    pub fn solver(&self) -> &SealedAreaSolver {
        &self.solver
    }

    pub fn get(&self, dimension: DimensionId, seed: Position) -> Option<&SealedRegion> {
        self.regions.get(&(dimension, seed))
    }

    pub fn contains(&self, dimension: DimensionId, seed: Position) -> bool {
        self.regions.contains_key(&(dimension, seed))
    }

    /// The cached region for `seed`, solving it first if needed.
    pub fn get_or_solve<W: World + ?Sized>(&mut self, world: &W, seed: Position) -> &SealedRegion {
        let key = (world.dimension(), seed);
        let solver = self.solver;
        let solves = &mut self.solves;
        self.regions.entry(key).or_insert_with(|| {
            *solves += 1;
            solver.solve(world, seed)
        })
    }

    /// Drop every region that a change at `pos` could affect. Returns the
    /// number dropped.
    pub fn invalidate(&mut self, dimension: DimensionId, pos: Position) -> usize {
        let before = self.regions.len();
        self.regions
            .retain(|(dim, _), region| *dim != dimension || !region.depends_on(pos));
        let dropped = before - self.regions.len();
        if dropped > 0 {
            log::debug!("block change at {pos:?} invalidated {dropped} sealed regions");
        }
        dropped
    }

    pub fn remove(&mut self, dimension: DimensionId, seed: Position) -> Option<SealedRegion> {
        self.regions.remove(&(dimension, seed))
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn solve_count(&self) -> u64 {
        self.solves
    }

    /// True if `pos` lies inside any cached breathable region.
    pub fn breathable_at(&self, dimension: DimensionId, pos: Position) -> bool {
        self.regions
            .iter()
            .any(|((dim, _), r)| *dim == dimension && r.breathable() && r.sealed.contains(&pos))
    }

    /// Re-solve every cached region against the world of its dimension.
    /// Regions whose dimension has no world in `worlds` are left as is.
    ///
    /// With the `parallel` feature the fills run on the rayon pool; the
    /// worlds are only read.
    pub fn refresh_all<W: World + Sync>(&mut self, worlds: &[W]) {
        let jobs: Vec<(RegionKey, &W)> = self
            .regions
            .keys()
            .filter_map(|key| {
                worlds
                    .iter()
                    .find(|w| w.dimension() == key.0)
                    .map(|w| (*key, w))
            })
            .collect();
        let solver = self.solver;

        #[cfg(feature = "parallel")]
        let solved: Vec<(RegionKey, SealedRegion)> = {
            use rayon::prelude::*;
            jobs.par_iter()
                .map(|(key, world)| (*key, solver.solve(*world, key.1)))
                .collect()
        };
        #[cfg(not(feature = "parallel"))]
        let solved: Vec<(RegionKey, SealedRegion)> = jobs
            .iter()
            .map(|(key, world)| (*key, solver.solve(*world, key.1)))
            .collect();

        self.solves += solved.len() as u64;
        log::debug!("refreshed {} sealed regions", solved.len());
        self.regions.extend(solved);
    }
}

impl BlockListener for SealedAreaCache {
    fn block_changed(&mut self, world: &dyn World, pos: Position, _change: BlockChange) {
        self.invalidate(world.dimension(), pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Verdict;
    use lunar_core::test_utils::{GridWorld, pos};
    use lunar_core::world::BlockKind;

    fn room_world() -> GridWorld {
        let mut world = GridWorld::cube(6);
        world.hollow_box(pos(-1, -1, -1), pos(1, 1, 1));
        world
    }

    #[test]
    fn second_lookup_hits_cache() {
        let world = room_world();
        let mut cache = SealedAreaCache::default();
        assert!(cache.get_or_solve(&world, pos(0, 0, 0)).breathable());
        assert!(cache.get_or_solve(&world, pos(0, 0, 0)).breathable());
        assert_eq!(cache.solve_count(), 1);
        assert!(cache.breathable_at(DimensionId(0), pos(0, 0, 0)));
        assert!(!cache.breathable_at(DimensionId(1), pos(0, 0, 0)));
    }

    #[test]
    fn wall_change_invalidates() {
        let mut world = room_world();
        let mut cache = SealedAreaCache::default();
        cache.get_or_solve(&world, pos(0, 0, 0));

        world.clear(pos(0, 1, 0));
        cache.block_changed(&world, pos(0, 1, 0), BlockChange::Removed);
        assert!(cache.is_empty());
        assert_eq!(cache.get_or_solve(&world, pos(0, 0, 0)).verdict, Verdict::Leaking);
        assert_eq!(cache.solve_count(), 2);
    }

    #[test]
    fn distant_change_keeps_entry() {
        let mut world = room_world();
        let mut cache = SealedAreaCache::default();
        cache.get_or_solve(&world, pos(0, 0, 0));
        world.set(pos(5, 5, 5), BlockKind::Solid);
        assert_eq!(cache.invalidate(DimensionId(0), pos(5, 5, 5)), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn other_dimension_change_keeps_entry() {
        let world = room_world();
        let mut cache = SealedAreaCache::default();
        cache.get_or_solve(&world, pos(0, 0, 0));
        assert_eq!(cache.invalidate(DimensionId(7), pos(0, 1, 0)), 0);
        assert!(cache.contains(DimensionId(0), pos(0, 0, 0)));
    }

    #[test]
    fn remove_drops_single_entry() {
        let world = room_world();
        let mut cache = SealedAreaCache::default();
        cache.get_or_solve(&world, pos(0, 0, 0));
        cache.get_or_solve(&world, pos(4, 4, 4));
        assert!(cache.remove(DimensionId(0), pos(0, 0, 0)).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn refresh_all_resolves_against_current_world() {
        let mut world = room_world();
        let mut cache = SealedAreaCache::new(SealedAreaSolver::new(64));
        cache.get_or_solve(&world, pos(0, 0, 0));
        world.clear(pos(1, 0, 0));
        cache.refresh_all(std::slice::from_ref(&world));
        assert_eq!(
            cache.get(DimensionId(0), pos(0, 0, 0)).unwrap().verdict,
            Verdict::TooLarge
        );
    }
}
