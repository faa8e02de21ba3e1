use std::collections::{BTreeSet, VecDeque};

use lunar_core::id::DimensionId;
use lunar_core::position::Position;
use lunar_core::world::World;
use serde::{Deserialize, Serialize};

/// Default bound on the number of air cells one solve may visit.
pub const DEFAULT_MAX_BLOCKS: usize = 1024;

// ---------------------------------------------------------------------------
// SealedRegion
// ---------------------------------------------------------------------------

/// Outcome of one flood fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The frontier ran out inside walls.
    Sealed,
    /// The fill reached exterior space or the edge of the loaded world.
    Leaking,
    /// More than `max_blocks` air cells were reachable.
    TooLarge,
    /// The seed itself is not air.
    Obstructed,
}

/// The air space reachable from a seed, as seen by one solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRegion {
    pub seed: Position,
    pub dimension: DimensionId,
    pub verdict: Verdict,
    /// Interior air cells. Empty unless the verdict is `Sealed`.
    pub sealed: BTreeSet<Position>,
    /// Air cells reached before a non-sealed solve stopped.
    pub leaking: BTreeSet<Position>,
    /// Non-air cells the fill touched (walls, and the open cell that
    /// leaked). A change to any of them can change the verdict.
    pub boundary: BTreeSet<Position>,
    /// Air cells accepted by the fill.
    pub visited: usize,
}

impl SealedRegion {
    fn empty(seed: Position, dimension: DimensionId, verdict: Verdict) -> Self {
        Self {
            seed,
            dimension,
            verdict,
            sealed: BTreeSet::new(),
            leaking: BTreeSet::new(),
            boundary: BTreeSet::from([seed]),
            visited: 0,
        }
    }

    pub fn breathable(&self) -> bool {
        self.verdict == Verdict::Sealed
    }

    pub fn total_inside_blocks(&self) -> usize {
        self.sealed.len()
    }

    pub fn total_outside_blocks(&self) -> usize {
        self.leaking.len()
    }

    /// Whether a change at `pos` could alter this region.
    pub fn depends_on(&self, pos: Position) -> bool {
        let hit = |p: &Position| {
            self.sealed.contains(p) || self.leaking.contains(p) || self.boundary.contains(p)
        };
        hit(&pos) || pos.neighbors().iter().any(|(_, n)| hit(n))
    }
}

// ---------------------------------------------------------------------------
// SealedAreaSolver
// ---------------------------------------------------------------------------

/// Bounded breadth-first flood fill over air cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedAreaSolver {
    pub max_blocks: usize,
}

impl Default for SealedAreaSolver {
    fn default() -> Self {
        Self {
            max_blocks: DEFAULT_MAX_BLOCKS,
        }
    }
}

impl SealedAreaSolver {
    pub fn new(max_blocks: usize) -> Self {
        Self { max_blocks }
    }

    /// Flood fill from `seed` through face-adjacent air.
    ///
    /// Never visits more than `max_blocks + 1` air cells.
    pub fn solve<W: World + ?Sized>(&self, world: &W, seed: Position) -> SealedRegion {
        let dimension = world.dimension();
        let seed_block = world.block_at(seed);
        if seed_block.is_open_boundary() {
            return SealedRegion::empty(seed, dimension, Verdict::Leaking);
        }
        if !seed_block.is_air() {
            log::trace!("seal check at {seed:?} obstructed by {seed_block:?}");
            return SealedRegion::empty(seed, dimension, Verdict::Obstructed);
        }

        let mut air = BTreeSet::from([seed]);
        let mut boundary = BTreeSet::new();
        let mut queue = VecDeque::from([seed]);
        let mut verdict = Verdict::Sealed;

        'fill: while let Some(pos) = queue.pop_front() {
            for (_, next) in world.neighbors_of(pos) {
                if air.contains(&next) || boundary.contains(&next) {
                    continue;
                }
                let block = world.block_at(next);
                if block.is_open_boundary() {
                    boundary.insert(next);
                    verdict = Verdict::Leaking;
                    break 'fill;
                }
                if !block.is_air() {
                    boundary.insert(next);
                    continue;
                }
                air.insert(next);
                if air.len() > self.max_blocks {
                    verdict = Verdict::TooLarge;
                    break 'fill;
                }
                queue.push_back(next);
            }
        }

        let visited = air.len();
        log::debug!("seal check at {seed:?} in {dimension:?}: {verdict:?} after {visited} cells");
        let (sealed, leaking) = match verdict {
            Verdict::Sealed => (air, BTreeSet::new()),
            _ => (BTreeSet::new(), air),
        };
        SealedRegion {
            seed,
            dimension,
            verdict,
            sealed,
            leaking,
            boundary,
            visited,
        }
    }
}
