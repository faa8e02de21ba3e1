//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use std::collections::BTreeMap;

use crate::automation::{AutomationType, FaceConfig};
use crate::conduit::NodeCapability;
use crate::id::{DimensionId, FluidId, ItemId};
use crate::position::Position;
use crate::resource::ResourceKind;
use crate::world::{BlockKind, World};

// ===========================================================================
// Resource constructors
// ===========================================================================

pub fn oxygen() -> FluidId {
    FluidId(0)
}
pub fn hydrogen() -> FluidId {
    FluidId(1)
}
pub fn oxygen_kind() -> ResourceKind {
    ResourceKind::Fluid(oxygen())
}

pub fn raw_iron() -> ItemId {
    ItemId(0)
}
pub fn iron_ingot() -> ItemId {
    ItemId(1)
}
pub fn compressed_iron() -> ItemId {
    ItemId(2)
}

pub fn pos(x: i32, y: i32, z: i32) -> Position {
    Position::new(x, y, z)
}

/// A machine whose every face accepts and emits power.
pub fn power_machine() -> BlockKind {
    BlockKind::Machine {
        faces: FaceConfig::uniform(AutomationType::PowerIo),
    }
}

/// A machine whose every face accepts fluids.
pub fn fluid_machine() -> BlockKind {
    BlockKind::Machine {
        faces: FaceConfig::uniform(AutomationType::FluidInput),
    }
}

// ===========================================================================
// GridWorld
// ===========================================================================

/// A bounded in-memory world. Cells inside the bounds default to air;
/// anything outside is [`BlockKind::Void`].
#[derive(Debug, Clone)]
pub struct GridWorld {
    pub dimension: DimensionId,
    pub min: Position,
    pub max: Position,
    blocks: BTreeMap<Position, BlockKind>,
}

impl GridWorld {
    /// A world spanning `min..=max` on every axis.
    pub fn new(min: Position, max: Position) -> Self {
        Self {
            dimension: DimensionId(0),
            min,
            max,
            blocks: BTreeMap::new(),
        }
    }

    /// A cube world `-radius..=radius` around the origin.
    pub fn cube(radius: i32) -> Self {
        Self::new(
            Position::new(-radius, -radius, -radius),
            Position::new(radius, radius, radius),
        )
    }

    pub fn with_dimension(mut self, dimension: DimensionId) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }

    pub fn set(&mut self, pos: Position, kind: BlockKind) {
        if kind.is_air() {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, kind);
        }
    }

    pub fn clear(&mut self, pos: Position) {
        self.blocks.remove(&pos);
    }

    /// Fill every cell of `min..=max` with `kind`.
    pub fn fill(&mut self, min: Position, max: Position, kind: BlockKind) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.set(Position::new(x, y, z), kind);
                }
            }
        }
    }

    /// Build solid walls on the shell of `min..=max`, leaving the inside as is.
    pub fn hollow_box(&mut self, min: Position, max: Position) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    let on_shell = x == min.x
                        || x == max.x
                        || y == min.y
                        || y == max.y
                        || z == min.z
                        || z == max.z;
                    if on_shell {
                        self.set(Position::new(x, y, z), BlockKind::Solid);
                    }
                }
            }
        }
    }
}

impl World for GridWorld {
    fn dimension(&self) -> DimensionId {
        self.dimension
    }

    fn block_at(&self, pos: Position) -> BlockKind {
        if !self.in_bounds(pos) {
            return BlockKind::Void;
        }
        self.blocks.get(&pos).copied().unwrap_or(BlockKind::Air)
    }
}

/// A straight run of standard wires along +x starting at `start`.
pub fn wire_line(world: &mut GridWorld, start: Position, len: i32) -> Vec<Position> {
    (0..len)
        .map(|i| {
            let p = Position::new(start.x + i, start.y, start.z);
            world.set(p, BlockKind::conduit(NodeCapability::standard_wire()));
            p
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_bounds_is_void() {
        let world = GridWorld::cube(2);
        assert_eq!(world.block_at(pos(3, 0, 0)), BlockKind::Void);
        assert_eq!(world.block_at(pos(2, 0, 0)), BlockKind::Air);
    }

    #[test]
    fn hollow_box_leaves_interior_air() {
        let mut world = GridWorld::cube(3);
        world.hollow_box(pos(-1, -1, -1), pos(1, 1, 1));
        assert_eq!(world.block_at(pos(0, 0, 0)), BlockKind::Air);
        assert_eq!(world.block_at(pos(1, 0, 0)), BlockKind::Solid);
        assert_eq!(world.block_at(pos(1, 1, 1)), BlockKind::Solid);
    }

    #[test]
    fn wire_line_places_conduits() {
        let mut world = GridWorld::cube(5);
        let line = wire_line(&mut world, pos(0, 0, 0), 3);
        assert_eq!(line.len(), 3);
        assert!(matches!(world.block_at(pos(2, 0, 0)), BlockKind::Conduit { .. }));
    }
}
