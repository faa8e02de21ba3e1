//! The voxel world as seen by the core: a block lookup plus change
//! notifications. The host engine implements [`World`]; graph and sealing
//! components implement [`BlockListener`].

use serde::{Deserialize, Serialize};

use crate::automation::FaceConfig;
use crate::conduit::NodeCapability;
use crate::id::DimensionId;
use crate::position::{Connections, Direction, Position};

/// The classification of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Empty, gas-permeable space.
    Air,
    /// Any full block. Seals air and is never entered by a flood fill.
    Solid,
    /// An explicit marker for space open to the unsealed exterior.
    Exterior,
    /// Outside the loaded world. Treated as open exterior.
    Void,
    /// A wire or pipe segment.
    Conduit {
        capability: NodeCapability,
        /// Faces closed by the block state (never connect).
        blocked: Connections,
    },
    /// A machine hosting resource containers.
    Machine { faces: FaceConfig },
}

impl BlockKind {
    pub fn conduit(capability: NodeCapability) -> Self {
        BlockKind::Conduit {
            capability,
            blocked: Connections::NONE,
        }
    }

    pub fn is_air(&self) -> bool {
        matches!(self, BlockKind::Air)
    }

    /// Space that leaks to the unsealed world.
    pub fn is_open_boundary(&self) -> bool {
        matches!(self, BlockKind::Exterior | BlockKind::Void)
    }

    /// Anything that stops a flood fill.
    pub fn is_wall(&self) -> bool {
        !self.is_air() && !self.is_open_boundary()
    }
}

/// Read access to one dimension of the voxel grid.
pub trait World {
    fn dimension(&self) -> DimensionId;

    fn block_at(&self, pos: Position) -> BlockKind;

    fn neighbors_of(&self, pos: Position) -> [(Direction, Position); 6] {
        pos.neighbors()
    }
}

impl<W: World + ?Sized> World for &W {
    fn dimension(&self) -> DimensionId {
        (**self).dimension()
    }

    fn block_at(&self, pos: Position) -> BlockKind {
        (**self).block_at(pos)
    }
}

/// A block change reported by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockChange {
    Placed,
    Removed,
    /// Same block, different state (e.g. a pipe face was closed).
    StateChanged,
}

/// Receives block change notifications from the world.
pub trait BlockListener {
    fn block_changed(&mut self, world: &dyn World, pos: Position, change: BlockChange);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_classification() {
        assert!(BlockKind::Solid.is_wall());
        assert!(BlockKind::conduit(NodeCapability::standard_wire()).is_wall());
        assert!(!BlockKind::Air.is_wall());
        assert!(!BlockKind::Void.is_wall());
        assert!(BlockKind::Exterior.is_open_boundary());
        assert!(BlockKind::Void.is_open_boundary());
        assert!(!BlockKind::Air.is_open_boundary());
    }
}
