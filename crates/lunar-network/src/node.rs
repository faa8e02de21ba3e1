use lunar_core::automation::FaceConfig;
use lunar_core::conduit::NodeCapability;
use lunar_core::position::{Connections, Direction, Position};
use lunar_core::resource::Medium;
use serde::{Deserialize, Serialize};

use crate::network::NetworkId;

// ---------------------------------------------------------------------------
// ResourceNode
// ---------------------------------------------------------------------------

/// A single wire or pipe segment occupying one grid cell.
///
/// Nodes are owned by [`ConnectivityGraph`](crate::graph::ConnectivityGraph)
/// and only ever mutated through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub position: Position,
    pub capability: NodeCapability,
    /// Faces linked to a neighbouring node of the same network.
    pub connections: Connections,
    /// Faces linked to an adjacent endpoint whose facing side carries this
    /// node's medium.
    pub endpoint_links: Connections,
    /// Subset of `endpoint_links` where the endpoint face accepts input.
    pub consumer_links: Connections,
    /// Faces closed by the block state. Never connected.
    pub blocked_faces: Connections,
    /// Owning network. `None` only transiently inside graph operations.
    pub network: Option<NetworkId>,
}

impl ResourceNode {
    pub fn new(position: Position, capability: NodeCapability) -> Self {
        Self {
            position,
            capability,
            connections: Connections::NONE,
            endpoint_links: Connections::NONE,
            consumer_links: Connections::NONE,
            blocked_faces: Connections::NONE,
            network: None,
        }
    }

    pub fn with_blocked_faces(mut self, faces: Connections) -> Self {
        self.blocked_faces = faces;
        self
    }

    pub fn medium(&self) -> Medium {
        self.capability.medium
    }

    pub fn is_connected(&self, direction: Direction) -> bool {
        self.connections.contains(direction)
    }

    /// Positions of the neighbouring nodes this node is linked to.
    pub fn connected_neighbors(&self) -> impl Iterator<Item = Position> + '_ {
        self.connections.iter().map(|d| self.position.offset(d))
    }

    /// Positions of the consumer endpoints this node feeds.
    pub fn consumer_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.consumer_links.iter().map(|d| self.position.offset(d))
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// A machine cell adjacent to conduit nodes. Hosts a resource container that
/// the network resolves through
/// [`ContainerAccess`](lunar_core::resource::ContainerAccess).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub position: Position,
    pub faces: FaceConfig,
}

impl Endpoint {
    pub fn new(position: Position, faces: FaceConfig) -> Self {
        Self { position, faces }
    }

    /// `(linked, consumes)` for a node of `medium` touching this endpoint on
    /// the endpoint's `face`.
    pub fn link_for(&self, face: Direction, medium: Medium) -> (bool, bool) {
        let automation = self.faces.get(face);
        let linked = automation.carries(medium);
        (linked, linked && automation.is_input())
    }
}
