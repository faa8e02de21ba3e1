//! Versioned binary snapshots of a [`ConnectivityGraph`].
//!
//! Only durable facts are stored: node positions and capabilities, blocked
//! faces, endpoints, and network membership. Connection bits and consumer
//! caches are rebuilt on load. Membership records are treated as hints:
//! a record whose members no longer touch is split, and members that are
//! not in the node list are dropped.

use std::collections::{BTreeSet, VecDeque};

use lunar_core::automation::FaceConfig;
use lunar_core::conduit::NodeCapability;
use lunar_core::position::{Connections, Direction, Position};
use serde::{Deserialize, Serialize};

use crate::graph::ConnectivityGraph;
use crate::network::NetworkId;
use crate::node::{Endpoint, ResourceNode};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a graph snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x4C55_4E01;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
        }
    }
}

impl SnapshotHeader {
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(SnapshotError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub position: Position,
    pub capability: NodeCapability,
    pub blocked_faces: Connections,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub position: Position,
    pub faces: FaceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub members: Vec<Position>,
    pub cap: u64,
}

/// The persisted form of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub header: SnapshotHeader,
    pub nodes: Vec<NodeRecord>,
    pub endpoints: Vec<EndpointRecord>,
    /// Live networks in creation order.
    pub networks: Vec<NetworkRecord>,
}

impl GraphSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bitcode::serialize(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: GraphSnapshot =
            bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        Ok(snapshot)
    }
}

// ---------------------------------------------------------------------------
// Graph <-> snapshot
// ---------------------------------------------------------------------------

impl ConnectivityGraph {
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut live: Vec<_> = self.networks().collect();
        live.sort_by_key(|n| n.ordinal());

        GraphSnapshot {
            header: SnapshotHeader::default(),
            nodes: self
                .nodes()
                .map(|n| NodeRecord {
                    position: n.position,
                    capability: n.capability,
                    blocked_faces: n.blocked_faces,
                })
                .collect(),
            endpoints: self
                .endpoints()
                .map(|e| EndpointRecord {
                    position: e.position,
                    faces: e.faces,
                })
                .collect(),
            networks: live
                .into_iter()
                .map(|n| NetworkRecord {
                    members: n.members().iter().copied().collect(),
                    cap: n.cap(),
                })
                .collect(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        self.snapshot().encode()
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        Ok(Self::restore(&GraphSnapshot::decode(data)?))
    }

    /// Rebuild a graph from a snapshot.
    ///
    /// Networks are recreated in record order, one per connected component
    /// of each record's members. Nodes not claimed by any record get their
    /// own networks after that.
    pub fn restore(snapshot: &GraphSnapshot) -> Self {
        let mut graph = ConnectivityGraph::new();
        for record in &snapshot.nodes {
            let node = ResourceNode::new(record.position, record.capability)
                .with_blocked_faces(record.blocked_faces);
            graph.nodes.insert(record.position, node);
        }
        for record in &snapshot.endpoints {
            if graph.nodes.contains_key(&record.position) {
                log::warn!("snapshot endpoint at {:?} overlaps a node, dropped", record.position);
                continue;
            }
            graph
                .endpoints
                .insert(record.position, Endpoint::new(record.position, record.faces));
        }

        let positions: Vec<Position> = graph.nodes.keys().copied().collect();
        for pos in &positions {
            let Some(node) = graph.nodes.get(pos) else {
                continue;
            };
            let connections: Connections = Direction::ALL
                .into_iter()
                .filter(|dir| graph.can_connect(node, *dir))
                .collect();
            let (links, consumes) = graph.endpoint_links_for(node);
            if let Some(node) = graph.nodes.get_mut(pos) {
                node.connections = connections;
                node.endpoint_links = links;
                node.consumer_links = consumes;
            }
        }

        let mut claimed: BTreeSet<Position> = BTreeSet::new();
        for record in &snapshot.networks {
            let mut pieces = 0;
            for &member in &record.members {
                if !graph.nodes.contains_key(&member) {
                    log::warn!("snapshot network member {member:?} has no node, dropped");
                    continue;
                }
                if claimed.contains(&member) {
                    continue;
                }
                let id = graph.component_network(member, &mut claimed);
                pieces += 1;
                if let Some(state) = graph.networks.get(id) {
                    if state.cap() != record.cap {
                        log::warn!(
                            "snapshot network cap {} differs from member cap {}",
                            record.cap,
                            state.cap()
                        );
                    }
                }
            }
            if pieces > 1 {
                log::debug!("snapshot network record split into {pieces} networks");
            }
        }
        for pos in positions {
            if !claimed.contains(&pos) {
                log::warn!("snapshot node at {pos:?} belonged to no network");
                graph.component_network(pos, &mut claimed);
            }
        }

        debug_assert_eq!(graph.check_invariants(), Ok(()));
        graph
    }

    /// Create a network for the unassigned component around `start`.
    fn component_network(
        &mut self,
        start: Position,
        claimed: &mut BTreeSet<Position>,
    ) -> NetworkId {
        let capability = self
            .nodes
            .get(&start)
            .map(|n| n.capability)
            .unwrap_or_else(NodeCapability::standard_wire);
        let id = self.create_network(capability);
        let component = self.unassigned_component(start);
        claimed.extend(component.iter().copied());
        self.assign_component(id, &component);
        id
    }

    fn unassigned_component(&self, start: Position) -> BTreeSet<Position> {
        let mut visited = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(pos) = queue.pop_front() {
            let Some(node) = self.nodes.get(&pos) else {
                continue;
            };
            for next in node.connected_neighbors() {
                let unassigned = self.nodes.get(&next).is_some_and(|n| n.network.is_none());
                if unassigned && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        visited
    }
}
