use lunar_core::position::{Direction, Position};

use crate::network::NetworkId;

/// Errors returned by fallible graph edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("position {0:?} is already occupied by a node or endpoint")]
    Occupied(Position),
    #[error("no node or endpoint at {0:?}")]
    UnknownPosition(Position),
}

/// A broken topology invariant, as reported by
/// [`ConnectivityGraph::check_invariants`](crate::graph::ConnectivityGraph::check_invariants).
///
/// These indicate a bug in the graph, never a bad request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyViolation {
    #[error("node at {0:?} has no network")]
    OrphanNode(Position),
    #[error("node at {pos:?} points at missing or removed network {network:?}")]
    DeadNetwork { pos: Position, network: NetworkId },
    #[error("node at {pos:?} is not a member of its network {network:?}")]
    NotAMember { pos: Position, network: NetworkId },
    #[error("network {network:?} lists {pos:?}, which is not one of its nodes")]
    StaleMember { pos: Position, network: NetworkId },
    #[error("live network {0:?} is empty")]
    EmptyNetwork(NetworkId),
    #[error("connection from {pos:?} towards {direction:?} is not mirrored")]
    AsymmetricConnection { pos: Position, direction: Direction },
    #[error("nodes {from:?} and {to:?} are connected but incompatible or in different networks")]
    InvalidConnection { from: Position, to: Position },
    #[error("network {network:?} reaches {reached} of {members} members")]
    Disconnected {
        network: NetworkId,
        reached: usize,
        members: usize,
    },
    #[error("node at {pos:?} does not share network {network:?}'s capability")]
    CapabilityMismatch { pos: Position, network: NetworkId },
    #[error("consumer cache of network {0:?} is out of date")]
    StaleConsumers(NetworkId),
}
