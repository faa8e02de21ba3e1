use std::collections::{BTreeMap, BTreeSet, VecDeque};

use lunar_core::automation::FaceConfig;
use lunar_core::conduit::NodeCapability;
use lunar_core::position::{Connections, Direction, Position};
use lunar_core::resource::{ContainerAccess, ResourceKind, Simulation};
use lunar_core::world::{BlockChange, BlockKind, BlockListener, World};
use slotmap::SlotMap;

use crate::error::{NetworkError, TopologyViolation};
use crate::network::{NetworkId, NetworkState};
use crate::node::{Endpoint, ResourceNode};

// ---------------------------------------------------------------------------
// Queued edits
// ---------------------------------------------------------------------------

/// A topology edit to be applied during the next `apply_edits` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEdit {
    AddNode {
        pos: Position,
        capability: NodeCapability,
        blocked: Connections,
    },
    RemoveNode(Position),
    SetBlockedFaces {
        pos: Position,
        faces: Connections,
    },
    AddEndpoint {
        pos: Position,
        faces: FaceConfig,
    },
    RemoveEndpoint(Position),
}

/// Result of applying queued edits.
#[derive(Debug, Default)]
pub struct EditResult {
    /// Number of edits applied successfully.
    pub applied: usize,
    /// Edits that were rejected, with the reason.
    pub failed: Vec<(GridEdit, NetworkError)>,
}

// ---------------------------------------------------------------------------
// ConnectivityGraph
// ---------------------------------------------------------------------------

/// Position -> node and node -> network mappings for one dimension.
///
/// Every public mutation leaves the graph satisfying
/// [`check_invariants`](Self::check_invariants); debug builds assert it.
/// Networks absorbed by a merge or replaced by a split stay in the arena,
/// marked for removal, until [`collect_removed`](Self::collect_removed).
#[derive(Debug, Clone, Default)]
pub struct ConnectivityGraph {
    pub(crate) nodes: BTreeMap<Position, ResourceNode>,
    pub(crate) endpoints: BTreeMap<Position, Endpoint>,
    pub(crate) networks: SlotMap<NetworkId, NetworkState>,
    pub(crate) next_ordinal: u64,
    edits: Vec<GridEdit>,
}

impl ConnectivityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    /// Place a node with every face open. See [`add_node_with`](Self::add_node_with).
    pub fn add_node(
        &mut self,
        pos: Position,
        capability: NodeCapability,
    ) -> Result<NetworkId, NetworkError> {
        self.add_node_with(pos, capability, Connections::NONE)
    }

    /// Place a node at `pos` and return the network it ends up in.
    ///
    /// The node links to every compatible neighbour whose facing side is
    /// open. When those neighbours span several networks they are merged.
    /// Re-adding the same capability only refreshes connections; a
    /// different capability replaces the node.
    pub fn add_node_with(
        &mut self,
        pos: Position,
        capability: NodeCapability,
        blocked: Connections,
    ) -> Result<NetworkId, NetworkError> {
        if self.endpoints.contains_key(&pos) {
            return Err(NetworkError::Occupied(pos));
        }
        if let Some(existing) = self.nodes.get_mut(&pos) {
            if existing.capability == capability {
                existing.blocked_faces = blocked;
                self.update_connections(pos)?;
                return self.network_of(pos).ok_or(NetworkError::UnknownPosition(pos));
            }
            self.remove_node(pos);
        }

        let mut node = ResourceNode::new(pos, capability).with_blocked_faces(blocked);
        let mut neighbor_networks = Vec::new();
        for dir in Direction::ALL {
            if !self.can_connect(&node, dir) {
                continue;
            }
            node.connections.set(dir, true);
            if let Some(id) = self.nodes.get(&pos.offset(dir)).and_then(|n| n.network) {
                if !neighbor_networks.contains(&id) {
                    neighbor_networks.push(id);
                }
            }
        }
        let (links, consumes) = self.endpoint_links_for(&node);
        node.endpoint_links = links;
        node.consumer_links = consumes;

        for dir in node.connections.iter() {
            if let Some(neighbor) = self.nodes.get_mut(&pos.offset(dir)) {
                neighbor.connections.set(dir.opposite(), true);
            }
        }

        let network = match self.merge(&neighbor_networks) {
            Some(id) => id,
            None => self.create_network(capability),
        };
        node.network = Some(network);
        let consumers: Vec<Position> = node.consumer_positions().collect();
        self.nodes.insert(pos, node);
        if let Some(state) = self.networks.get_mut(network) {
            state.add_member(pos, consumers.into_iter());
        }
        log::trace!("added node at {pos:?} to network {network:?}");

        self.debug_check();
        Ok(network)
    }

    /// Remove the node at `pos`, splitting its network if it was a cut
    /// vertex. Unknown positions are a no-op.
    pub fn remove_node(&mut self, pos: Position) -> Option<ResourceNode> {
        let node = self.nodes.remove(&pos)?;
        for dir in node.connections.iter() {
            if let Some(neighbor) = self.nodes.get_mut(&pos.offset(dir)) {
                neighbor.connections.set(dir.opposite(), false);
            }
        }

        if let Some(id) = node.network {
            if let Some(state) = self.networks.get_mut(id) {
                state.remove_member(pos, node.consumer_positions());
                if state.is_empty() {
                    state.mark_for_removal();
                    log::debug!("network {id:?} lost its last node at {pos:?}");
                } else {
                    let seeds: Vec<Position> = node.connected_neighbors().collect();
                    self.split_if_disconnected(id, &seeds);
                }
            }
        }
        log::trace!("removed node at {pos:?}");

        self.debug_check();
        Some(node)
    }

    /// Re-derive the connections of the node at `pos` from its current
    /// neighbours. Gained links merge networks; lost links may split them.
    pub fn update_connections(&mut self, pos: Position) -> Result<(), NetworkError> {
        let node = self
            .nodes
            .get(&pos)
            .ok_or(NetworkError::UnknownPosition(pos))?;
        let before = node.connections;
        let after: Connections = Direction::ALL
            .into_iter()
            .filter(|dir| self.can_connect(node, *dir))
            .collect();
        let (links, consumes) = self.endpoint_links_for(node);
        let old_consumes = node.consumer_links;
        let network = node.network;

        if let Some(node) = self.nodes.get_mut(&pos) {
            node.connections = after;
            node.endpoint_links = links;
            node.consumer_links = consumes;
        }
        for dir in Direction::ALL {
            let wanted = after.contains(dir);
            if before.contains(dir) != wanted {
                if let Some(neighbor) = self.nodes.get_mut(&pos.offset(dir)) {
                    neighbor.connections.set(dir.opposite(), wanted);
                }
            }
        }
        if let Some(id) = network {
            self.relink_consumers(id, pos, old_consumes, consumes);
        }

        // Merge first so the split search never crosses into a foreign network.
        for dir in after.iter().filter(|d| !before.contains(*d)) {
            let (a, b) = (self.network_of(pos), self.network_of(pos.offset(dir)));
            if let (Some(a), Some(b)) = (a, b) {
                if a != b {
                    self.merge(&[a, b]);
                }
            }
        }
        for dir in before.iter().filter(|d| !after.contains(*d)) {
            let other = pos.offset(dir);
            if let Some(id) = self.network_of(pos) {
                if self.network_of(other) == Some(id) {
                    self.split_if_disconnected(id, &[pos, other]);
                }
            }
        }

        self.debug_check();
        Ok(())
    }

    /// Close or open faces of the node at `pos`.
    pub fn set_blocked_faces(&mut self, pos: Position, faces: Connections) -> Result<(), NetworkError> {
        let node = self
            .nodes
            .get_mut(&pos)
            .ok_or(NetworkError::UnknownPosition(pos))?;
        node.blocked_faces = faces;
        self.update_connections(pos)
    }

    // -----------------------------------------------------------------------
    // Endpoints
    // -----------------------------------------------------------------------

    pub fn add_endpoint(&mut self, pos: Position, faces: FaceConfig) -> Result<(), NetworkError> {
        if self.nodes.contains_key(&pos) {
            return Err(NetworkError::Occupied(pos));
        }
        self.endpoints.insert(pos, Endpoint::new(pos, faces));
        self.relink_around(pos);
        self.debug_check();
        Ok(())
    }

    pub fn set_endpoint_faces(&mut self, pos: Position, faces: FaceConfig) -> Result<(), NetworkError> {
        let endpoint = self
            .endpoints
            .get_mut(&pos)
            .ok_or(NetworkError::UnknownPosition(pos))?;
        endpoint.faces = faces;
        self.relink_around(pos);
        self.debug_check();
        Ok(())
    }

    pub fn remove_endpoint(&mut self, pos: Position) -> Option<Endpoint> {
        let endpoint = self.endpoints.remove(&pos)?;
        self.relink_around(pos);
        self.debug_check();
        Some(endpoint)
    }

    // -----------------------------------------------------------------------
    // World notifications
    // -----------------------------------------------------------------------

    /// Reconcile `pos` with whatever the world now holds there.
    pub fn on_block_placed(&mut self, world: &dyn World, pos: Position) -> Result<(), NetworkError> {
        match world.block_at(pos) {
            BlockKind::Conduit {
                capability,
                blocked,
            } => {
                self.remove_endpoint(pos);
                self.add_node_with(pos, capability, blocked).map(|_| ())
            }
            BlockKind::Machine { faces } => {
                self.remove_node(pos);
                if self.endpoints.contains_key(&pos) {
                    self.set_endpoint_faces(pos, faces)
                } else {
                    self.add_endpoint(pos, faces)
                }
            }
            _ => {
                self.on_block_removed(pos);
                Ok(())
            }
        }
    }

    pub fn on_block_removed(&mut self, pos: Position) {
        if self.remove_node(pos).is_none() {
            self.remove_endpoint(pos);
        }
    }

    // -----------------------------------------------------------------------
    // Queued edits
    // -----------------------------------------------------------------------

    pub fn queue_edit(&mut self, edit: GridEdit) {
        self.edits.push(edit);
    }

    pub fn has_pending_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Apply all queued edits in order. Call at the start of a tick, before
    /// any routing.
    pub fn apply_edits(&mut self) -> EditResult {
        let edits = std::mem::take(&mut self.edits);
        let mut result = EditResult::default();

        for edit in edits {
            let outcome = match &edit {
                GridEdit::AddNode {
                    pos,
                    capability,
                    blocked,
                } => self.add_node_with(*pos, *capability, *blocked).map(|_| ()),
                GridEdit::RemoveNode(pos) => {
                    self.remove_node(*pos);
                    Ok(())
                }
                GridEdit::SetBlockedFaces { pos, faces } => self.set_blocked_faces(*pos, *faces),
                GridEdit::AddEndpoint { pos, faces } => self.add_endpoint(*pos, *faces),
                GridEdit::RemoveEndpoint(pos) => {
                    self.remove_endpoint(*pos);
                    Ok(())
                }
            };
            match outcome {
                Ok(()) => result.applied += 1,
                Err(e) => {
                    log::warn!("queued edit {edit:?} failed: {e}");
                    result.failed.push((edit, e));
                }
            }
        }

        result
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Route `amount` into the network of the node at `from`. Returns the
    /// rejected amount.
    pub fn insert<A: ContainerAccess + ?Sized>(
        &self,
        from: Position,
        amount: u64,
        kind: ResourceKind,
        containers: &mut A,
        simulation: Simulation,
    ) -> u64 {
        match self.network_of(from).and_then(|id| self.networks.get(id)) {
            Some(state) => state.insert(from, amount, kind, containers, simulation),
            None => {
                log::warn!("insert at {from:?} rejected: no node there");
                amount
            }
        }
    }

    /// Push `amount` out of the endpoint at `source` through its `face` into
    /// the linked node's network. The source never receives its own output.
    pub fn insert_from_endpoint<A: ContainerAccess + ?Sized>(
        &self,
        source: Position,
        face: Direction,
        amount: u64,
        kind: ResourceKind,
        containers: &mut A,
        simulation: Simulation,
    ) -> u64 {
        let from = source.offset(face);
        let linked = self.endpoints.contains_key(&source)
            && self
                .nodes
                .get(&from)
                .is_some_and(|n| n.endpoint_links.contains(face.opposite()));
        let state = self.network_of(from).and_then(|id| self.networks.get(id));
        match state {
            Some(state) if linked => {
                state.insert_from_endpoint(source, from, amount, kind, containers, simulation)
            }
            _ => {
                log::warn!("endpoint {source:?} has no linked node towards {face:?}");
                amount
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn node(&self, pos: Position) -> Option<&ResourceNode> {
        self.nodes.get(&pos)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    pub fn endpoint(&self, pos: Position) -> Option<&Endpoint> {
        self.endpoints.get(&pos)
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    pub fn network_of(&self, pos: Position) -> Option<NetworkId> {
        self.nodes.get(&pos).and_then(|n| n.network)
    }

    /// Look up a network, including ones marked for removal.
    pub fn network(&self, id: NetworkId) -> Option<&NetworkState> {
        self.networks.get(id)
    }

    /// Live networks, in arena order.
    pub fn networks(&self) -> impl Iterator<Item = &NetworkState> {
        self.networks.values().filter(|n| !n.removed)
    }

    pub fn network_count(&self) -> usize {
        self.networks().count()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Drop every network marked for removal from the arena. Returns their ids.
    pub fn collect_removed(&mut self) -> Vec<NetworkId> {
        let removed: Vec<NetworkId> = self
            .networks
            .iter()
            .filter(|(_, n)| n.removed)
            .map(|(id, _)| id)
            .collect();
        for id in &removed {
            self.networks.remove(*id);
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    /// Verify every topology invariant, returning the first violation.
    pub fn check_invariants(&self) -> Result<(), TopologyViolation> {
        for (&pos, node) in &self.nodes {
            let id = node.network.ok_or(TopologyViolation::OrphanNode(pos))?;
            let state = self
                .networks
                .get(id)
                .filter(|n| !n.removed)
                .ok_or(TopologyViolation::DeadNetwork { pos, network: id })?;
            if !state.contains(pos) {
                return Err(TopologyViolation::NotAMember { pos, network: id });
            }
            if state.capability != node.capability {
                return Err(TopologyViolation::CapabilityMismatch { pos, network: id });
            }
            for dir in node.connections.iter() {
                let other = pos.offset(dir);
                let Some(neighbor) = self.nodes.get(&other) else {
                    return Err(TopologyViolation::AsymmetricConnection { pos, direction: dir });
                };
                if !neighbor.connections.contains(dir.opposite()) {
                    return Err(TopologyViolation::AsymmetricConnection { pos, direction: dir });
                }
                if neighbor.network != node.network
                    || !neighbor.capability.is_compatible(&node.capability)
                {
                    return Err(TopologyViolation::InvalidConnection { from: pos, to: other });
                }
            }
            if self.endpoint_links_for(node) != (node.endpoint_links, node.consumer_links) {
                return Err(TopologyViolation::StaleConsumers(id));
            }
        }

        for (id, state) in &self.networks {
            if state.removed {
                continue;
            }
            let Some(&first) = state.members.first() else {
                return Err(TopologyViolation::EmptyNetwork(id));
            };
            for &pos in &state.members {
                if self.network_of(pos) != Some(id) {
                    return Err(TopologyViolation::StaleMember { pos, network: id });
                }
            }
            let reached = self.component_of(first, id).len();
            if reached != state.len() {
                return Err(TopologyViolation::Disconnected {
                    network: id,
                    reached,
                    members: state.len(),
                });
            }
            let mut expected: BTreeMap<Position, u32> = BTreeMap::new();
            for pos in &state.members {
                if let Some(node) = self.nodes.get(pos) {
                    for c in node.consumer_positions() {
                        *expected.entry(c).or_insert(0) += 1;
                    }
                }
            }
            if expected != state.consumers {
                return Err(TopologyViolation::StaleConsumers(id));
            }
        }
        Ok(())
    }

    fn debug_check(&self) {
        debug_assert_eq!(self.check_invariants(), Ok(()));
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Whether `node` would link to a node on its `dir` side.
    pub(crate) fn can_connect(&self, node: &ResourceNode, dir: Direction) -> bool {
        if node.blocked_faces.contains(dir) {
            return false;
        }
        self.nodes
            .get(&node.position.offset(dir))
            .is_some_and(|other| {
                !other.blocked_faces.contains(dir.opposite())
                    && other.capability.is_compatible(&node.capability)
            })
    }

    /// `(endpoint_links, consumer_links)` for `node` against current endpoints.
    pub(crate) fn endpoint_links_for(&self, node: &ResourceNode) -> (Connections, Connections) {
        let mut links = Connections::NONE;
        let mut consumes = Connections::NONE;
        for dir in Direction::ALL {
            if node.blocked_faces.contains(dir) {
                continue;
            }
            if let Some(endpoint) = self.endpoints.get(&node.position.offset(dir)) {
                let (linked, consumer) = endpoint.link_for(dir.opposite(), node.medium());
                links.set(dir, linked);
                consumes.set(dir, consumer);
            }
        }
        (links, consumes)
    }

    pub(crate) fn create_network(&mut self, capability: NodeCapability) -> NetworkId {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        let id = self
            .networks
            .insert_with_key(|id| NetworkState::new(id, ordinal, capability));
        log::debug!("created network {id:?} (ordinal {ordinal})");
        id
    }

    /// Merge `ids` into the one with the most members (lowest ordinal on a
    /// tie). Returns the survivor, or `None` if no id names a network.
    fn merge(&mut self, ids: &[NetworkId]) -> Option<NetworkId> {
        let survivor = ids
            .iter()
            .filter_map(|&id| self.networks.get(id).map(|n| (id, n.len(), n.ordinal)))
            .max_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)))
            .map(|(id, _, _)| id)?;

        for &loser in ids {
            if loser == survivor {
                continue;
            }
            let Some(state) = self.networks.get_mut(loser) else {
                continue;
            };
            if state.removed {
                continue;
            }
            let members = std::mem::take(&mut state.members);
            let consumers = std::mem::take(&mut state.consumers);
            state.mark_for_removal();

            for pos in &members {
                if let Some(node) = self.nodes.get_mut(pos) {
                    node.network = Some(survivor);
                }
            }
            let absorbed = members.len();
            if let Some(target) = self.networks.get_mut(survivor) {
                target.members.extend(members);
                for (endpoint, count) in consumers {
                    *target.consumers.entry(endpoint).or_insert(0) += count;
                }
            }
            log::debug!("merged network {loser:?} ({absorbed} nodes) into {survivor:?}");
        }
        Some(survivor)
    }

    /// Split network `id` if the `seeds` (former neighbours of a removed node
    /// or the two ends of a broken link) no longer reach each other. Every
    /// resulting component becomes a new network and `id` is retired.
    fn split_if_disconnected(&mut self, id: NetworkId, seeds: &[Position]) -> Vec<NetworkId> {
        let seeds: Vec<Position> = seeds
            .iter()
            .copied()
            .filter(|p| self.network_of(*p) == Some(id))
            .collect();
        if seeds.len() < 2 || self.reaches_all(seeds[0], &seeds[1..], id) {
            return Vec::new();
        }
        let Some(capability) = self.networks.get(id).map(|n| n.capability) else {
            return Vec::new();
        };

        let mut assigned: BTreeSet<Position> = BTreeSet::new();
        let mut created = Vec::new();
        for &seed in &seeds {
            if assigned.contains(&seed) {
                continue;
            }
            let component = self.component_of(seed, id);
            assigned.extend(component.iter().copied());
            let new_id = self.create_network(capability);
            self.assign_component(new_id, &component);
            created.push(new_id);
        }
        if let Some(old) = self.networks.get_mut(id) {
            old.mark_for_removal();
        }
        log::debug!("split network {id:?} into {} networks", created.len());
        created
    }

    /// BFS from `start` through connections, stopping once every target is
    /// reached.
    fn reaches_all(&self, start: Position, targets: &[Position], id: NetworkId) -> bool {
        let mut pending: BTreeSet<Position> = targets.iter().copied().collect();
        pending.remove(&start);
        if pending.is_empty() {
            return true;
        }
        let mut visited = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(pos) = queue.pop_front() {
            let Some(node) = self.nodes.get(&pos) else {
                continue;
            };
            for next in node.connected_neighbors() {
                if self.network_of(next) == Some(id) && visited.insert(next) {
                    if pending.remove(&next) && pending.is_empty() {
                        return true;
                    }
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// Every node reachable from `start` through connections within `id`.
    pub(crate) fn component_of(&self, start: Position, id: NetworkId) -> BTreeSet<Position> {
        let mut visited = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(pos) = queue.pop_front() {
            let Some(node) = self.nodes.get(&pos) else {
                continue;
            };
            for next in node.connected_neighbors() {
                if self.network_of(next) == Some(id) && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    pub(crate) fn assign_component(&mut self, id: NetworkId, component: &BTreeSet<Position>) {
        let mut consumers = Vec::new();
        for pos in component {
            if let Some(node) = self.nodes.get_mut(pos) {
                node.network = Some(id);
                consumers.extend(node.consumer_positions());
            }
        }
        if let Some(state) = self.networks.get_mut(id) {
            state.members.extend(component.iter().copied());
            for c in consumers {
                state.add_consumer_link(c);
            }
        }
    }

    fn relink_consumers(&mut self, id: NetworkId, pos: Position, old: Connections, new: Connections) {
        let Some(state) = self.networks.get_mut(id) else {
            return;
        };
        for dir in Direction::ALL {
            match (old.contains(dir), new.contains(dir)) {
                (true, false) => state.remove_consumer_link(pos.offset(dir)),
                (false, true) => state.add_consumer_link(pos.offset(dir)),
                _ => {}
            }
        }
    }

    /// Refresh the endpoint links of every node touching `endpoint`.
    fn relink_around(&mut self, endpoint: Position) {
        for (_, pos) in endpoint.neighbors() {
            let Some(node) = self.nodes.get(&pos) else {
                continue;
            };
            let (links, consumes) = self.endpoint_links_for(node);
            let old = node.consumer_links;
            let network = node.network;
            if let Some(node) = self.nodes.get_mut(&pos) {
                node.endpoint_links = links;
                node.consumer_links = consumes;
            }
            if let Some(id) = network {
                self.relink_consumers(id, pos, old, consumes);
            }
        }
    }
}

impl BlockListener for ConnectivityGraph {
    fn block_changed(&mut self, world: &dyn World, pos: Position, change: BlockChange) {
        let result = match change {
            BlockChange::Placed | BlockChange::StateChanged => self.on_block_placed(world, pos),
            BlockChange::Removed => {
                self.on_block_removed(pos);
                Ok(())
            }
        };
        if let Err(e) = result {
            log::warn!("ignoring block change at {pos:?}: {e}");
        }
    }
}
