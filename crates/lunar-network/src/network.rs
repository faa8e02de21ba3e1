//! Per-network aggregate state and the routing algorithm.
//!
//! A [`NetworkState`] is one connected component of compatible nodes. It
//! holds member positions (the nodes themselves live in the graph), the
//! consumer endpoints reachable through those members, and the transfer cap.
//!
//! # Routing
//!
//! [`NetworkState::insert`] splits an amount evenly across consumers in
//! ascending [`Position`] order. Within a pass every consumer is offered
//! `remaining / consumers_left` (integer division) and the last one is
//! offered what is left. A consumer that takes less than its offer is full
//! and sits out later passes. Passes repeat while something is accepted, up
//! to one pass per consumer.

use std::collections::{BTreeMap, BTreeSet};

use lunar_core::conduit::NodeCapability;
use lunar_core::position::Position;
use lunar_core::resource::{ContainerAccess, Medium, ResourceKind, Simulation};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a network in the graph's arena.
    pub struct NetworkId;
}

// ---------------------------------------------------------------------------
// NetworkState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkState {
    pub(crate) id: NetworkId,
    /// Creation order. Breaks merge ties.
    pub(crate) ordinal: u64,
    /// Shared by every member; only compatible nodes connect.
    pub(crate) capability: NodeCapability,
    pub(crate) members: BTreeSet<Position>,
    /// Consumer endpoint -> number of member faces feeding it.
    pub(crate) consumers: BTreeMap<Position, u32>,
    pub(crate) removed: bool,
}

impl NetworkState {
    pub(crate) fn new(id: NetworkId, ordinal: u64, capability: NodeCapability) -> Self {
        Self {
            id,
            ordinal,
            capability,
            members: BTreeSet::new(),
            consumers: BTreeMap::new(),
            removed: false,
        }
    }

    pub fn id(&self) -> NetworkId {
        self.id
    }

    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    pub fn medium(&self) -> Medium {
        self.capability.medium
    }

    pub fn capability(&self) -> NodeCapability {
        self.capability
    }

    /// Maximum amount routed per insert. The minimum cap over members.
    pub fn cap(&self) -> u64 {
        self.capability.cap
    }

    /// Every member position in ascending order.
    pub fn members(&self) -> &BTreeSet<Position> {
        &self.members
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.members.contains(&pos)
    }

    /// Consumer endpoint positions in ascending order.
    pub fn consumers(&self) -> impl Iterator<Item = Position> + '_ {
        self.consumers.keys().copied()
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn marked_for_removal(&self) -> bool {
        self.removed
    }

    /// Empties the network and flags it for [`collect_removed`].
    ///
    /// [`collect_removed`]: crate::graph::ConnectivityGraph::collect_removed
    pub fn mark_for_removal(&mut self) {
        self.members.clear();
        self.consumers.clear();
        self.removed = true;
    }

    // -----------------------------------------------------------------------
    // Membership bookkeeping (graph-internal)
    // -----------------------------------------------------------------------

    pub(crate) fn add_member(&mut self, pos: Position, consumers: impl Iterator<Item = Position>) {
        self.members.insert(pos);
        for c in consumers {
            self.add_consumer_link(c);
        }
    }

    pub(crate) fn remove_member(
        &mut self,
        pos: Position,
        consumers: impl Iterator<Item = Position>,
    ) {
        self.members.remove(&pos);
        for c in consumers {
            self.remove_consumer_link(c);
        }
    }

    pub(crate) fn add_consumer_link(&mut self, endpoint: Position) {
        *self.consumers.entry(endpoint).or_insert(0) += 1;
    }

    pub(crate) fn remove_consumer_link(&mut self, endpoint: Position) {
        if let Some(count) = self.consumers.get_mut(&endpoint) {
            *count -= 1;
            if *count == 0 {
                self.consumers.remove(&endpoint);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Route `amount` of `kind`, entering at member `from`, to this
    /// network's consumers. Returns the amount that was not delivered.
    ///
    /// A `from` that is not a member, or a kind of the wrong medium, rejects
    /// everything. Anything above [`cap`](Self::cap) is rejected.
    pub fn insert<A: ContainerAccess + ?Sized>(
        &self,
        from: Position,
        amount: u64,
        kind: ResourceKind,
        containers: &mut A,
        simulation: Simulation,
    ) -> u64 {
        self.route(from, amount, kind, containers, simulation, None)
    }

    /// As [`insert`](Self::insert), but never delivers to `source`, the
    /// endpoint the resource came from.
    pub fn insert_from_endpoint<A: ContainerAccess + ?Sized>(
        &self,
        source: Position,
        from: Position,
        amount: u64,
        kind: ResourceKind,
        containers: &mut A,
        simulation: Simulation,
    ) -> u64 {
        self.route(from, amount, kind, containers, simulation, Some(source))
    }

    fn route<A: ContainerAccess + ?Sized>(
        &self,
        from: Position,
        amount: u64,
        kind: ResourceKind,
        containers: &mut A,
        simulation: Simulation,
        exclude: Option<Position>,
    ) -> u64 {
        if amount == 0 {
            return 0;
        }
        if self.removed || !self.members.contains(&from) {
            log::warn!("insert at {from:?} rejected: not a member of network {:?}", self.id);
            return amount;
        }
        if kind.medium() != self.medium() {
            log::warn!(
                "insert of {kind:?} rejected: network {:?} carries {:?}",
                self.id,
                self.medium()
            );
            return amount;
        }

        let budget = amount.min(self.cap());
        let mut active: Vec<Position> = self
            .consumers
            .keys()
            .copied()
            .filter(|p| Some(*p) != exclude)
            .filter(|p| {
                containers
                    .container_mut(*p)
                    .is_some_and(|c| c.accepts(kind))
            })
            .collect();

        // Per-consumer running total, used so simulated passes see earlier
        // simulated deliveries.
        let mut delivered: BTreeMap<Position, u64> = BTreeMap::new();
        let mut remaining = budget;
        let max_passes = active.len();
        let mut passes = 0;

        while remaining > 0 && !active.is_empty() && passes < max_passes {
            passes += 1;
            let mut still_accepting = Vec::with_capacity(active.len());
            let mut progressed = false;
            let pass_size = active.len();

            for (i, pos) in active.iter().copied().enumerate() {
                let left = (pass_size - i) as u64;
                let offer = if left == 1 { remaining } else { remaining / left };
                if offer == 0 {
                    still_accepting.push(pos);
                    continue;
                }
                let Some(container) = containers.container_mut(pos) else {
                    continue;
                };
                let accepted = match simulation {
                    Simulation::Act => offer - container.insert(offer, Simulation::Act),
                    Simulation::Simulate => {
                        let prior = delivered.get(&pos).copied().unwrap_or(0);
                        let total = prior + offer;
                        let fits = total - container.insert(total, Simulation::Simulate);
                        fits.saturating_sub(prior).min(offer)
                    }
                };
                if accepted > 0 {
                    *delivered.entry(pos).or_insert(0) += accepted;
                    remaining -= accepted;
                    progressed = true;
                }
                if accepted == offer {
                    still_accepting.push(pos);
                }
            }

            log::trace!(
                "network {:?} pass {passes}: {} consumers, {remaining} left",
                self.id,
                pass_size
            );
            if !progressed && still_accepting.len() == active.len() {
                break;
            }
            active = still_accepting;
        }

        amount - (budget - remaining)
    }
}
