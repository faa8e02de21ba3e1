//! Resource kinds and the opaque container contract.
//!
//! Machines store energy and fluids in containers the core never looks
//! inside. Everything here is expressed through four primitives: `amount`,
//! `capacity`, `insert` (returns the rejected part) and `extract` (returns
//! the part actually removed).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::id::FluidId;
use crate::position::Position;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// The transport medium a conduit carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Medium {
    Energy,
    Fluid,
}

/// A concrete resource moved through networks and stored in containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Energy,
    Fluid(FluidId),
}

impl ResourceKind {
    pub fn medium(self) -> Medium {
        match self {
            ResourceKind::Energy => Medium::Energy,
            ResourceKind::Fluid(_) => Medium::Fluid,
        }
    }
}

/// Whether a container operation commits or only reports what would happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Simulation {
    Simulate,
    Act,
}

impl Simulation {
    pub fn is_act(self) -> bool {
        self == Simulation::Act
    }
}

// ---------------------------------------------------------------------------
// Container contract
// ---------------------------------------------------------------------------

/// An opaque resource store (energy buffer, fluid tank, gas canister).
pub trait ResourceContainer {
    /// Current stored amount.
    fn amount(&self) -> u64;

    /// Maximum storable amount.
    fn capacity(&self) -> u64;

    /// Whether this container can hold the given kind at all.
    fn accepts(&self, kind: ResourceKind) -> bool;

    /// Insert up to `amount`. Returns the amount that did not fit.
    #[must_use = "the rejected amount must be kept by the caller"]
    fn insert(&mut self, amount: u64, simulation: Simulation) -> u64;

    /// Extract up to `amount`. Returns the amount actually removed.
    #[must_use = "returns the amount actually extracted, which may be less than requested"]
    fn extract(&mut self, amount: u64, simulation: Simulation) -> u64;

    fn space(&self) -> u64 {
        self.capacity().saturating_sub(self.amount())
    }

    fn is_empty(&self) -> bool {
        self.amount() == 0
    }

    /// True if `amount` could be extracted in full right now.
    fn can_extract(&mut self, amount: u64) -> bool {
        self.extract(amount, Simulation::Simulate) == amount
    }
}

impl<T: ResourceContainer + ?Sized> ResourceContainer for Box<T> {
    fn amount(&self) -> u64 {
        (**self).amount()
    }

    fn capacity(&self) -> u64 {
        (**self).capacity()
    }

    fn accepts(&self, kind: ResourceKind) -> bool {
        (**self).accepts(kind)
    }

    fn insert(&mut self, amount: u64, simulation: Simulation) -> u64 {
        (**self).insert(amount, simulation)
    }

    fn extract(&mut self, amount: u64, simulation: Simulation) -> u64 {
        (**self).extract(amount, simulation)
    }
}

/// Looks up the container hosted at a grid position.
///
/// Routing resolves consumer endpoints through this trait so the network
/// never owns machine storage.
pub trait ContainerAccess {
    fn container_mut(&mut self, pos: Position) -> Option<&mut dyn ResourceContainer>;
}

impl<C: ResourceContainer> ContainerAccess for BTreeMap<Position, C> {
    fn container_mut(&mut self, pos: Position) -> Option<&mut dyn ResourceContainer> {
        self.get_mut(&pos).map(|c| c as &mut dyn ResourceContainer)
    }
}

impl<C: ResourceContainer> ContainerAccess for HashMap<Position, C> {
    fn container_mut(&mut self, pos: Position) -> Option<&mut dyn ResourceContainer> {
        self.get_mut(&pos).map(|c| c as &mut dyn ResourceContainer)
    }
}

// ---------------------------------------------------------------------------
// ResourceBuffer
// ---------------------------------------------------------------------------

/// A bounded single-kind store with per-call insert/extract rate limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBuffer {
    pub kind: ResourceKind,
    /// Current amount. Clamped to [0, capacity].
    pub amount: u64,
    pub capacity: u64,
    /// Maximum accepted per `insert` call.
    pub max_insert: u64,
    /// Maximum removed per `extract` call.
    pub max_extract: u64,
}

impl ResourceBuffer {
    /// An empty buffer with unlimited per-call rates.
    pub fn new(kind: ResourceKind, capacity: u64) -> Self {
        Self {
            kind,
            amount: 0,
            capacity,
            max_insert: u64::MAX,
            max_extract: u64::MAX,
        }
    }

    pub fn energy(capacity: u64) -> Self {
        Self::new(ResourceKind::Energy, capacity)
    }

    pub fn fluid(fluid: FluidId, capacity: u64) -> Self {
        Self::new(ResourceKind::Fluid(fluid), capacity)
    }

    pub fn with_rates(mut self, max_insert: u64, max_extract: u64) -> Self {
        self.max_insert = max_insert;
        self.max_extract = max_extract;
        self
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = amount.min(self.capacity);
        self
    }
}

impl ResourceContainer for ResourceBuffer {
    fn amount(&self) -> u64 {
        self.amount
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn accepts(&self, kind: ResourceKind) -> bool {
        self.kind == kind
    }

    fn insert(&mut self, amount: u64, simulation: Simulation) -> u64 {
        let accepted = amount.min(self.max_insert).min(self.space());
        if simulation.is_act() {
            self.amount += accepted;
        }
        amount - accepted
    }

    fn extract(&mut self, amount: u64, simulation: Simulation) -> u64 {
        let removed = amount.min(self.max_extract).min(self.amount);
        if simulation.is_act() {
            self.amount -= removed;
        }
        removed
    }
}

// ---------------------------------------------------------------------------
// InfiniteSource
// ---------------------------------------------------------------------------

/// A creative-mode store: always full, never drained, swallows any insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfiniteSource;

impl InfiniteSource {
    pub const REPORTED_AMOUNT: u64 = 1_000_000;
}

impl ResourceContainer for InfiniteSource {
    fn amount(&self) -> u64 {
        Self::REPORTED_AMOUNT
    }

    fn capacity(&self) -> u64 {
        Self::REPORTED_AMOUNT
    }

    fn accepts(&self, _kind: ResourceKind) -> bool {
        true
    }

    fn insert(&mut self, _amount: u64, _simulation: Simulation) -> u64 {
        0
    }

    fn extract(&mut self, amount: u64, _simulation: Simulation) -> u64 {
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oxygen() -> ResourceKind {
        ResourceKind::Fluid(FluidId(0))
    }

    #[test]
    fn buffer_insert_returns_overflow() {
        let mut buf = ResourceBuffer::energy(100);
        assert_eq!(buf.insert(60, Simulation::Act), 0);
        assert_eq!(buf.insert(60, Simulation::Act), 20);
        assert_eq!(buf.amount(), 100);
        assert_eq!(buf.space(), 0);
    }

    #[test]
    fn buffer_simulate_does_not_mutate() {
        let mut buf = ResourceBuffer::energy(100).with_amount(30);
        assert_eq!(buf.insert(100, Simulation::Simulate), 30);
        assert_eq!(buf.extract(50, Simulation::Simulate), 30);
        assert_eq!(buf.amount(), 30);
    }

    #[test]
    fn buffer_rate_limits_apply_per_call() {
        let mut buf = ResourceBuffer::energy(1000).with_rates(10, 4);
        assert_eq!(buf.insert(25, Simulation::Act), 15);
        assert_eq!(buf.amount(), 10);
        assert_eq!(buf.extract(25, Simulation::Act), 4);
        assert_eq!(buf.amount(), 6);
    }

    #[test]
    fn buffer_accepts_only_its_kind() {
        let tank = ResourceBuffer::fluid(FluidId(0), 10);
        assert!(tank.accepts(oxygen()));
        assert!(!tank.accepts(ResourceKind::Fluid(FluidId(1))));
        assert!(!tank.accepts(ResourceKind::Energy));
    }

    #[test]
    fn can_extract_checks_full_amount() {
        let mut buf = ResourceBuffer::energy(100).with_amount(40);
        assert!(buf.can_extract(40));
        assert!(!buf.can_extract(41));
        assert_eq!(buf.amount(), 40);
    }

    #[test]
    fn infinite_source_never_drains() {
        let mut src = InfiniteSource;
        assert_eq!(src.extract(5_000, Simulation::Act), 5_000);
        assert_eq!(src.insert(5_000, Simulation::Act), 0);
        assert_eq!(src.amount(), InfiniteSource::REPORTED_AMOUNT);
    }

    #[test]
    fn container_access_resolves_boxed_containers() {
        let mut map: BTreeMap<Position, Box<dyn ResourceContainer>> = BTreeMap::new();
        map.insert(Position::ORIGIN, Box::new(ResourceBuffer::energy(10)));
        let c = map.container_mut(Position::ORIGIN).unwrap();
        assert_eq!(c.insert(4, Simulation::Act), 0);
        assert!(map.container_mut(Position::new(1, 0, 0)).is_none());
        assert_eq!(map[&Position::ORIGIN].amount(), 4);
    }

    #[test]
    fn kind_medium() {
        assert_eq!(ResourceKind::Energy.medium(), Medium::Energy);
        assert_eq!(oxygen().medium(), Medium::Fluid);
    }
}
