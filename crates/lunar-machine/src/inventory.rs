use std::collections::BTreeMap;

use lunar_core::id::ItemId;
use serde::{Deserialize, Serialize};

/// A quantity of one item type, as named by a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemAmount {
    pub item: ItemId,
    pub quantity: u32,
}

impl ItemAmount {
    pub fn new(item: ItemId, quantity: u32) -> Self {
        Self { item, quantity }
    }
}

/// A stack of fungible items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemId,
    pub quantity: u32,
}

/// A bounded slot holding stacks of any item types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    pub stacks: Vec<ItemStack>,
    pub capacity: u32,
}

impl InventorySlot {
    pub fn new(capacity: u32) -> Self {
        Self {
            stacks: Vec::new(),
            capacity,
        }
    }

    /// Add items. Returns the amount that didn't fit.
    #[must_use = "overflow count indicates items that did not fit"]
    pub fn add(&mut self, item: ItemId, quantity: u32) -> u32 {
        let to_add = quantity.min(self.capacity.saturating_sub(self.total()));
        if to_add > 0 {
            match self.stacks.iter_mut().find(|s| s.item == item) {
                Some(stack) => stack.quantity += to_add,
                None => self.stacks.push(ItemStack {
                    item,
                    quantity: to_add,
                }),
            }
        }
        quantity - to_add
    }

    /// Remove items. Returns the amount actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn remove(&mut self, item: ItemId, quantity: u32) -> u32 {
        let Some(stack) = self.stacks.iter_mut().find(|s| s.item == item) else {
            return 0;
        };
        let removed = quantity.min(stack.quantity);
        stack.quantity -= removed;
        self.stacks.retain(|s| s.quantity > 0);
        removed
    }

    pub fn quantity(&self, item: ItemId) -> u32 {
        self.stacks
            .iter()
            .find(|s| s.item == item)
            .map_or(0, |s| s.quantity)
    }

    pub fn total(&self) -> u32 {
        self.stacks.iter().map(|s| s.quantity).sum()
    }

    pub fn has_space_for(&self, quantity: u32) -> bool {
        self.total().saturating_add(quantity) <= self.capacity
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// A machine's item storage: input slots fed by players and automation,
/// output slots filled by finished operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub input_slots: Vec<InventorySlot>,
    pub output_slots: Vec<InventorySlot>,
}

impl Inventory {
    pub fn new(input_count: usize, output_count: usize, capacity: u32) -> Self {
        Self {
            input_slots: (0..input_count).map(|_| InventorySlot::new(capacity)).collect(),
            output_slots: (0..output_count).map(|_| InventorySlot::new(capacity)).collect(),
        }
    }

    /// Items of `item` across all input slots.
    pub fn available(&self, item: ItemId) -> u32 {
        self.input_slots.iter().map(|s| s.quantity(item)).sum()
    }

    /// Items of `item` across all output slots.
    pub fn produced(&self, item: ItemId) -> u32 {
        self.output_slots.iter().map(|s| s.quantity(item)).sum()
    }

    /// Put items into the input slots, first slot first. Returns overflow.
    #[must_use = "overflow count indicates items that did not fit"]
    pub fn insert_input(&mut self, item: ItemId, quantity: u32) -> u32 {
        add_across(&mut self.input_slots, item, quantity)
    }

    /// Take finished items out of the output slots.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn take_output(&mut self, item: ItemId, quantity: u32) -> u32 {
        remove_across(&mut self.output_slots, item, quantity)
    }

    pub fn has_inputs(&self, inputs: &[ItemAmount]) -> bool {
        totals(inputs)
            .into_iter()
            .all(|(item, needed)| self.available(item) >= needed)
    }

    /// Remove every input, or nothing if any is short.
    pub fn take_inputs(&mut self, inputs: &[ItemAmount]) -> bool {
        if !self.has_inputs(inputs) {
            return false;
        }
        for (item, needed) in totals(inputs) {
            let taken = remove_across(&mut self.input_slots, item, needed);
            debug_assert_eq!(taken, needed);
        }
        true
    }

    pub fn fits_outputs(&self, outputs: &[ItemAmount]) -> bool {
        let mut trial = self.output_slots.clone();
        outputs
            .iter()
            .all(|o| add_across(&mut trial, o.item, o.quantity) == 0)
    }

    /// Store every output, or nothing if they don't all fit.
    pub fn store_outputs(&mut self, outputs: &[ItemAmount]) -> bool {
        if !self.fits_outputs(outputs) {
            return false;
        }
        for o in outputs {
            let overflow = add_across(&mut self.output_slots, o.item, o.quantity);
            debug_assert_eq!(overflow, 0);
        }
        true
    }
}

/// Per-item totals, merging repeated entries.
fn totals(amounts: &[ItemAmount]) -> BTreeMap<ItemId, u32> {
    let mut out = BTreeMap::new();
    for a in amounts {
        *out.entry(a.item).or_insert(0) += a.quantity;
    }
    out
}

fn add_across(slots: &mut [InventorySlot], item: ItemId, mut quantity: u32) -> u32 {
    for slot in slots {
        if quantity == 0 {
            break;
        }
        quantity = slot.add(item, quantity);
    }
    quantity
}

fn remove_across(slots: &mut [InventorySlot], item: ItemId, quantity: u32) -> u32 {
    let mut removed = 0;
    for slot in slots {
        if removed == quantity {
            break;
        }
        removed += slot.remove(item, quantity - removed);
    }
    removed
}
