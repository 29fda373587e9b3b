//! Trade fulfilment against a slot inventory.
//!
//! Matching always goes through [`TagBridge::equivalent_for_trading`], so a
//! plain diamond never pays for a tagged one.

use crate::{ClonePurpose, CloneOutcome, CloningEngine, ItemsError, Result, TagBridge};
use protrades_types::{ItemStack, Trade};
use tracing::debug;

/// Default stack limit per slot.
pub const DEFAULT_MAX_STACK: u32 = 64;

/// A fixed number of item slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
    max_stack: u32,
}

impl Inventory {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
            max_stack: DEFAULT_MAX_STACK,
        }
    }

    /// Sets the per-slot stack limit (at least 1).
    #[must_use]
    pub fn with_max_stack(mut self, max_stack: u32) -> Self {
        self.max_stack = max_stack.max(1);
        self
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Places an item directly into a slot, replacing its content.
    pub fn set_slot(&mut self, index: usize, item: Option<ItemStack>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = item.filter(|i| !i.is_air() && i.quantity() > 0);
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemStack> {
        self.slots.iter().flatten()
    }

    /// Total quantity of items equivalent to `template`.
    #[must_use]
    pub fn count_matching(&self, bridge: &TagBridge, template: &ItemStack) -> u64 {
        self.items()
            .filter(|item| bridge.equivalent_for_trading(item, template))
            .map(|item| u64::from(item.quantity()))
            .sum()
    }

    /// Whether every requirement can be paid at once. Requirements that are
    /// equivalent to each other draw from the same items and are summed.
    #[must_use]
    pub fn has_required_items(&self, bridge: &TagBridge, requirements: &[ItemStack]) -> bool {
        group_requirements(bridge, requirements)
            .iter()
            .all(|(template, needed)| self.count_matching(bridge, template) >= *needed)
    }

    /// Removes the requirements, or nothing at all.
    pub fn remove_required_items(
        &mut self,
        bridge: &TagBridge,
        requirements: &[ItemStack],
    ) -> Result<()> {
        if !self.has_required_items(bridge, requirements) {
            return Err(ItemsError::MissingInputs);
        }
        for (template, mut needed) in group_requirements(bridge, requirements) {
            for slot in &mut self.slots {
                if needed == 0 {
                    break;
                }
                let Some(item) = slot else { continue };
                if !bridge.equivalent_for_trading(item, &template) {
                    continue;
                }
                let take = needed.min(u64::from(item.quantity()));
                // take <= item.quantity(), which is a u32
                let remaining = item.quantity() - take as u32;
                needed -= take;
                if remaining == 0 {
                    *slot = None;
                } else {
                    item.set_quantity(remaining);
                }
            }
        }
        Ok(())
    }

    /// Adds `item`, topping up equivalent stacks before using empty slots.
    /// Fails without changes when it does not fit.
    pub fn add_item(&mut self, bridge: &TagBridge, item: ItemStack) -> Result<()> {
        if item.is_air() || item.quantity() == 0 {
            return Ok(());
        }
        let mut working = self.slots.clone();
        let mut left = item.quantity();

        for slot in working.iter_mut().flatten() {
            if left == 0 {
                break;
            }
            if slot.quantity() < self.max_stack && bridge.equivalent_for_trading(slot, &item) {
                let room = self.max_stack - slot.quantity();
                let moved = room.min(left);
                slot.set_quantity(slot.quantity() + moved);
                left -= moved;
            }
        }
        for slot in working.iter_mut().filter(|s| s.is_none()) {
            if left == 0 {
                break;
            }
            let moved = self.max_stack.min(left);
            *slot = Some(item.clone().with_quantity(moved));
            left -= moved;
        }

        if left > 0 {
            return Err(ItemsError::InventoryFull);
        }
        self.slots = working;
        Ok(())
    }
}

fn group_requirements(bridge: &TagBridge, requirements: &[ItemStack]) -> Vec<(ItemStack, u64)> {
    let mut groups: Vec<(ItemStack, u64)> = Vec::new();
    for req in requirements.iter().filter(|r| !r.is_air()) {
        match groups
            .iter_mut()
            .find(|(template, _)| bridge.equivalent_for_trading(template, req))
        {
            Some((_, total)) => *total += u64::from(req.quantity()),
            None => groups.push((req.clone(), u64::from(req.quantity()))),
        }
    }
    groups
}

/// Pays `trade`'s inputs from `inventory` and adds a clone of its output.
///
/// The inventory is left untouched when the inputs are missing or the
/// output does not fit. Returns the delivered clone.
pub fn execute_trade(
    engine: &CloningEngine,
    inventory: &mut Inventory,
    trade: &Trade,
) -> Result<CloneOutcome> {
    let bridge = engine.bridge();
    let mut working = inventory.clone();
    working.remove_required_items(bridge, trade.inputs())?;

    let outcome = engine.clone_item(trade.output(), ClonePurpose::Trade);
    working.add_item(bridge, outcome.item.clone())?;

    *inventory = working;
    debug!(trade = %trade.id(), output = %outcome.item, "trade executed");
    Ok(outcome)
}
