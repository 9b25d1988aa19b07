//! Player state, inventory, and drop items (spec.md §3).

use crate::domain::constants::{INVENTORY_UPGRADE_PRICES, INVENTORY_UPGRADE_SLOTS, MAX_STACK_SIZE};
use crate::domain::equipment::{vest_bonus_slots, EquipmentSlot, MIN_TIER};
use crate::domain::loot::ItemType;
use crate::world::store::Position;
use serde::{Deserialize, Serialize};

pub type PlayerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Equipment {
    pub shovel: u8,
    pub helmet: u8,
    pub vest: u8,
    pub torch: u8,
    pub rope: u8,
}

impl Equipment {
    pub fn starting() -> Self {
        Self { shovel: MIN_TIER, helmet: MIN_TIER, vest: MIN_TIER, torch: MIN_TIER, rope: MIN_TIER }
    }

    pub fn tier_of(&self, slot: EquipmentSlot) -> u8 {
        match slot {
            EquipmentSlot::Shovel => self.shovel,
            EquipmentSlot::Helmet => self.helmet,
            EquipmentSlot::Vest => self.vest,
            EquipmentSlot::Torch => self.torch,
            EquipmentSlot::Rope => self.rope,
        }
    }

    pub fn set_tier(&mut self, slot: EquipmentSlot, tier: u8) {
        match slot {
            EquipmentSlot::Shovel => self.shovel = tier,
            EquipmentSlot::Helmet => self.helmet = tier,
            EquipmentSlot::Vest => self.vest = tier,
            EquipmentSlot::Torch => self.torch = tier,
            EquipmentSlot::Rope => self.rope = tier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStack {
    pub item_type: ItemType,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<InventoryStack>>,
    pub upgrade_level: u8,
}

impl Inventory {
    pub fn new() -> Self {
        let base_slots = INVENTORY_UPGRADE_SLOTS[0] as usize;
        Self { slots: vec![None; base_slots], upgrade_level: 0 }
    }

    pub fn base_slot_count(&self) -> usize {
        INVENTORY_UPGRADE_SLOTS[self.upgrade_level as usize] as usize
    }

    pub fn slots(&self) -> &[Option<InventoryStack>] {
        &self.slots
    }

    /// Capacity checks count the vest's bonus slots as extra indices
    /// beyond the base length; the underlying slot vector is never
    /// resized for equipment (spec.md §4.5).
    pub fn used_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn capacity(&self, vest_tier: u8) -> usize {
        self.base_slot_count() + vest_bonus_slots(vest_tier) as usize
    }

    pub fn has_room(&self, vest_tier: u8) -> bool {
        self.used_slots() < self.capacity(vest_tier)
    }

    pub fn quantity_of(&self, item_type: ItemType) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.item_type == item_type)
            .map(|s| s.quantity)
            .sum()
    }

    /// Adds items, stacking into existing partial stacks first, then
    /// opening new slots up to `capacity`. Returns the quantity that
    /// didn't fit.
    pub fn add(&mut self, item_type: ItemType, quantity: u32, vest_tier: u8) -> u32 {
        let mut remaining = quantity;

        for slot in self.slots.iter_mut().flatten() {
            if slot.item_type == item_type && slot.quantity < MAX_STACK_SIZE {
                let room = MAX_STACK_SIZE - slot.quantity;
                let take = room.min(remaining);
                slot.quantity += take;
                remaining -= take;
                if remaining == 0 {
                    return 0;
                }
            }
        }

        while remaining > 0 && self.used_slots() < self.capacity(vest_tier) {
            let take = remaining.min(MAX_STACK_SIZE);
            if let Some(empty) = self.slots.iter_mut().find(|s| s.is_none()) {
                *empty = Some(InventoryStack { item_type, quantity: take });
            } else {
                self.slots.push(Some(InventoryStack { item_type, quantity: take }));
            }
            remaining -= take;
        }

        remaining
    }

    /// Removes up to `quantity` of `item_type`, LIFO within slots of
    /// that type (spec.md §4.5 "applying the result"). Returns the
    /// quantity actually removed.
    pub fn remove_up_to(&mut self, item_type: ItemType, quantity: u32) -> u32 {
        let mut remaining = quantity;
        for slot in self.slots.iter_mut().rev() {
            if remaining == 0 {
                break;
            }
            let empty_after = if let Some(stack) = slot {
                if stack.item_type != item_type {
                    continue;
                }
                let take = stack.quantity.min(remaining);
                stack.quantity -= take;
                remaining -= take;
                stack.quantity == 0
            } else {
                false
            };
            if empty_after {
                *slot = None;
            }
        }
        quantity - remaining
    }

    /// Removes a fixed number of randomly chosen non-empty slots'
    /// single units (cave-in item loss). Returns the items removed.
    pub fn remove_random_items(&mut self, count: usize, rng: &mut crate::rng::DeterministicRng) -> Vec<ItemType> {
        let mut removed = Vec::new();
        for _ in 0..count {
            let occupied: Vec<usize> = self
                .slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_some())
                .map(|(i, _)| i)
                .collect();
            if occupied.is_empty() {
                break;
            }
            let idx = occupied[rng.next_below(occupied.len() as u32) as usize];
            if let Some(stack) = &mut self.slots[idx] {
                removed.push(stack.item_type);
                stack.quantity -= 1;
                if stack.quantity == 0 {
                    self.slots[idx] = None;
                }
            }
        }
        removed
    }

    pub fn non_empty_entries(&self) -> Vec<InventoryStack> {
        self.slots.iter().flatten().copied().collect()
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

pub fn inventory_upgrade_price(next_level: u8) -> Option<u64> {
    INVENTORY_UPGRADE_PRICES.get(next_level as usize).copied()
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: PlayerId,
    pub display_name: String,
    pub position: Position,
    pub gold: u64,
    pub equipment: Equipment,
    pub inventory: Inventory,
    pub max_depth_reached: i64,
    pub checkpoints: Vec<i64>,
    pub is_stunned: bool,
    pub stun_end_millis: u64,
    pub is_on_surface: bool,

    /// Torch reads as tier 0 (radius 0) until this timestamp passes.
    pub gas_blanked_until_millis: u64,
    /// Remaining destroyed blocks affected by the active rock-slide
    /// hardness bonus.
    pub rock_slide_blocks_remaining: u32,

    pub total_blocks_mined: u64,
    pub total_gold_earned: u64,
    pub total_explosions: u64,
}

impl PlayerState {
    pub fn new(id: PlayerId, display_name: String, spawn: Position) -> Self {
        Self {
            id,
            display_name,
            position: spawn,
            gold: 0,
            equipment: Equipment::starting(),
            inventory: Inventory::new(),
            max_depth_reached: 0,
            checkpoints: Vec::new(),
            is_stunned: false,
            stun_end_millis: 0,
            is_on_surface: true,
            gas_blanked_until_millis: 0,
            rock_slide_blocks_remaining: 0,
            total_blocks_mined: 0,
            total_gold_earned: 0,
            total_explosions: 0,
        }
    }

    pub fn effective_torch_tier(&self, now_millis: u64) -> u8 {
        if now_millis < self.gas_blanked_until_millis {
            0
        } else {
            self.equipment.torch
        }
    }

    pub fn record_depth(&mut self, y: i64) {
        if y > self.max_depth_reached {
            self.max_depth_reached = y;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOwner {
    Unclaimed,
    Claimed(u64), // never constructed with a player id directly; see DropItem
}

#[derive(Debug, Clone)]
pub struct DropItem {
    pub id: String,
    pub item_type: ItemType,
    pub position: Position,
    pub collected_by: Option<PlayerId>,
    pub spawned_at_millis: u64,
}

impl DropItem {
    pub fn is_expired(&self, now_millis: u64, ttl_millis: u64) -> bool {
        now_millis.saturating_sub(self.spawned_at_millis) >= ttl_millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_remove_round_trips_quantity() {
        let mut inv = Inventory::new();
        inv.add(ItemType::Dirt, 10, 1);
        assert_eq!(inv.quantity_of(ItemType::Dirt), 10);
        let removed = inv.remove_up_to(ItemType::Dirt, 7);
        assert_eq!(removed, 7);
        assert_eq!(inv.quantity_of(ItemType::Dirt), 3);
    }

    #[test]
    fn capacity_includes_vest_bonus_slots_without_resizing() {
        let inv = Inventory::new();
        let base = inv.base_slot_count();
        assert_eq!(inv.capacity(1), base);
        assert_eq!(inv.capacity(7), base + 6);
        assert_eq!(inv.slots().len(), base);
    }

    #[test]
    fn add_respects_max_stack_size() {
        let mut inv = Inventory::new();
        let leftover = inv.add(ItemType::Dirt, MAX_STACK_SIZE + 5, 1);
        assert_eq!(inv.quantity_of(ItemType::Dirt), MAX_STACK_SIZE + 5 - leftover);
        assert!(inv.slots().iter().flatten().all(|s| s.quantity <= MAX_STACK_SIZE));
    }
}
