//! Pure economy transitions (spec.md §4.5).
//!
//! Every function here takes a `&mut PlayerState` and returns a typed
//! result; none of them touch the network, the clock beyond what the
//! caller passes in, or the world. The `Shard` applies these and then
//! broadcasts the resulting state deltas.

use crate::domain::equipment::{upgrade_price, EquipmentSlot};
use crate::domain::loot::ItemType;
use crate::player::{inventory_upgrade_price, PlayerState};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EconomyError {
    #[error("player does not hold enough of that item")]
    InsufficientQuantity,
    #[error("player does not have enough gold")]
    InsufficientGold,
    #[error("equipment slot is already at maximum tier")]
    AlreadyMaxTier,
    #[error("inventory is already at maximum upgrade level")]
    AlreadyMaxUpgrade,
}

#[derive(Debug, Clone, Copy)]
pub struct SellReceipt {
    pub item_type: ItemType,
    pub quantity_sold: u32,
    pub gold_earned: u64,
}

/// Sells up to `quantity` of `item_type` from the player's inventory.
/// Fails outright (no partial sell) if the player doesn't hold at
/// least `quantity` (spec.md §8 scenario 4).
pub fn process_sell(
    player: &mut PlayerState,
    item_type: ItemType,
    quantity: u32,
) -> Result<SellReceipt, EconomyError> {
    if player.inventory.quantity_of(item_type) < quantity {
        return Err(EconomyError::InsufficientQuantity);
    }
    let removed = player.inventory.remove_up_to(item_type, quantity);
    debug_assert_eq!(removed, quantity);

    let gold_earned = item_type.unit_price() * quantity as u64;
    player.gold += gold_earned;
    player.total_gold_earned += gold_earned;

    Ok(SellReceipt { item_type, quantity_sold: quantity, gold_earned })
}

/// Upgrades one equipment slot by exactly one tier. Returns the new
/// tier and the gold price charged (spec.md §8 scenario 5).
pub fn process_equipment_purchase(
    player: &mut PlayerState,
    slot: EquipmentSlot,
) -> Result<(u8, u64), EconomyError> {
    let current_tier = player.equipment.tier_of(slot);
    let price = upgrade_price(slot, current_tier).ok_or(EconomyError::AlreadyMaxTier)?;
    if player.gold < price {
        return Err(EconomyError::InsufficientGold);
    }
    player.gold -= price;
    let new_tier = current_tier + 1;
    player.equipment.set_tier(slot, new_tier);
    Ok((new_tier, price))
}

/// Upgrades inventory capacity by exactly one level. Returns the new
/// level and the gold price charged.
pub fn process_inventory_upgrade(player: &mut PlayerState) -> Result<(u8, u64), EconomyError> {
    let next_level = player.inventory.upgrade_level + 1;
    let price = inventory_upgrade_price(next_level).ok_or(EconomyError::AlreadyMaxUpgrade)?;
    if player.gold < price {
        return Err(EconomyError::InsufficientGold);
    }
    player.gold -= price;
    player.inventory.upgrade_level = next_level;
    Ok((next_level, price))
}

/// Applies a TNT gold penalty and stun window (spec.md §4.3, §8
/// scenario 3). Gold never goes negative; the penalty simply clamps.
pub fn apply_tnt_penalty(player: &mut PlayerState, gold_penalty: u64, stun_end_millis: u64) {
    player.gold = player.gold.saturating_sub(gold_penalty);
    player.is_stunned = true;
    player.stun_end_millis = player.stun_end_millis.max(stun_end_millis);
    player.total_explosions += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::store::Position;

    fn player() -> PlayerState {
        PlayerState::new("p1".into(), "Guest".into(), Position { x: 0, y: 0 })
    }

    #[test]
    fn sell_fails_without_enough_items() {
        let mut p = player();
        let err = process_sell(&mut p, ItemType::GoldOre, 3).unwrap_err();
        assert_eq!(err, EconomyError::InsufficientQuantity);
    }

    #[test]
    fn sell_credits_gold_and_removes_items() {
        let mut p = player();
        p.inventory.add(ItemType::GoldOre, 3, p.equipment.vest);
        let receipt = process_sell(&mut p, ItemType::GoldOre, 3).unwrap();
        assert_eq!(receipt.gold_earned, 240); // matches spec.md §8 scenario 4
        assert_eq!(p.gold, 240);
        assert_eq!(p.inventory.quantity_of(ItemType::GoldOre), 0);
    }

    #[test]
    fn equipment_purchase_requires_gold() {
        let mut p = player();
        let err = process_equipment_purchase(&mut p, EquipmentSlot::Shovel).unwrap_err();
        assert_eq!(err, EconomyError::InsufficientGold);
    }

    #[test]
    fn equipment_purchase_matches_scenario_five() {
        let mut p = player();
        p.gold = 50;
        let (new_tier, price) = process_equipment_purchase(&mut p, EquipmentSlot::Shovel).unwrap();
        assert_eq!(new_tier, 2);
        assert_eq!(price, 50);
        assert_eq!(p.gold, 0);
    }

    #[test]
    fn inventory_upgrade_rejects_past_max_level() {
        let mut p = player();
        p.inventory.upgrade_level = 5;
        p.gold = 1_000_000;
        let err = process_inventory_upgrade(&mut p).unwrap_err();
        assert_eq!(err, EconomyError::AlreadyMaxUpgrade);
    }

    #[test]
    fn tnt_penalty_never_drives_gold_negative() {
        let mut p = player();
        p.gold = 10;
        apply_tnt_penalty(&mut p, 500, 1_500);
        assert_eq!(p.gold, 0);
        assert!(p.is_stunned);
        assert_eq!(p.total_explosions, 1);
    }
}
