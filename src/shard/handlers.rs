//! Per-command-type handlers (spec.md §4.8). Each returns the ordered
//! pair `(own_messages, broadcast_messages)` the `GameLoop` delivers.

use super::Shard;
use crate::dig::{DigOutcome, DigValidator, TriggeredEvent};
use crate::domain::equipment::rope_max_checkpoints;
use crate::economy::{process_equipment_purchase, process_inventory_upgrade, process_sell, EconomyError};
use crate::error::ErrorCode;
use crate::gateway::protocol::{ClientCommand, SellResultLine, ServerMessage};
use crate::metrics;
use crate::player::PlayerId;
use crate::validation::{validate_chat_message, validate_sell_list_size};
use crate::world::store::Position;
use std::collections::HashMap;

type Outcome = (Vec<ServerMessage>, Vec<ServerMessage>);

pub(super) fn dispatch(shard: &mut Shard, player_id: &PlayerId, command: ClientCommand, now_millis: u64) -> Outcome {
    match command {
        ClientCommand::Dig { x, y, .. } => dig(shard, player_id, x, y, now_millis),
        ClientCommand::Move { x, y, .. } => mv(shard, player_id, x, y, now_millis),
        ClientCommand::CollectItem { item_id, .. } => collect(shard, player_id, item_id),
        ClientCommand::GoSurface {} => go_surface(shard, player_id),
        ClientCommand::Sell { items } => sell(shard, player_id, items),
        ClientCommand::BuyEquipment { slot, .. } => buy_equipment(shard, player_id, slot),
        ClientCommand::BuyInventoryUpgrade {} => buy_inventory_upgrade(shard, player_id),
        ClientCommand::SetCheckpoint { depth } => set_checkpoint(shard, player_id, depth),
        ClientCommand::Descend { checkpoint } => descend(shard, player_id, checkpoint),
        ClientCommand::Chat { message } => chat(shard, player_id, message),
        // Auth and matchmaking commands are terminated at the Gateway
        // before reaching a bound shard.
        _ => (vec![], vec![]),
    }
}

fn state_view(shard: &Shard, player_id: &PlayerId) -> Option<ServerMessage> {
    shard.players.get(player_id).map(|p| ServerMessage::PlayerStateUpdate { state: shard.view_of(p) })
}

fn dig(shard: &mut Shard, player_id: &PlayerId, x: i64, y: i64, now_millis: u64) -> Outcome {
    // Rate limiting already happened in the GameLoop's drain step.
    metrics::DIGS_PROCESSED_TOTAL.inc();

    let Some(player) = shard.players.get_mut(player_id) else { return (vec![], vec![]) };

    let result = DigValidator::resolve(player, &mut shard.world, x, y, now_millis, &mut shard.loot_rng, &mut shard.event_rng);

    match result {
        Err(e) => (vec![ServerMessage::error(e.into())], vec![]),
        Ok(DigOutcome::BlockUpdate { x, y, remaining_hp }) => {
            let msg = ServerMessage::BlockUpdate { x, y, new_hp: remaining_hp, destroyed: false, actor: player_id.clone() };
            (vec![], vec![msg])
        }
        Ok(DigOutcome::BlockDestroyed(d)) => {
            let mut own = Vec::new();
            if let Some(item_type) = d.drop {
                shard.spawn_drop(item_type, Position { x: d.x, y: d.y }, now_millis);
            }
            if let Some(event) = &d.event {
                spawn_event_drops(shard, player_id, event, now_millis);
                own.push(ServerMessage::Event { name: event_name(event), detail: event_detail(event) });
            }
            if let Some(state) = state_view(shard, player_id) {
                own.push(state);
            }
            let broadcast = vec![ServerMessage::BlockDestroyed { x: d.x, y: d.y, actor: player_id.clone(), drop: d.drop }];
            (own, broadcast)
        }
        Ok(DigOutcome::Explosion(e)) => {
            let mut own = Vec::new();
            if let Some(state) = state_view(shard, player_id) {
                own.push(state);
            }
            let broadcast = vec![ServerMessage::Explosion {
                center: e.center,
                radius: 1.5,
                destroyed_blocks: e.destroyed_blocks,
                chain: e.chain_tail,
                gold_penalty: e.gold_penalty,
                affected_player: player_id.clone(),
                player_launch_to_y: e.player_launch_to_y,
            }];
            (own, broadcast)
        }
    }
}

fn event_name(event: &TriggeredEvent) -> String {
    match event {
        TriggeredEvent::TreasureChest { .. } => "treasure_chest",
        TriggeredEvent::UndergroundSpring { .. } => "underground_spring",
        TriggeredEvent::CaveIn { .. } => "cave_in",
        TriggeredEvent::GasPocket { .. } => "gas_pocket",
        TriggeredEvent::RockSlide { .. } => "rock_slide",
    }
    .to_string()
}

/// Surfaces the event's own fields instead of an empty detail blob, so
/// e.g. a treasure chest's rolled items reach the client.
fn event_detail(event: &TriggeredEvent) -> serde_json::Value {
    match event {
        TriggeredEvent::TreasureChest { drops } => serde_json::json!({ "drops": drops }),
        TriggeredEvent::UndergroundSpring { drops } => serde_json::json!({ "drops": drops }),
        TriggeredEvent::CaveIn { items_lost, pushed_to_y } => {
            serde_json::json!({ "items_lost": items_lost, "pushed_to_y": pushed_to_y })
        }
        TriggeredEvent::GasPocket { blanked_until_millis } => serde_json::json!({ "blanked_until_millis": blanked_until_millis }),
        TriggeredEvent::RockSlide { bonus_hardness, remaining_blocks } => {
            serde_json::json!({ "bonus_hardness": bonus_hardness, "remaining_blocks": remaining_blocks })
        }
    }
}

/// Treasure chest / underground spring rolls spawn their bonus items as
/// collectible `DropItem`s near the digging player (spec.md §4.6).
fn spawn_event_drops(shard: &mut Shard, player_id: &PlayerId, event: &TriggeredEvent, now_millis: u64) {
    let drops: &[crate::domain::loot::ItemType] = match event {
        TriggeredEvent::TreasureChest { drops } | TriggeredEvent::UndergroundSpring { drops } => drops,
        _ => return,
    };
    let Some(position) = shard.players.get(player_id).map(|p| p.position) else { return };
    for &item_type in drops {
        shard.spawn_drop(item_type, position, now_millis);
    }
}

fn mv(shard: &mut Shard, player_id: &PlayerId, x: i64, y: i64, now_millis: u64) -> Outcome {
    let Some(player) = shard.players.get_mut(player_id) else { return (vec![], vec![]) };
    player.position = Position { x, y };
    player.record_depth(y);
    let torch_tier = player.effective_torch_tier(now_millis);
    let new_pos = player.position;

    let reveals = shard.fog.on_player_move(player_id, new_pos, torch_tier, &mut shard.world, now_millis);
    let own = reveals
        .into_iter()
        .map(|r| ServerMessage::RevealBlock { x: r.x, y: r.y, block_type: r.block_type, hp: r.hp, max_hp: r.max_hp })
        .collect();

    let broadcast = vec![ServerMessage::OtherPlayerUpdate { player_id: player_id.clone(), x, y, action: "walking".to_string() }];
    (own, broadcast)
}

fn collect(shard: &mut Shard, player_id: &PlayerId, item_id: String) -> Outcome {
    let Some(drop) = shard.drops.get(&item_id).cloned() else {
        return (vec![ServerMessage::CollectResult { success: false, item_id, item_type: None }], vec![]);
    };
    if drop.collected_by.is_some() {
        return (vec![ServerMessage::CollectResult { success: false, item_id, item_type: None }], vec![]);
    }
    let Some(player) = shard.players.get_mut(player_id) else { return (vec![], vec![]) };
    let leftover = player.inventory.add(drop.item_type, 1, player.equipment.vest);
    if leftover > 0 {
        return (vec![ServerMessage::InventoryFull {}], vec![]);
    }
    shard.drops.remove(&item_id);
    (vec![ServerMessage::CollectResult { success: true, item_id, item_type: Some(drop.item_type) }], vec![])
}

fn go_surface(shard: &mut Shard, player_id: &PlayerId) -> Outcome {
    let Some(player) = shard.players.get_mut(player_id) else { return (vec![], vec![]) };
    player.position = Position { x: player.position.x, y: 0 };
    player.is_on_surface = true;
    (vec![ServerMessage::PlayerStateUpdate { state: shard.view_of(shard.players.get(player_id).unwrap()) }], vec![])
}

fn sell(shard: &mut Shard, player_id: &PlayerId, items: Vec<crate::gateway::protocol::SellLine>) -> Outcome {
    let Some(player) = shard.players.get_mut(player_id) else { return (vec![], vec![]) };

    // An empty line list means "sell all" (spec.md §4.5).
    let lines: Vec<crate::gateway::protocol::SellLine> = if items.is_empty() {
        player
            .inventory
            .non_empty_entries()
            .into_iter()
            .map(|s| crate::gateway::protocol::SellLine { item_type: s.item_type, quantity: s.quantity })
            .collect()
    } else {
        items
    };

    if validate_sell_list_size(lines.len(), player.inventory.capacity(player.equipment.vest)).is_err() {
        return (vec![ServerMessage::error(ErrorCode::SellFailed)], vec![]);
    }

    // Aggregate requested quantity per item type before checking
    // holdings, so two lines naming the same item can't each pass a
    // check against the full balance and then jointly oversell it.
    let mut requested: HashMap<crate::domain::loot::ItemType, u32> = HashMap::new();
    for line in &lines {
        *requested.entry(line.item_type).or_insert(0) += line.quantity;
    }

    for (&item_type, &quantity) in &requested {
        if player.inventory.quantity_of(item_type) < quantity {
            return (vec![ServerMessage::error(ErrorCode::SellFailed)], vec![]);
        }
    }

    let mut result_lines = Vec::new();
    let mut total_earned = 0u64;
    for (item_type, quantity) in requested {
        match process_sell(player, item_type, quantity) {
            Ok(receipt) => {
                result_lines.push(SellResultLine {
                    item_type: receipt.item_type,
                    quantity: receipt.quantity_sold,
                    unit_price: receipt.item_type.unit_price(),
                    total: receipt.gold_earned,
                });
                total_earned += receipt.gold_earned;
            }
            Err(_) => return (vec![ServerMessage::error(ErrorCode::SellFailed)], vec![]),
        }
    }

    let msg = ServerMessage::SellResult { lines: result_lines, total_gold_earned: total_earned, new_gold_balance: player.gold };
    (vec![msg], vec![])
}

fn buy_equipment(shard: &mut Shard, player_id: &PlayerId, slot: crate::domain::equipment::EquipmentSlot) -> Outcome {
    let Some(player) = shard.players.get_mut(player_id) else { return (vec![], vec![]) };
    match process_equipment_purchase(player, slot) {
        Ok((new_tier, price)) => (vec![ServerMessage::BuyResult { success: true, new_tier: Some(new_tier), new_level: None, gold_spent: Some(price), error: None }], vec![]),
        Err(e) => (vec![ServerMessage::BuyResult { success: false, new_tier: None, new_level: None, gold_spent: None, error: Some(economy_error_text(e)) }], vec![]),
    }
}

fn buy_inventory_upgrade(shard: &mut Shard, player_id: &PlayerId) -> Outcome {
    let Some(player) = shard.players.get_mut(player_id) else { return (vec![], vec![]) };
    match process_inventory_upgrade(player) {
        Ok((new_level, price)) => (vec![ServerMessage::BuyResult { success: true, new_tier: None, new_level: Some(new_level), gold_spent: Some(price), error: None }], vec![]),
        Err(e) => (vec![ServerMessage::BuyResult { success: false, new_tier: None, new_level: None, gold_spent: None, error: Some(economy_error_text(e)) }], vec![]),
    }
}

fn economy_error_text(e: EconomyError) -> String {
    e.to_string()
}

fn set_checkpoint(shard: &mut Shard, player_id: &PlayerId, depth: i64) -> Outcome {
    let Some(player) = shard.players.get_mut(player_id) else { return (vec![], vec![]) };
    let cap = rope_max_checkpoints(player.equipment.rope);
    if player.checkpoints.len() >= cap && !player.checkpoints.contains(&depth) {
        player.checkpoints.remove(0);
    }
    if !player.checkpoints.contains(&depth) {
        player.checkpoints.push(depth);
    }
    (vec![], vec![])
}

fn descend(shard: &mut Shard, player_id: &PlayerId, checkpoint: Option<i64>) -> Outcome {
    let Some(player) = shard.players.get_mut(player_id) else { return (vec![], vec![]) };
    let target_y = checkpoint
        .filter(|d| player.checkpoints.contains(d))
        .unwrap_or(player.max_depth_reached);
    player.position.y = target_y;
    player.is_on_surface = false;
    let torch_tier = player.equipment.torch;
    let pos = player.position;
    let reveals = shard.fog.on_player_spawn(player_id, pos, torch_tier, &mut shard.world, 0);
    let own = reveals
        .into_iter()
        .map(|r| ServerMessage::RevealBlock { x: r.x, y: r.y, block_type: r.block_type, hp: r.hp, max_hp: r.max_hp })
        .collect();
    (own, vec![])
}

fn chat(shard: &mut Shard, player_id: &PlayerId, message: String) -> Outcome {
    // ChatRateLimit is reserved for the over-rate case, checked by the
    // GameLoop before this handler ever runs; an empty/too-long message
    // is a content problem, not a rate problem.
    if validate_chat_message(&message).is_err() {
        return (vec![ServerMessage::error(ErrorCode::InvalidMessage)], vec![]);
    }
    let Some(player) = shard.players.get(player_id) else { return (vec![], vec![]) };
    let broadcast = vec![ServerMessage::ChatMessage { player_id: player_id.clone(), display_name: player.display_name.clone(), message }];
    (vec![], broadcast)
}

