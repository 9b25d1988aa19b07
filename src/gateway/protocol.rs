//! The wire protocol: tagged command/response unions (spec.md §6, §9
//! design note "polymorphic message union"). Text frames only; the
//! three highest-frequency messages also have a binary encoding in
//! `binary_codec`.

use crate::domain::equipment::EquipmentSlot;
use crate::domain::loot::ItemType;
use crate::error::ErrorCode;
use crate::player::{Equipment, PlayerId};
use crate::world::store::ClientBlock;
use crate::world::tnt::ExplosionPhase;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct SellLine {
    pub item_type: ItemType,
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Auth { token: Option<String> },
    JoinQuickPlay {},
    CreateParty { max_players: Option<usize> },
    JoinParty { room_code: String },
    PlaySolo {},

    Dig { seq: u64, x: i64, y: i64, timestamp: u64 },
    Move { seq: u64, x: i64, y: i64 },
    CollectItem { seq: u64, item_id: String },
    GoSurface {},

    Sell { items: Vec<SellLine> },
    BuyEquipment { slot: EquipmentSlot, tier: u8 },
    BuyInventoryUpgrade {},
    SetCheckpoint { depth: i64 },
    Descend { checkpoint: Option<i64> },
    Chat { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerStateView {
    pub id: PlayerId,
    pub display_name: String,
    pub x: i64,
    pub y: i64,
    pub gold: u64,
    pub equipment: Equipment,
    pub max_inventory_slots: usize,
    pub used_inventory_slots: usize,
    pub max_depth_reached: i64,
    pub is_stunned: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SellResultLine {
    pub item_type: ItemType,
    pub quantity: u32,
    pub unit_price: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome { player_id: PlayerId, display_name: String, token: String, state: PlayerStateView },
    MatchmakingResult { success: bool, shard_id: Option<String>, room_code: Option<String>, error: Option<String> },

    WorldChunk { chunk_y: i64, blocks: Vec<ClientBlock> },
    RevealBlock { x: i64, y: i64, block_type: crate::domain::layers::BlockType, hp: f64, max_hp: f64 },
    BlockUpdate { x: i64, y: i64, new_hp: f64, destroyed: bool, actor: PlayerId },
    BlockDestroyed { x: i64, y: i64, actor: PlayerId, drop: Option<ItemType> },
    Explosion {
        center: (i64, i64),
        radius: f64,
        destroyed_blocks: Vec<(i64, i64)>,
        chain: Vec<ExplosionPhase>,
        gold_penalty: u64,
        affected_player: PlayerId,
        player_launch_to_y: i64,
    },

    PlayerStateUpdate { state: PlayerStateView },
    SellResult { lines: Vec<SellResultLine>, total_gold_earned: u64, new_gold_balance: u64 },
    BuyResult { success: bool, new_tier: Option<u8>, new_level: Option<u8>, gold_spent: Option<u64>, error: Option<String> },
    CollectResult { success: bool, item_id: String, item_type: Option<ItemType> },
    InventoryFull {},
    Event { name: String, detail: serde_json::Value },

    OtherPlayerJoined { player_id: PlayerId, display_name: String, x: i64, y: i64 },
    OtherPlayerLeft { player_id: PlayerId },
    OtherPlayerUpdate { player_id: PlayerId, x: i64, y: i64, action: String },
    ChatMessage { player_id: PlayerId, display_name: String, message: String },

    Error { code: ErrorCode, message: String },
}

impl ServerMessage {
    pub fn error(code: ErrorCode) -> Self {
        ServerMessage::Error { code, message: code.message().to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dig_command_parses_from_json() {
        let raw = r#"{"type":"dig","seq":1,"x":10,"y":1,"timestamp":123}"#;
        let cmd: ClientCommand = serde_json::from_str(raw).unwrap();
        matches!(cmd, ClientCommand::Dig { seq: 1, x: 10, y: 1, .. });
    }

    #[test]
    fn error_message_serializes_with_tag() {
        let msg = ServerMessage::error(ErrorCode::NotAdjacent);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("NOT_ADJACENT"));
    }
}
