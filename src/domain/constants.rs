//! Immutable numeric constants pulled verbatim from spec.md.

/// Horizontal wrap width of the world, in blocks.
pub const CHUNK_WIDTH: i64 = 2000;
/// Vertical extent of one chunk, in blocks.
pub const CHUNK_HEIGHT: i64 = 32;

/// Depths below this are guaranteed hazard-free (safe spawn column).
pub const SAFE_SPAWN_BLOCKS: i64 = 3;

/// Depth at which void stone starts gaining extra hardness.
pub const VOID_STONE_HARDNESS_RAMP_DEPTH: i64 = 1201;
pub const VOID_STONE_HARDNESS_PER_BLOCK: f64 = 0.01;

pub const MAX_STACK_SIZE: u32 = 50;

pub const TNT_CHAIN_DELAY_MS: u64 = 500;
pub const TNT_LAUNCH_DISTANCE: i64 = 10;
pub const TNT_CHAIN_EXTRA_LAUNCH: i64 = 5;
pub const STUN_DURATION_MS: u64 = 1_500;

pub const TICK_RATE_HZ: u32 = 10;
pub const TICK_INTERVAL_MS: u64 = 1_000 / TICK_RATE_HZ as u64;
pub const MAX_DIG_RATE_PER_SEC: u32 = 10;
pub const CHAT_RATE_LIMIT_PER_SEC: u32 = 5;

pub const PLAYER_DISCONNECT_GRACE_MS: u64 = 30_000;
pub const RECONNECT_GRACE_MS: u64 = 30_000;

pub const DROP_ITEM_TTL_MS: u64 = 60_000;

pub const CAVE_IN_PUSH_DISTANCE: i64 = 5;
pub const CAVE_IN_ITEMS_LOST: usize = 2;
pub const GAS_POCKET_DURATION_MS: u64 = 10_000;
pub const ROCK_SLIDE_HARDNESS_BONUS: f64 = 3.0;
pub const ROCK_SLIDE_DURATION_BLOCKS: u32 = 20;

pub const ROOM_CODE_LENGTH: usize = 6;
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const MAX_CACHED_CHUNKS: usize = 100;

pub const INVENTORY_UPGRADE_SLOTS: [u32; 6] = [8, 12, 16, 20, 25, 30];
pub const INVENTORY_UPGRADE_PRICES: [u64; 6] = [0, 100, 400, 1_200, 4_000, 15_000];

pub const MAX_EQUIPMENT_TIER: u8 = 7;
