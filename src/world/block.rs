//! The `Block` value type (spec.md §3).

use crate::domain::layers::BlockType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub block_type: BlockType,
    pub hp: f64,
    pub max_hp: f64,
    pub x: i64,
    pub y: i64,
}

impl Block {
    pub fn empty(x: i64, y: i64) -> Self {
        Self { block_type: BlockType::Empty, hp: 0.0, max_hp: 0.0, x, y }
    }

    pub fn is_empty(&self) -> bool {
        self.block_type == BlockType::Empty
    }

    pub fn is_hazard(&self) -> bool {
        self.block_type.is_hazard()
    }
}
