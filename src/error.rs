//! Wire-level error taxonomy (spec.md §6/§7).
//!
//! `ErrorCode` is what actually goes over the wire inside an `error`
//! frame. Module-local error types (`DigError`, `SellError`, ...)
//! convert into it at the Gateway/Shard boundary instead of leaking
//! their own shapes to clients.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidMessage,
    NotAuthenticated,
    NotInShard,
    UnknownType,
    Stunned,
    NotAdjacent,
    DepthLimit,
    NoBlock,
    RateLimited,
    SellFailed,
    ChatRateLimit,
}

impl ErrorCode {
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::InvalidMessage => "frame could not be parsed",
            ErrorCode::NotAuthenticated => "connection has not completed auth",
            ErrorCode::NotInShard => "player is not bound to a shard",
            ErrorCode::UnknownType => "unrecognized message type",
            ErrorCode::Stunned => "player is stunned",
            ErrorCode::NotAdjacent => "target block is not adjacent",
            ErrorCode::DepthLimit => "target depth exceeds helmet rating",
            ErrorCode::NoBlock => "no diggable block at that position",
            ErrorCode::RateLimited => "command rate exceeded",
            ErrorCode::SellFailed => "sell request could not be fulfilled",
            ErrorCode::ChatRateLimit => "chat rate exceeded",
        }
    }
}
