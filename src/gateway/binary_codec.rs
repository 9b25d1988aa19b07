//! Compact binary encoding for the three highest-frequency message
//! kinds plus their inbound counterparts (spec.md §6). Little-endian,
//! one opcode byte followed by a fixed or length-prefixed payload.

pub const OP_MOVE: u8 = 0x01;
pub const OP_DIG: u8 = 0x02;
pub const OP_BLOCK_UPDATE: u8 = 0x03;
pub const OP_BLOCK_DESTROYED: u8 = 0x04;
pub const OP_OTHER_PLAYER_UPDATE: u8 = 0x05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryMessage {
    Move { x: f32, y: f32 },
    Dig { x: i16, y: i16 },
    BlockUpdate { x: i16, y: i16, hp: u8, max_hp: u8 },
    BlockDestroyed { x: i16, y: i16 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OtherPlayerUpdateHeader {
    pub x: f32,
    pub y: f32,
    pub action: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    TooShort,
    UnknownOpcode(u8),
}

/// Decodes an inbound client frame (`move` or `dig`).
pub fn decode_client(bytes: &[u8]) -> Result<BinaryMessage, CodecError> {
    let (&opcode, rest) = bytes.split_first().ok_or(CodecError::TooShort)?;
    match opcode {
        OP_MOVE => {
            if rest.len() < 8 {
                return Err(CodecError::TooShort);
            }
            let x = f32::from_le_bytes(rest[0..4].try_into().unwrap());
            let y = f32::from_le_bytes(rest[4..8].try_into().unwrap());
            Ok(BinaryMessage::Move { x, y })
        }
        OP_DIG => {
            if rest.len() < 4 {
                return Err(CodecError::TooShort);
            }
            let x = i16::from_le_bytes(rest[0..2].try_into().unwrap());
            let y = i16::from_le_bytes(rest[2..4].try_into().unwrap());
            Ok(BinaryMessage::Dig { x, y })
        }
        other => Err(CodecError::UnknownOpcode(other)),
    }
}

pub fn encode_block_update(x: i64, y: i64, hp: u8, max_hp: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(6);
    out.push(OP_BLOCK_UPDATE);
    out.extend_from_slice(&(x as i16).to_le_bytes());
    out.extend_from_slice(&(y as i16).to_le_bytes());
    out.push(hp);
    out.push(max_hp);
    out
}

pub fn encode_block_destroyed(x: i64, y: i64) -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    out.push(OP_BLOCK_DESTROYED);
    out.extend_from_slice(&(x as i16).to_le_bytes());
    out.extend_from_slice(&(y as i16).to_le_bytes());
    out
}

/// `action`: 0 = idle, 1 = walking, per spec.md §4.8 "walking action indicator".
pub fn encode_other_player_update(player_id: &str, x: f32, y: f32, action: u8) -> Vec<u8> {
    let id_bytes = player_id.as_bytes();
    let mut out = Vec::with_capacity(2 + id_bytes.len() + 9);
    out.push(OP_OTHER_PLAYER_UPDATE);
    out.push(id_bytes.len() as u8);
    out.extend_from_slice(id_bytes);
    out.extend_from_slice(&x.to_le_bytes());
    out.extend_from_slice(&y.to_le_bytes());
    out.push(action);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_move_frame() {
        let mut frame = vec![OP_MOVE];
        frame.extend_from_slice(&1.5f32.to_le_bytes());
        frame.extend_from_slice(&(-2.0f32).to_le_bytes());
        assert_eq!(decode_client(&frame).unwrap(), BinaryMessage::Move { x: 1.5, y: -2.0 });
    }

    #[test]
    fn decodes_dig_frame() {
        let mut frame = vec![OP_DIG];
        frame.extend_from_slice(&10i16.to_le_bytes());
        frame.extend_from_slice(&1i16.to_le_bytes());
        assert_eq!(decode_client(&frame).unwrap(), BinaryMessage::Dig { x: 10, y: 1 });
    }

    #[test]
    fn rejects_unknown_opcode() {
        assert_eq!(decode_client(&[0xFF, 0, 0]), Err(CodecError::UnknownOpcode(0xFF)));
    }

    #[test]
    fn rejects_short_frame() {
        assert_eq!(decode_client(&[OP_MOVE, 0, 0]), Err(CodecError::TooShort));
    }

    #[test]
    fn encode_other_player_update_roundtrips_header() {
        let frame = encode_other_player_update("abc", 1.0, 2.0, 1);
        assert_eq!(frame[0], OP_OTHER_PLAYER_UPDATE);
        assert_eq!(frame[1], 3);
        assert_eq!(&frame[2..5], b"abc");
    }
}
