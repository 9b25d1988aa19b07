//! Input validation/sanitization (spec.md §2 row, expanded in
//! SPEC_FULL.md §4.13): bounds that must hold before a command reaches
//! domain logic at all.

use crate::domain::constants::CHUNK_WIDTH;

pub const MAX_DISPLAY_NAME_LEN: usize = 20;
pub const MAX_CHAT_MESSAGE_LEN: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    CoordinateOutOfRange,
    DisplayNameInvalid,
    ChatMessageTooLong,
    ChatMessageEmpty,
    SellListTooLarge,
}

/// Normalizes a client-supplied x coordinate into `[0, CHUNK_WIDTH)`
/// and rejects a negative or non-finite y before any adjacency or
/// depth check runs.
pub fn normalize_target_coordinate(x: i64, y: i64) -> Result<(i64, i64), ValidationError> {
    if y < 0 {
        return Err(ValidationError::CoordinateOutOfRange);
    }
    Ok((x.rem_euclid(CHUNK_WIDTH), y))
}

pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_DISPLAY_NAME_LEN {
        return Err(ValidationError::DisplayNameInvalid);
    }
    if !name.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
        return Err(ValidationError::DisplayNameInvalid);
    }
    Ok(())
}

pub fn validate_chat_message(message: &str) -> Result<(), ValidationError> {
    if message.is_empty() {
        return Err(ValidationError::ChatMessageEmpty);
    }
    if message.chars().count() > MAX_CHAT_MESSAGE_LEN {
        return Err(ValidationError::ChatMessageTooLong);
    }
    Ok(())
}

pub fn validate_sell_list_size(requested_lines: usize, max_inventory_slots: usize) -> Result<(), ValidationError> {
    if requested_lines > max_inventory_slots {
        return Err(ValidationError::SellListTooLarge);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_y_is_rejected() {
        assert_eq!(normalize_target_coordinate(5, -1), Err(ValidationError::CoordinateOutOfRange));
    }

    #[test]
    fn x_wraps_into_chunk_width() {
        let (x, _) = normalize_target_coordinate(CHUNK_WIDTH + 5, 10).unwrap();
        assert_eq!(x, 5);
    }

    #[test]
    fn display_name_rejects_empty_and_overlong() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name(&"x".repeat(21)).is_err());
        assert!(validate_display_name("Rusty Digger").is_ok());
    }

    #[test]
    fn chat_message_enforces_length_bound() {
        assert!(validate_chat_message("").is_err());
        assert!(validate_chat_message(&"a".repeat(241)).is_err());
        assert!(validate_chat_message("gg").is_ok());
    }

    #[test]
    fn sell_list_bounded_by_inventory_capacity() {
        assert!(validate_sell_list_size(9, 8).is_err());
        assert!(validate_sell_list_size(8, 8).is_ok());
    }
}
