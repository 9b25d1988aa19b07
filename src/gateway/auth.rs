//! HMAC-signed bearer tokens (spec.md §4.10, §6).
//!
//! A token is `base64(payload_json) "." base64(hmac_sha256(secret, payload_json))`.
//! Grounded in the teacher's crypto crate choices (`hmac`/`sha2`/`hex`),
//! swapped to base64 here since the payload must itself be carried, not
//! just a fixed-length digest.

use crate::player::PlayerId;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPayload {
    pub player_id: PlayerId,
    pub display_name: String,
    pub is_guest: bool,
    /// Unix millis.
    pub expiry: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Malformed,
    BadSignature,
    Expired,
}

pub fn sign_token(payload: &TokenPayload, secret: &[u8]) -> String {
    let payload_json = serde_json::to_vec(payload).expect("TokenPayload always serializes");
    let payload_b64 = BASE64.encode(payload_json);

    let mut mac = HmacSha256::new_from_slice(secret).expect("hmac accepts any key length");
    mac.update(payload_b64.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    format!("{payload_b64}.{signature}")
}

pub fn verify_token(token: &str, secret: &[u8], now_millis: u64) -> Result<TokenPayload, TokenError> {
    let (payload_b64, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("hmac accepts any key length");
    mac.update(payload_b64.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    if expected.as_bytes() != signature.as_bytes() {
        return Err(TokenError::BadSignature);
    }

    let payload_json = BASE64.decode(payload_b64).map_err(|_| TokenError::Malformed)?;
    let payload: TokenPayload = serde_json::from_slice(&payload_json).map_err(|_| TokenError::Malformed)?;

    if payload.expiry <= now_millis {
        return Err(TokenError::Expired);
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_valid_token() {
        let secret = b"test-secret";
        let payload = TokenPayload { player_id: "p1".into(), display_name: "Guest1".into(), is_guest: true, expiry: 10_000 };
        let token = sign_token(&payload, secret);
        let decoded = verify_token(&token, secret, 5_000).unwrap();
        assert_eq!(decoded.player_id, "p1");
    }

    #[test]
    fn rejects_tampered_signature() {
        let secret = b"test-secret";
        let payload = TokenPayload { player_id: "p1".into(), display_name: "Guest1".into(), is_guest: true, expiry: 10_000 };
        let mut token = sign_token(&payload, secret);
        token.push('f');
        assert_eq!(verify_token(&token, secret, 5_000), Err(TokenError::BadSignature));
    }

    #[test]
    fn rejects_expired_token() {
        let secret = b"test-secret";
        let payload = TokenPayload { player_id: "p1".into(), display_name: "Guest1".into(), is_guest: true, expiry: 1_000 };
        let token = sign_token(&payload, secret);
        assert_eq!(verify_token(&token, secret, 2_000), Err(TokenError::Expired));
    }

    #[test]
    fn rejects_wrong_secret() {
        let payload = TokenPayload { player_id: "p1".into(), display_name: "Guest1".into(), is_guest: true, expiry: 10_000 };
        let token = sign_token(&payload, b"secret-a");
        assert_eq!(verify_token(&token, b"secret-b", 0), Err(TokenError::BadSignature));
    }
}
