//! Opaque token generation for session and password-reset issuance.
//! Tokens are drawn directly from the OS CSPRNG with no shared counter, so
//! concurrent callers can never collide by construction order.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// URL-safe token alphabet. Exactly 64 symbols, so masking a random byte to
/// six bits maps onto it uniformly with no modulo bias.
const TOKEN_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Accepted token length window, in characters. 24 symbols of this alphabet
/// carry 144 bits of entropy, enough to make collisions negligible; longer
/// requests are capped to keep stored tokens bounded.
pub const MIN_TOKEN_CHARS: usize = 24;
pub const MAX_TOKEN_CHARS: usize = 128;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token length {requested} outside allowed 24..=128 range")]
    InvalidLength { requested: usize },
}

/// Generates an opaque token of exactly `length` URL-safe characters.
pub fn generate_token(length: usize) -> Result<String, TokenError> {
    if !(MIN_TOKEN_CHARS..=MAX_TOKEN_CHARS).contains(&length) {
        return Err(TokenError::InvalidLength { requested: length });
    }

    let mut random_bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut random_bytes);
    let token = random_bytes
        .iter()
        .map(|byte| TOKEN_ALPHABET[(byte & 0x3f) as usize] as char)
        .collect();
    Ok(token)
}
