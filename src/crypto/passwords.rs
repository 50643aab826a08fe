//! Password hashing helpers built around Argon2id.
//! The configuration is centralized so that every password-like value uses the
//! same memory, iteration, and parallelism parameters.

use argon2::password_hash::SaltString;
use argon2::{password_hash, Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;
use thiserror::Error;

/// Tuned Argon2id parameters for TaskForge's expected deployment profile.
/// - memory_cost: 19 MiB keeps GPU cracking expensive while remaining server friendly
/// - time_cost: 3 iterations for interactive latency without sacrificing safety
/// - parallelism: 1 thread to keep resource usage predictable on shared hosts
const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 3;
const PARALLELISM: u32 = 1;

/// Accepted password length window, in characters. Anything shorter is
/// trivially crackable; anything longer is almost certainly not a password.
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 128;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid password input: {0}")]
    InvalidInput(&'static str),
    #[error("stored hash unreadable: {0}")]
    DecodeError(String),
    #[error("password hashing failed: {0}")]
    HashingFailed(String),
}

fn argon2_config() -> Result<Argon2<'static>, password_hash::Error> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn check_length(plaintext: &str) -> Result<(), PasswordError> {
    let chars = plaintext.chars().count();
    if chars == 0 {
        return Err(PasswordError::InvalidInput("password must not be empty"));
    }
    if chars < MIN_PASSWORD_CHARS {
        return Err(PasswordError::InvalidInput("password below minimum length"));
    }
    if chars > MAX_PASSWORD_CHARS {
        return Err(PasswordError::InvalidInput("password above maximum length"));
    }
    Ok(())
}

/// Hashes a password with Argon2id and returns the PHC string.
/// The resulting string includes the algorithm id, parameters, and a fresh
/// random salt, so it can be verified later with no external bookkeeping.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    check_length(plaintext)?;
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = argon2_config().map_err(|e| PasswordError::HashingFailed(format!("{e}")))?;
    let password_hash = argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(format!("{e}")))?
        .to_string();
    Ok(password_hash)
}

/// Verifies a plaintext password against a previously stored Argon2 hash.
/// Verification uses the parameters embedded in the hash, so values minted
/// under older cost settings keep verifying after a parameter bump. Returns
/// `Ok(false)` on a mismatch; errors are reserved for unusable inputs.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    if plaintext.is_empty() {
        return Err(PasswordError::InvalidInput("password must not be empty"));
    }
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| PasswordError::DecodeError(format!("{e}")))?;

    let argon2 = argon2_config().map_err(|e| PasswordError::HashingFailed(format!("{e}")))?;
    match argon2.verify_password(plaintext.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::DecodeError(format!("{e}"))),
    }
}
