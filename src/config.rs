//! Configuration loader for the process-wide crypto keyring. A JSON file
//! names the master key source; the key is loaded once at startup and
//! expanded into independent subkeys so the secret vault and the payload
//! signer never share raw key bytes.

use std::fs;
use std::path::{Path, PathBuf};

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroize;

use crate::crypto::integrity::{hkdf_expand, HmacSigner};
use crate::crypto::secrets::SecretVault;

const MASTER_KEY_LEN: usize = 32;
const SUBKEY_LEN: usize = 32;

/// Domain-separation labels for subkey expansion. Bumping a label suffix
/// would mint fresh subkeys from the same provisioned master key.
const KEYRING_SALT: &[u8] = b"taskforge-keyring";
const VAULT_INFO: &[u8] = b"taskforge.vault.v1";
const HMAC_INFO: &[u8] = b"taskforge.hmac.v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(String),
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error("no usable master key source configured")]
    MissingKeySource,
    #[error("master key must be 32 bytes")]
    InvalidKeyLength,
}

#[derive(Debug, Deserialize)]
pub struct KeySourceConfig {
    /// Base64-encoded 32 byte master key stored in an environment variable.
    pub key_env: Option<String>,
    /// Path to a file that contains the base64-encoded master key.
    pub key_path: Option<PathBuf>,
    /// Environment variable that stores a local passphrase (for Argon2id KDF).
    pub passphrase_env: Option<String>,
    /// Base64-encoded salt used alongside the passphrase.
    pub salt_b64: Option<String>,
}

impl KeySourceConfig {
    fn load_master_key(&self) -> Result<Vec<u8>, ConfigError> {
        if let Some(var) = &self.key_env {
            let encoded =
                std::env::var(var).map_err(|e| ConfigError::Keyring(format!("{e}")))?;
            return STANDARD_NO_PAD
                .decode(encoded.as_bytes())
                .map_err(|e| ConfigError::Keyring(format!("{e}")));
        }
        if let Some(path) = &self.key_path {
            let content =
                fs::read_to_string(path).map_err(|e| ConfigError::Keyring(format!("{e}")))?;
            return STANDARD_NO_PAD
                .decode(content.trim().as_bytes())
                .map_err(|e| ConfigError::Keyring(format!("{e}")));
        }
        if let (Some(pass_env), Some(salt_b64)) = (&self.passphrase_env, &self.salt_b64) {
            let passphrase =
                std::env::var(pass_env).map_err(|e| ConfigError::Keyring(format!("{e}")))?;
            let salt = STANDARD_NO_PAD
                .decode(salt_b64.as_bytes())
                .map_err(|e| ConfigError::Keyring(format!("{e}")))?;

            let params = Params::new(19 * 1024, 3, 1, Some(MASTER_KEY_LEN))
                .map_err(|e| ConfigError::Keyring(format!("{e}")))?;
            let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
            let mut output = vec![0u8; MASTER_KEY_LEN];
            argon2
                .hash_password_into(passphrase.as_bytes(), &salt, &mut output)
                .map_err(|e| ConfigError::Keyring(format!("{e}")))?;
            return Ok(output);
        }
        Err(ConfigError::MissingKeySource)
    }
}

#[derive(Debug, Deserialize)]
pub struct RawCryptoConfig {
    pub keyring: KeySourceConfig,
}

/// The process-wide key material, built once at startup and shared read-only
/// by every caller for the process lifetime.
pub struct Keyring {
    pub vault: SecretVault,
    pub signer: HmacSigner,
}

/// Builds a keyring from a key source. The master key is expanded with
/// HKDF-SHA256 under distinct labels, so the vault and signer subkeys are
/// independent even though one secret is provisioned.
pub fn build_keyring(source: &KeySourceConfig) -> Result<Keyring, ConfigError> {
    let mut master = source.load_master_key()?;
    if master.len() != MASTER_KEY_LEN {
        master.zeroize();
        return Err(ConfigError::InvalidKeyLength);
    }

    let mut vault_key = hkdf_expand(&master, KEYRING_SALT, VAULT_INFO, SUBKEY_LEN)
        .map_err(|e| ConfigError::Keyring(format!("{e}")))?;
    let mut signer_key = hkdf_expand(&master, KEYRING_SALT, HMAC_INFO, SUBKEY_LEN)
        .map_err(|e| ConfigError::Keyring(format!("{e}")))?;
    master.zeroize();

    let vault = SecretVault::from_key_bytes(&vault_key)
        .map_err(|e| ConfigError::Keyring(format!("{e}")))?;
    let signer = HmacSigner::from_key_bytes(&signer_key)
        .map_err(|e| ConfigError::Keyring(format!("{e}")))?;
    vault_key.zeroize();
    signer_key.zeroize();

    Ok(Keyring { vault, signer })
}

/// Loads the JSON configuration file and builds the keyring. Raw key bytes
/// never leave this module.
pub fn load_keyring(path: impl AsRef<Path>) -> Result<Keyring, ConfigError> {
    let raw_json = fs::read_to_string(&path).map_err(|e| ConfigError::Io(format!("{e}")))?;
    let raw_config: RawCryptoConfig =
        serde_json::from_str(&raw_json).map_err(|e| ConfigError::Parse(format!("{e}")))?;
    build_keyring(&raw_config.keyring)
}
