//! Integrity helpers for keyed signing, hashing, and key derivation. These
//! utilities are kept separate from password hashing and secret encryption to
//! avoid accidental API misuse.

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroize;

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("digest decoding failed: {0}")]
    DecodeError(String),
    #[error("hkdf expansion failed: {0}")]
    HkdfFailed(String),
    #[error("hmac failed: {0}")]
    HmacFailed(String),
}

type HmacSha256 = Hmac<Sha256>;

/// Produces a raw SHA-256 digest of the provided bytes.
pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Returns the hexadecimal representation of a SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = sha256_digest(data);
    to_hex(&digest)
}

/// Generates a raw HMAC-SHA256 tag for the provided data.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, IntegrityError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| IntegrityError::HmacFailed(format!("{e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Derives key material using HKDF-SHA256.
pub fn hkdf_expand(input_key_material: &[u8], salt: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>, IntegrityError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), input_key_material);
    let mut okm = vec![0u8; length];
    hk.expand(info, &mut okm)
        .map_err(|e| IntegrityError::HkdfFailed(format!("{e}")))?;
    Ok(okm)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn from_hex(encoded: &str) -> Result<Vec<u8>, IntegrityError> {
    if !encoded.is_ascii() || encoded.len() % 2 != 0 {
        return Err(IntegrityError::DecodeError("not an even-length hex string".to_string()));
    }
    (0..encoded.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&encoded[i..i + 2], 16)
                .map_err(|e| IntegrityError::DecodeError(format!("{e}")))
        })
        .collect()
}

/// Holds the process-wide signing key and produces hex HMAC-SHA256 digests
/// for outbound payloads (webhook bodies, export manifests). Deterministic:
/// the same key and data always yield the same digest.
pub struct HmacSigner {
    key: Vec<u8>,
}

impl HmacSigner {
    /// Builds a signer from raw key bytes.
    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self, IntegrityError> {
        if key_bytes.is_empty() {
            return Err(IntegrityError::InvalidInput("signing key must not be empty"));
        }
        Ok(Self { key: key_bytes.to_vec() })
    }

    /// Signs `data`, returning the 64-character lowercase hex digest.
    pub fn sign(&self, data: &[u8]) -> Result<String, IntegrityError> {
        if data.is_empty() {
            return Err(IntegrityError::InvalidInput("data must not be empty"));
        }
        let tag = hmac_sha256(&self.key, data)?;
        Ok(to_hex(&tag))
    }

    /// Checks a presented hex digest against `data` in constant time.
    /// Returns `Ok(false)` on a mismatch; errors are reserved for unusable
    /// inputs such as malformed hex.
    pub fn verify(&self, data: &[u8], digest_hex: &str) -> Result<bool, IntegrityError> {
        if data.is_empty() {
            return Err(IntegrityError::InvalidInput("data must not be empty"));
        }
        let presented = from_hex(digest_hex)?;
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| IntegrityError::HmacFailed(format!("{e}")))?;
        mac.update(data);
        Ok(mac.verify_slice(&presented).is_ok())
    }
}

impl Drop for HmacSigner {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::{hkdf_expand, hmac_sha256, sha256_hex, HmacSigner, IntegrityError};
    use hex::ToHex;

    #[test]
    fn hashes_to_hex() {
        assert_eq!(
            sha256_hex(b"taskforge"),
            "7f00e65c2f73472fd40233c552b82c490bdf61d4788be65eb18e1e66631291ed"
        );
    }

    #[test]
    fn builds_hmac() {
        let tag = hmac_sha256(b"key", b"payload").expect("hmac should succeed");
        assert_eq!(
            tag.encode_hex::<String>(),
            "5d98b45c90a207fa998ce639fea6f02ecc8cc3f36fef81d694fb856b4d0a28ca"
        );
    }

    #[test]
    fn expands_with_hkdf() {
        let okm = hkdf_expand(b"ikm", b"salt", b"info", 42).expect("hkdf should work");
        assert_eq!(okm.len(), 42);
    }

    #[test]
    fn signs_deterministically() {
        let signer = HmacSigner::from_key_bytes(b"webhook-signing-key").expect("valid key");
        let digest = signer
            .sign(b"Data for HMAC generation test")
            .expect("signing should succeed");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "d397780a57e0aaa6738dd2d6a6d3f2bdd500a13d21c54a00dbd6d35877ea2197"
        );
        let again = signer
            .sign(b"Data for HMAC generation test")
            .expect("signing should succeed");
        assert_eq!(digest, again);
    }

    #[test]
    fn any_data_change_moves_the_digest() {
        let signer = HmacSigner::from_key_bytes(b"webhook-signing-key").expect("valid key");
        let base = signer.sign(b"payload").expect("signing should succeed");
        let extended = signer.sign(b"payload!").expect("signing should succeed");
        assert_ne!(base, extended);
    }

    #[test]
    fn rejects_empty_inputs() {
        assert!(matches!(
            HmacSigner::from_key_bytes(b""),
            Err(IntegrityError::InvalidInput(_))
        ));
        let signer = HmacSigner::from_key_bytes(b"k").expect("valid key");
        assert!(matches!(signer.sign(b""), Err(IntegrityError::InvalidInput(_))));
        assert!(matches!(
            signer.verify(b"", "00"),
            Err(IntegrityError::InvalidInput(_))
        ));
    }

    #[test]
    fn verifies_in_constant_time_paths() {
        let signer = HmacSigner::from_key_bytes(b"webhook-signing-key").expect("valid key");
        let digest = signer.sign(b"payload").expect("signing should succeed");
        assert!(signer.verify(b"payload", &digest).expect("verification should run"));
        assert!(!signer.verify(b"other payload", &digest).expect("verification should run"));

        let mut altered = digest.clone().into_bytes();
        altered[0] = if altered[0] == b'0' { b'1' } else { b'0' };
        let altered = String::from_utf8(altered).expect("still utf-8");
        assert!(!signer.verify(b"payload", &altered).expect("verification should run"));
    }

    #[test]
    fn malformed_digest_is_a_decode_error() {
        let signer = HmacSigner::from_key_bytes(b"k").expect("valid key");
        assert!(matches!(
            signer.verify(b"payload", "zz-not-hex"),
            Err(IntegrityError::DecodeError(_))
        ));
    }
}
