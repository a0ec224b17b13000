//! Whole-container encryption: the `Cipher` hook and its AES-256-GCM
//! implementations.
//!
//! The container core never looks inside a cipher. `seal` runs the
//! finished container through [`Cipher::encrypt`]; `open` runs the incoming
//! bytes through [`Cipher::decrypt`] before any header parsing.
//!
//! Envelopes:
//!
//! | Cipher | Layout |
//! |---|---|
//! | [`KeyCipher`] | `nonce (12 B) \| ciphertext \| GCM tag (16 B)` |
//! | [`PasswordCipher`] | `salt (16 B) \| nonce (12 B) \| ciphertext \| GCM tag (16 B)` |
//!
//! Password keys are Argon2id(password, salt) with a fresh random salt per
//! container.

use std::fmt;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng};
use aes_gcm::Aes256Gcm;
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

/// Byte length of the AES-GCM nonce at the front of every envelope.
pub const NONCE_LEN: usize = 12;
/// Byte length of the Argon2id salt in front of a password envelope.
pub const SALT_LEN: usize = 16;
/// Byte length of a raw AES-256 key.
pub const KEY_LEN: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("wrong key or corrupted data")]
    DecryptionFailed,
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("Encrypted payload too short ({len} bytes, minimum {min})")]
    TooShort { len: usize, min: usize },
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Whole-buffer symmetric transform applied around the container core.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>;
}

// ── Raw key ──────────────────────────────────────────────────────────────────

/// AES-256-GCM under a caller-supplied 256-bit key.
#[derive(Clone)]
pub struct KeyCipher {
    key: [u8; KEY_LEN],
}

impl KeyCipher {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }
}

impl fmt::Debug for KeyCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCipher").finish_non_exhaustive()
    }
}

impl Cipher for KeyCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        seal_with_key(&self.key, plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        open_with_key(&self.key, ciphertext)
    }
}

// ── Password ─────────────────────────────────────────────────────────────────

/// AES-256-GCM under an Argon2id key derived from a password.
///
/// The salt is generated per `encrypt` call and stored in the envelope, so
/// the same password never yields the same key for two containers.
#[derive(Clone)]
pub struct PasswordCipher {
    password: String,
}

impl PasswordCipher {
    pub fn new(password: impl Into<String>) -> Self {
        Self { password: password.into() }
    }
}

impl fmt::Debug for PasswordCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCipher").finish_non_exhaustive()
    }
}

impl Cipher for PasswordCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut salt = [0u8; SALT_LEN];
        AeadOsRng.fill_bytes(&mut salt);
        let key = derive_key(&self.password, &salt)?;
        let sealed = seal_with_key(&key, plaintext)?;

        let mut out = Vec::with_capacity(SALT_LEN + sealed.len());
        out.extend_from_slice(&salt);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if ciphertext.len() < SALT_LEN + NONCE_LEN {
            return Err(CipherError::TooShort {
                len: ciphertext.len(),
                min: SALT_LEN + NONCE_LEN,
            });
        }
        let (salt, sealed) = ciphertext.split_at(SALT_LEN);
        let key = derive_key(&self.password, salt)?;
        open_with_key(&key, sealed)
    }
}

// ── Primitives ───────────────────────────────────────────────────────────────

/// Derive a 256-bit key from a password and salt using Argon2id.
pub fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], CipherError> {
    let params = Params::new(64 * 1024, 3, 1, Some(KEY_LEN))
        .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

/// A fresh random AES-256 key.
pub fn generate_key() -> [u8; KEY_LEN] {
    let generated = Aes256Gcm::generate_key(&mut AeadOsRng);
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(generated.as_slice());
    key
}

pub fn parse_key_hex(s: &str) -> Result<[u8; KEY_LEN], CipherError> {
    let bytes = hex::decode(s.trim()).map_err(|e| CipherError::InvalidKey(e.to_string()))?;
    <[u8; KEY_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
        CipherError::InvalidKey(format!("expected {KEY_LEN} bytes, got {}", bytes.len()))
    })
}

/// Returns `nonce || ciphertext || tag` under a random nonce.
fn seal_with_key(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| CipherError::EncryptionFailed)?;
    let nonce = Aes256Gcm::generate_nonce(&mut AeadOsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CipherError::EncryptionFailed)?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(nonce.as_slice());
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn open_with_key(key: &[u8; KEY_LEN], data: &[u8]) -> Result<Vec<u8>, CipherError> {
    if data.len() < NONCE_LEN {
        return Err(CipherError::TooShort { len: data.len(), min: NONCE_LEN });
    }
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| CipherError::DecryptionFailed)?;
    let nonce = aes_gcm::Nonce::from_slice(&data[..NONCE_LEN]);
    cipher
        .decrypt(nonce, &data[NONCE_LEN..])
        .map_err(|_| CipherError::DecryptionFailed)
}
