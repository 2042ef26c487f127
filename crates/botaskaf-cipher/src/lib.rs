//! Form submission tokens.
//!
//! A token is `hex(nonce) ":" hex(ciphertext || tag)`. The plaintext is the
//! issue instant as decimal milliseconds since the Unix epoch, sealed with
//! AES-128-GCM under the owning form's secret. Checking how old a recovered
//! timestamp is belongs to the caller.

use aes_gcm::Aes128Gcm;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use chrono::{DateTime, Utc};

/// Raw key length in bytes. Secrets are twice this many hex digits.
pub const KEY_LEN: usize = 16;
/// AES-GCM default nonce length in bytes.
pub const NONCE_LEN: usize = 12;

const SEPARATOR: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    #[error("secret is not a 16-byte hex key")]
    InvalidSecret,
    #[error("token encryption failed")]
    Encrypt,
    /// Any decrypt failure. The stage that failed is deliberately not reported.
    #[error("invalid token")]
    InvalidToken,
}

/// Generate a fresh form secret: 16 random bytes as upper-case hex.
pub fn generate_secret() -> String {
    hex::encode_upper(Aes128Gcm::generate_key(OsRng))
}

/// Seal `issued_at` under `secret_hex`. Every call draws a fresh nonce.
pub fn encrypt(secret_hex: &str, issued_at: DateTime<Utc>) -> Result<String, CipherError> {
    let cipher = cipher_for(secret_hex).ok_or(CipherError::InvalidSecret)?;
    let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
    let plaintext = issued_at.timestamp_millis().to_string();
    let sealed = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|_| CipherError::Encrypt)?;

    let mut token = hex::encode(nonce);
    token.push(SEPARATOR);
    token.push_str(&hex::encode(sealed));
    Ok(token)
}

/// Recover the issue instant from `token`.
pub fn decrypt(secret_hex: &str, token: &str) -> Result<DateTime<Utc>, CipherError> {
    open(secret_hex, token).ok_or(CipherError::InvalidToken)
}

fn open(secret_hex: &str, token: &str) -> Option<DateTime<Utc>> {
    let (nonce_hex, sealed_hex) = token.split_once(SEPARATOR)?;
    if nonce_hex.is_empty() {
        return None;
    }
    let nonce = hex::decode(nonce_hex).ok()?;
    if nonce.len() != NONCE_LEN {
        return None;
    }
    let sealed = hex::decode(sealed_hex).ok()?;

    let cipher = cipher_for(secret_hex)?;
    let plaintext = cipher
        .decrypt(GenericArray::from_slice(&nonce), sealed.as_slice())
        .ok()?;
    let millis: i64 = std::str::from_utf8(&plaintext).ok()?.parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

fn cipher_for(secret_hex: &str) -> Option<Aes128Gcm> {
    let key = hex::decode(secret_hex).ok()?;
    if key.len() != KEY_LEN {
        return None;
    }
    Aes128Gcm::new_from_slice(&key).ok()
}
