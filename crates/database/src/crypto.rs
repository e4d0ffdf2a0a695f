//! Encryption of stored API keys.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use thiserror::Error;
use xsalsa20poly1305::aead::{Aead, KeyInit};
use xsalsa20poly1305::{Key, Nonce, XSalsa20Poly1305};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("master key is empty")]
    MissingKey,
    #[error("invalid ciphertext length: {0}")]
    InvalidCiphertextLength(usize),
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decrypted value is not utf-8")]
    Utf8,
    #[error("crypto failure")]
    Aead,
}

/// XSalsa20-Poly1305 box for short secrets.
///
/// Ciphertexts are `base64(nonce || sealed)` with a random 24-byte nonce.
#[derive(Clone)]
pub struct SecretBox {
    key: [u8; KEY_LEN],
}

impl SecretBox {
    /// Build from a master secret.
    ///
    /// Accepts 32 raw bytes as hex (optionally `hex:`-prefixed) or base64;
    /// any other value is treated as a passphrase and hashed with SHA-256.
    pub fn from_secret(secret: &str) -> Result<Self, CryptoError> {
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            return Err(CryptoError::MissingKey);
        }
        Ok(Self {
            key: decode_key(trimmed),
        })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let cipher = XSalsa20Poly1305::new(Key::from_slice(&self.key));
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let sealed = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Aead)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(STANDARD.encode(out))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let input = STANDARD.decode(encoded.trim())?;
        if input.len() < NONCE_LEN {
            return Err(CryptoError::InvalidCiphertextLength(input.len()));
        }
        let (nonce_bytes, sealed) = input.split_at(NONCE_LEN);
        let cipher = XSalsa20Poly1305::new(Key::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| CryptoError::Aead)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::Utf8)
    }
}

impl std::fmt::Debug for SecretBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretBox(<redacted>)")
    }
}

fn decode_key(value: &str) -> [u8; KEY_LEN] {
    let raw = if let Some(hex_value) = value.strip_prefix("hex:") {
        hex::decode(hex_value).ok()
    } else if value.len() == KEY_LEN * 2 && value.chars().all(|c| c.is_ascii_hexdigit()) {
        hex::decode(value).ok()
    } else {
        STANDARD.decode(value).ok()
    };

    let mut key = [0u8; KEY_LEN];
    match raw {
        Some(bytes) if bytes.len() == KEY_LEN => key.copy_from_slice(&bytes),
        _ => key.copy_from_slice(&Sha256::digest(value.as_bytes())),
    }
    key
}
