//! Authenticated encryption for sensitive form answers.
//!
//! # Frame layout
//!
//! ```text
//! base64( nonce[12] || tag[16] || ciphertext[..] )
//! ```
//!
//! - **Cipher**: ChaCha20-Poly1305 with a detached tag
//! - **Nonce**: 12 fresh bytes from the OS RNG on every call
//! - **Key**: 32 raw bytes, configured once per process as base64
//!
//! Every decoding problem (bad framing, truncated input, wrong key, tampered
//! bytes) is reported as the same [`SecureFieldError::Authentication`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce, Tag};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecureFieldError {
    #[error("Secure field encryption is not configured: {0}")]
    Configuration(String),

    #[error("Secure field encryption failed")]
    Encryption,

    #[error("Secure field could not be decrypted")]
    Authentication,
}

/// Encrypts and decrypts secure fields with one process-wide key
#[derive(Clone)]
pub struct SecureFieldCodec {
    cipher: ChaCha20Poly1305,
}

impl std::fmt::Debug for SecureFieldCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureFieldCodec").finish_non_exhaustive()
    }
}

impl SecureFieldCodec {
    pub fn new(secret: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(secret)),
        }
    }

    /// Build from the configured base64 secret, failing fast on anything but 32 bytes
    pub fn from_encoded_secret(encoded: Option<&str>) -> Result<Self, SecureFieldError> {
        let encoded = encoded
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SecureFieldError::Configuration("FIELD_ENCRYPTION_KEY is not set".into()))?;

        let raw = STANDARD.decode(encoded).map_err(|e| {
            SecureFieldError::Configuration(format!("FIELD_ENCRYPTION_KEY is not valid base64: {e}"))
        })?;

        let secret: [u8; KEY_LEN] = raw.as_slice().try_into().map_err(|_| {
            SecureFieldError::Configuration(format!(
                "FIELD_ENCRYPTION_KEY must decode to {} bytes, got {}",
                KEY_LEN,
                raw.len()
            ))
        })?;

        Ok(Self::new(&secret))
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, SecureFieldError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let mut body = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut body)
            .map_err(|_| SecureFieldError::Encryption)?;

        let mut frame = Vec::with_capacity(NONCE_LEN + TAG_LEN + body.len());
        frame.extend_from_slice(&nonce);
        frame.extend_from_slice(tag.as_slice());
        frame.extend_from_slice(&body);

        Ok(STANDARD.encode(frame))
    }

    pub fn decrypt(&self, payload: &str) -> Result<String, SecureFieldError> {
        let frame = STANDARD
            .decode(payload)
            .map_err(|_| SecureFieldError::Authentication)?;

        if frame.len() < NONCE_LEN + TAG_LEN {
            return Err(SecureFieldError::Authentication);
        }

        let (nonce, rest) = frame.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut body = ciphertext.to_vec();
        self.cipher
            .decrypt_in_place_detached(Nonce::from_slice(nonce), b"", &mut body, Tag::from_slice(tag))
            .map_err(|_| SecureFieldError::Authentication)?;

        String::from_utf8(body).map_err(|_| SecureFieldError::Authentication)
    }
}

pub fn encrypt(plaintext: &str, secret: &[u8; KEY_LEN]) -> Result<String, SecureFieldError> {
    SecureFieldCodec::new(secret).encrypt(plaintext)
}

pub fn decrypt(payload: &str, secret: &[u8; KEY_LEN]) -> Result<String, SecureFieldError> {
    SecureFieldCodec::new(secret).decrypt(payload)
}

/// A fresh base64 secret suitable for FIELD_ENCRYPTION_KEY
pub fn generate_secret() -> String {
    let mut secret = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut secret);
    STANDARD.encode(secret)
}
