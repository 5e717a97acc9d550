use crate::domain::DomainError;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

/// Length of the shared AES-256 secret in bytes
pub const KEY_CODEC_SECRET_LEN: usize = 32;

/// AES-GCM nonce length in bytes (96-bit)
const NONCE_LEN: usize = 12;

/// Big-endian identity followed by random salt
const IDENTITY_LEN: usize = 8;
const SALT_LEN: usize = 8;
const BLOCK_LEN: usize = IDENTITY_LEN + SALT_LEN;

/// AES-GCM authentication tag length in bytes
const TAG_LEN: usize = 16;

/// Raw key length before hex rendering: nonce || ciphertext || tag
const RAW_KEY_LEN: usize = NONCE_LEN + BLOCK_LEN + TAG_LEN;

/// Length of an encoded key in hex characters
pub const ENCODED_KEY_LEN: usize = RAW_KEY_LEN * 2;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyCodecError {
    #[error("Invalid secret length: expected {expected} bytes, got {got}")]
    InvalidSecretLength { expected: usize, got: usize },

    #[error("Secret is not valid hex: {0}")]
    InvalidSecretEncoding(String),

    #[error("Identity must be non-negative, got {0}")]
    NegativeIdentity(i64),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key is not valid hex: {0}")]
    InvalidEncoding(String),

    #[error("Invalid key length: expected {expected} characters, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Key was not issued under this secret or has been altered")]
    Unauthenticated,
}

impl From<KeyCodecError> for DomainError {
    fn from(error: KeyCodecError) -> Self {
        match error {
            KeyCodecError::InvalidEncoding(_)
            | KeyCodecError::InvalidLength { .. }
            | KeyCodecError::Unauthenticated => DomainError::InvalidKey(error.to_string()),
            KeyCodecError::InvalidSecretLength { .. }
            | KeyCodecError::InvalidSecretEncoding(_)
            | KeyCodecError::NegativeIdentity(_)
            | KeyCodecError::EncryptionFailed(_) => {
                DomainError::KeyGenerationError(error.to_string())
            }
        }
    }
}

/// Turns numeric identities into opaque, unlinkable keys and back.
///
/// Each key is the AES-256-GCM encryption of the identity plus fresh salt
/// under a fresh nonce, rendered as lowercase hex. Encoding one identity
/// twice yields two different keys that both decode to it. Decoding
/// authenticates the key, so altered or foreign keys are rejected outright.
///
/// Every deployment sharing a store must share the same secret; changing it
/// invalidates every key issued before.
pub struct KeyCodec {
    cipher: Aes256Gcm,
}

impl KeyCodec {
    pub fn new(secret: &[u8]) -> Result<Self, KeyCodecError> {
        if secret.len() != KEY_CODEC_SECRET_LEN {
            return Err(KeyCodecError::InvalidSecretLength {
                expected: KEY_CODEC_SECRET_LEN,
                got: secret.len(),
            });
        }

        let cipher =
            Aes256Gcm::new_from_slice(secret).map_err(|_| KeyCodecError::InvalidSecretLength {
                expected: KEY_CODEC_SECRET_LEN,
                got: secret.len(),
            })?;

        Ok(Self { cipher })
    }

    /// Builds a codec from a secret given as 64 hex characters
    pub fn from_hex(secret: &str) -> Result<Self, KeyCodecError> {
        let bytes = Zeroizing::new(
            hex::decode(secret.trim())
                .map_err(|e| KeyCodecError::InvalidSecretEncoding(e.to_string()))?,
        );
        Self::new(&bytes)
    }

    pub fn encode(&self, id: i64) -> Result<String, KeyCodecError> {
        if id < 0 {
            return Err(KeyCodecError::NegativeIdentity(id));
        }

        let mut rng = rand::thread_rng();

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce_bytes);

        let mut block = Zeroizing::new([0u8; BLOCK_LEN]);
        block[..IDENTITY_LEN].copy_from_slice(&id.to_be_bytes());
        rng.fill_bytes(&mut block[IDENTITY_LEN..]);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), &block[..])
            .map_err(|e| KeyCodecError::EncryptionFailed(e.to_string()))?;

        let mut raw = Vec::with_capacity(RAW_KEY_LEN);
        raw.extend_from_slice(&nonce_bytes);
        raw.extend_from_slice(&ciphertext);

        Ok(hex::encode(raw))
    }

    pub fn decode(&self, key: &str) -> Result<i64, KeyCodecError> {
        if key.len() != ENCODED_KEY_LEN {
            return Err(KeyCodecError::InvalidLength {
                expected: ENCODED_KEY_LEN,
                got: key.len(),
            });
        }

        let raw = hex::decode(key).map_err(|e| KeyCodecError::InvalidEncoding(e.to_string()))?;
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);

        let block = Zeroizing::new(
            self.cipher
                .decrypt(Nonce::from_slice(nonce), ciphertext)
                .map_err(|_| KeyCodecError::Unauthenticated)?,
        );

        let mut identity = [0u8; IDENTITY_LEN];
        identity.copy_from_slice(&block[..IDENTITY_LEN]);

        Ok(i64::from_be_bytes(identity))
    }
}

impl fmt::Debug for KeyCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCodec").finish_non_exhaustive()
    }
}
