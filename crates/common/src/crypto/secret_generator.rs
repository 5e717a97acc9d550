use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

/// Bytes of randomness behind every generated secret (256 bits)
const SECRET_BYTES: usize = 32;

/// Trait for minting device secrets
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SecretGenerator: Send + Sync {
    /// Generate a fresh secret, unrelated to any identity
    fn generate_secret(&self) -> String;
}

/// Draws secrets from the thread-local CSPRNG and renders them as
/// URL-safe base64 without padding
pub struct RandomSecretGenerator;

impl RandomSecretGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RandomSecretGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretGenerator for RandomSecretGenerator {
    fn generate_secret(&self) -> String {
        let mut random_bytes = [0u8; SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        URL_SAFE_NO_PAD.encode(random_bytes)
    }
}
