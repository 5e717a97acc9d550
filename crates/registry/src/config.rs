use common::crypto::{KeyCodec, KeyCodecError};
use common::postgres::PostgresConfig;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::fmt;

#[derive(Deserialize, Clone)]
pub struct RegistryConfig {
    /// Hex-encoded 32-byte secret behind every issued key. Required.
    pub aes_key: String,

    // PostgreSQL configuration
    /// PostgreSQL host
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    /// PostgreSQL port
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    /// PostgreSQL database name
    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    /// PostgreSQL username
    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    /// PostgreSQL password
    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    /// Upper bound on pooled connections
    #[serde(default = "default_postgres_max_pool_size")]
    pub postgres_max_pool_size: usize,
}

// PostgreSQL defaults
fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "registry".to_string()
}

fn default_postgres_username() -> String {
    "registry".to_string()
}

fn default_postgres_password() -> String {
    "registry".to_string()
}

fn default_postgres_max_pool_size() -> usize {
    10
}

impl RegistryConfig {
    /// Load configuration from `REGISTRY_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("REGISTRY"))
            .build()?
            .try_deserialize()
    }

    pub fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig {
            host: self.postgres_host.clone(),
            port: self.postgres_port,
            database: self.postgres_database.clone(),
            username: self.postgres_username.clone(),
            password: self.postgres_password.clone(),
            max_pool_size: self.postgres_max_pool_size,
        }
    }

    pub fn key_codec(&self) -> Result<KeyCodec, KeyCodecError> {
        KeyCodec::from_hex(&self.aes_key)
    }
}

// Secrets stay out of logs
impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("aes_key", &"<redacted>")
            .field("postgres_host", &self.postgres_host)
            .field("postgres_port", &self.postgres_port)
            .field("postgres_database", &self.postgres_database)
            .field("postgres_username", &self.postgres_username)
            .field("postgres_password", &"<redacted>")
            .field("postgres_max_pool_size", &self.postgres_max_pool_size)
            .finish()
    }
}
