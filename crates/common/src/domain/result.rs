use crate::domain::EntityKind;
use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("{0} key does not match")]
    KeyMismatch(EntityKind),

    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    #[error("Vendor not found: {0}")]
    VendorNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Application not found: {0}")]
    ApplicationNotFound(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device already exists: {0}")]
    DeviceAlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}
