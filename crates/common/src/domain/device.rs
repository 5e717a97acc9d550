use crate::domain::{DomainResult, EntityKind, KeyedRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Device domain entity, owned by a product
///
/// `device_identifier`, `device_key` and `device_secret` are written once when
/// the device is first registered and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: i64,
    pub product_id: i64,
    pub device_identifier: String,
    pub device_key: String,
    pub device_secret: String,
    pub device_name: String,
    pub device_description: String,
    pub device_version: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl KeyedRecord for Device {
    const KIND: EntityKind = EntityKind::Device;

    fn id(&self) -> i64 {
        self.id
    }

    fn key(&self) -> &str {
        &self.device_key
    }
}

/// Fully provisioned device row, inserted in a single write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDeviceRepoInput {
    pub id: i64,
    pub product_id: i64,
    pub device_identifier: String,
    pub device_key: String,
    pub device_secret: String,
    pub device_name: String,
    pub device_description: String,
    pub device_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDeviceRepoInput {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDeviceByIdentifierRepoInput {
    pub device_identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDeviceVersionRepoInput {
    pub device_identifier: String,
    pub device_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDeviceInfoRepoInput {
    pub device_identifier: String,
    pub device_name: String,
    pub device_description: String,
}

/// Repository trait for device storage operations
///
/// Implementations must enforce uniqueness of `device_identifier`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn allocate_device_id(&self) -> DomainResult<i64>;

    /// Returns `DeviceAlreadyExists` when another row already holds the identifier
    async fn create_device(&self, input: CreateDeviceRepoInput) -> DomainResult<Device>;

    async fn get_device(&self, input: GetDeviceRepoInput) -> DomainResult<Option<Device>>;

    async fn get_device_by_identifier(
        &self,
        input: GetDeviceByIdentifierRepoInput,
    ) -> DomainResult<Option<Device>>;

    /// Overwrites only the version; returns `DeviceNotFound` for unknown identifiers
    async fn update_device_version(
        &self,
        input: UpdateDeviceVersionRepoInput,
    ) -> DomainResult<Device>;

    /// Overwrites only name and description; returns `DeviceNotFound` for unknown identifiers
    async fn update_device_info(&self, input: UpdateDeviceInfoRepoInput) -> DomainResult<Device>;
}
