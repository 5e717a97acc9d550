use crate::domain::{DomainResult, EntityKind, KeyedRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Vendor domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vendor {
    pub id: i64,
    pub vendor_key: String,
    pub vendor_name: String,
    pub vendor_description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl KeyedRecord for Vendor {
    const KIND: EntityKind = EntityKind::Vendor;

    fn id(&self) -> i64 {
        self.id
    }

    fn key(&self) -> &str {
        &self.vendor_key
    }
}

/// Repository input for inserting a vendor whose id and key are already minted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateVendorRepoInput {
    pub id: i64,
    pub vendor_key: String,
    pub vendor_name: String,
    pub vendor_description: String,
}

/// Repository input for overwriting descriptive vendor fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateVendorRepoInput {
    pub id: i64,
    pub vendor_name: String,
    pub vendor_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetVendorRepoInput {
    pub id: i64,
}

/// Repository trait for vendor storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait VendorRepository: Send + Sync {
    /// Reserve the identity the next vendor will be inserted under
    async fn allocate_vendor_id(&self) -> DomainResult<i64>;

    async fn create_vendor(&self, input: CreateVendorRepoInput) -> DomainResult<Vendor>;

    /// Returns `VendorNotFound` when no vendor has the given id
    async fn update_vendor(&self, input: UpdateVendorRepoInput) -> DomainResult<Vendor>;

    async fn get_vendor(&self, input: GetVendorRepoInput) -> DomainResult<Option<Vendor>>;
}
