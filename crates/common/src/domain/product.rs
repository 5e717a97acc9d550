use crate::domain::{DomainResult, EntityKind, KeyedRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Product domain entity, owned by a vendor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub vendor_id: i64,
    pub product_key: String,
    pub product_name: String,
    pub product_description: String,
    /// Opaque product configuration document
    pub product_config: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl KeyedRecord for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> i64 {
        self.id
    }

    fn key(&self) -> &str {
        &self.product_key
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProductRepoInput {
    pub id: i64,
    pub vendor_id: i64,
    pub product_key: String,
    pub product_name: String,
    pub product_description: String,
    pub product_config: String,
}

/// Owning vendor and key are fixed at creation and cannot be updated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProductRepoInput {
    pub id: i64,
    pub product_name: String,
    pub product_description: String,
    pub product_config: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetProductRepoInput {
    pub id: i64,
}

/// Repository trait for product storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn allocate_product_id(&self) -> DomainResult<i64>;

    /// Returns `VendorNotFound` when the owning vendor does not exist
    async fn create_product(&self, input: CreateProductRepoInput) -> DomainResult<Product>;

    async fn update_product(&self, input: UpdateProductRepoInput) -> DomainResult<Product>;

    async fn get_product(&self, input: GetProductRepoInput) -> DomainResult<Option<Product>>;
}
