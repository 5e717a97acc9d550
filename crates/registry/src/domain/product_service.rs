use crate::domain::IdentityValidator;
use common::crypto::KeyCodec;
use common::domain::{
    CreateProductRepoInput, DomainError, DomainResult, GetProductRepoInput, GetVendorRepoInput,
    Product, ProductRepository, UpdateProductRepoInput, VendorRepository,
};
use garde::Validate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Service request for creating (no id) or updating (id set) a product.
/// `vendor_id` is only consulted on creation.
#[derive(Debug, Clone, Validate)]
pub struct SaveProductRequest {
    #[garde(skip)]
    pub id: Option<i64>,
    #[garde(skip)]
    pub vendor_id: i64,
    #[garde(length(min = 1))]
    pub product_name: String,
    #[garde(skip)]
    pub product_description: String,
    #[garde(skip)]
    pub product_config: String,
}

/// Domain service for product bookkeeping and product key validation
pub struct ProductService {
    product_repository: Arc<dyn ProductRepository>,
    vendor_repository: Arc<dyn VendorRepository>,
    codec: Arc<KeyCodec>,
    validator: IdentityValidator,
}

impl ProductService {
    pub fn new(
        product_repository: Arc<dyn ProductRepository>,
        vendor_repository: Arc<dyn VendorRepository>,
        codec: Arc<KeyCodec>,
    ) -> Self {
        Self {
            product_repository,
            vendor_repository,
            validator: IdentityValidator::new(codec.clone()),
            codec,
        }
    }

    #[instrument(skip(self, request), fields(product_id = ?request.id, vendor_id = request.vendor_id))]
    pub async fn save_product(&self, request: SaveProductRequest) -> DomainResult<Product> {
        common::garde::validate_struct(&request)?;

        if let Some(id) = request.id {
            debug!(product_id = id, "updating product");
            return self
                .product_repository
                .update_product(UpdateProductRepoInput {
                    id,
                    product_name: request.product_name,
                    product_description: request.product_description,
                    product_config: request.product_config,
                })
                .await;
        }

        // Reject orphans before consuming an identity
        self.vendor_repository
            .get_vendor(GetVendorRepoInput {
                id: request.vendor_id,
            })
            .await?
            .ok_or_else(|| DomainError::VendorNotFound(request.vendor_id.to_string()))?;

        let id = self.product_repository.allocate_product_id().await?;
        let product_key = self.codec.encode(id)?;

        let product = self
            .product_repository
            .create_product(CreateProductRepoInput {
                id,
                vendor_id: request.vendor_id,
                product_key,
                product_name: request.product_name,
                product_description: request.product_description,
                product_config: request.product_config,
            })
            .await?;

        info!(product_id = product.id, vendor_id = product.vendor_id, "product created");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn find_product(&self, product_id: i64) -> DomainResult<Product> {
        self.product_repository
            .get_product(GetProductRepoInput { id: product_id })
            .await?
            .ok_or_else(|| DomainError::ProductNotFound(product_id.to_string()))
    }

    #[instrument(skip_all)]
    pub async fn validate_product(&self, product_key: &str) -> DomainResult<Product> {
        let products = &self.product_repository;
        self.validator
            .validate(product_key, |id| {
                products.get_product(GetProductRepoInput { id })
            })
            .await
    }
}
