use crate::domain::IdentityValidator;
use common::crypto::KeyCodec;
use common::domain::{
    CreateVendorRepoInput, DomainResult, GetVendorRepoInput, UpdateVendorRepoInput, Vendor,
    VendorRepository,
};
use garde::Validate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Service request for creating (no id) or updating (id set) a vendor
#[derive(Debug, Clone, Validate)]
pub struct SaveVendorRequest {
    #[garde(skip)]
    pub id: Option<i64>,
    #[garde(length(min = 1))]
    pub vendor_name: String,
    #[garde(skip)]
    pub vendor_description: String,
}

/// Domain service for vendor bookkeeping and vendor key validation
pub struct VendorService {
    vendor_repository: Arc<dyn VendorRepository>,
    codec: Arc<KeyCodec>,
    validator: IdentityValidator,
}

impl VendorService {
    pub fn new(vendor_repository: Arc<dyn VendorRepository>, codec: Arc<KeyCodec>) -> Self {
        Self {
            vendor_repository,
            validator: IdentityValidator::new(codec.clone()),
            codec,
        }
    }

    /// Create or update a vendor.
    /// The vendor key is minted once on creation and left untouched by updates.
    #[instrument(skip(self, request), fields(vendor_id = ?request.id, vendor_name = %request.vendor_name))]
    pub async fn save_vendor(&self, request: SaveVendorRequest) -> DomainResult<Vendor> {
        common::garde::validate_struct(&request)?;

        if let Some(id) = request.id {
            debug!(vendor_id = id, "updating vendor");
            return self
                .vendor_repository
                .update_vendor(UpdateVendorRepoInput {
                    id,
                    vendor_name: request.vendor_name,
                    vendor_description: request.vendor_description,
                })
                .await;
        }

        let id = self.vendor_repository.allocate_vendor_id().await?;
        let vendor_key = self.codec.encode(id)?;

        let vendor = self
            .vendor_repository
            .create_vendor(CreateVendorRepoInput {
                id,
                vendor_key,
                vendor_name: request.vendor_name,
                vendor_description: request.vendor_description,
            })
            .await?;

        info!(vendor_id = vendor.id, "vendor created");
        Ok(vendor)
    }

    #[instrument(skip_all)]
    pub async fn validate_vendor(&self, vendor_key: &str) -> DomainResult<Vendor> {
        let vendors = &self.vendor_repository;
        self.validator
            .validate(vendor_key, |id| vendors.get_vendor(GetVendorRepoInput { id }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::{DomainError, EntityKind, MockVendorRepository};

    fn codec() -> Arc<KeyCodec> {
        Arc::new(KeyCodec::new(&[1u8; 32]).unwrap())
    }

    fn vendor_from(input: CreateVendorRepoInput) -> Vendor {
        Vendor {
            id: input.id,
            vendor_key: input.vendor_key,
            vendor_name: input.vendor_name,
            vendor_description: input.vendor_description,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_save_vendor_creates_with_key() {
        let codec = codec();
        let mut mock_repo = MockVendorRepository::new();

        mock_repo
            .expect_allocate_vendor_id()
            .times(1)
            .return_once(|| Ok(7));
        mock_repo
            .expect_create_vendor()
            .withf(|input: &CreateVendorRepoInput| input.id == 7 && input.vendor_name == "Acme")
            .times(1)
            .returning(|input| Ok(vendor_from(input)));

        let service = VendorService::new(Arc::new(mock_repo), codec.clone());

        let vendor = service
            .save_vendor(SaveVendorRequest {
                id: None,
                vendor_name: "Acme".to_string(),
                vendor_description: "Sensors".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(vendor.id, 7);
        assert_eq!(codec.decode(&vendor.vendor_key).unwrap(), 7);
    }

    #[tokio::test]
    async fn test_save_vendor_updates_without_new_key() {
        let mut mock_repo = MockVendorRepository::new();

        mock_repo.expect_allocate_vendor_id().times(0);
        mock_repo.expect_create_vendor().times(0);
        mock_repo
            .expect_update_vendor()
            .withf(|input: &UpdateVendorRepoInput| input.id == 3 && input.vendor_name == "Renamed")
            .times(1)
            .returning(|input| {
                Ok(Vendor {
                    id: input.id,
                    vendor_key: "existing-key".to_string(),
                    vendor_name: input.vendor_name,
                    vendor_description: input.vendor_description,
                    created_at: None,
                    updated_at: None,
                })
            });

        let service = VendorService::new(Arc::new(mock_repo), codec());

        let vendor = service
            .save_vendor(SaveVendorRequest {
                id: Some(3),
                vendor_name: "Renamed".to_string(),
                vendor_description: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(vendor.vendor_key, "existing-key");
    }

    #[tokio::test]
    async fn test_save_vendor_empty_name() {
        let service = VendorService::new(Arc::new(MockVendorRepository::new()), codec());

        let result = service
            .save_vendor(SaveVendorRequest {
                id: None,
                vendor_name: String::new(),
                vendor_description: String::new(),
            })
            .await;

        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_validate_vendor_mismatch() {
        let codec = codec();
        let presented = codec.encode(5).unwrap();
        let canonical = codec.encode(5).unwrap();
        let mut mock_repo = MockVendorRepository::new();

        mock_repo
            .expect_get_vendor()
            .withf(|input: &GetVendorRepoInput| input.id == 5)
            .times(1)
            .return_once(move |_| {
                Ok(Some(Vendor {
                    id: 5,
                    vendor_key: canonical,
                    vendor_name: "Acme".to_string(),
                    vendor_description: String::new(),
                    created_at: None,
                    updated_at: None,
                }))
            });

        let service = VendorService::new(Arc::new(mock_repo), codec);

        let result = service.validate_vendor(&presented).await;
        assert!(matches!(
            result,
            Err(DomainError::KeyMismatch(EntityKind::Vendor))
        ));
    }
}
