use crate::domain::IdentityValidator;
use common::crypto::{KeyCodec, SecretGenerator};
use common::domain::{
    CreateDeviceRepoInput, Device, DeviceRepository, DomainError, DomainResult,
    GetDeviceByIdentifierRepoInput, GetDeviceRepoInput, GetProductRepoInput, Product,
    ProductRepository, UpdateDeviceInfoRepoInput, UpdateDeviceVersionRepoInput,
};
use garde::Validate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Natural key of a device: `{vendor_id:x}-{product_id:x}-{device_code}`.
///
/// The layout is permanent. Stored identifiers are only ever compared
/// against freshly derived ones, so any change here orphans every
/// existing device row.
pub fn derive_device_identifier(vendor_id: i64, product_id: i64, device_code: &str) -> String {
    format!("{:x}-{:x}-{}", vendor_id, product_id, device_code)
}

/// Service request for a device registration
#[derive(Debug, Clone, Validate)]
pub struct RegisterDeviceRequest {
    /// Checked by key validation, not by garde
    #[garde(skip)]
    pub product_key: String,
    #[garde(length(min = 1))]
    pub device_code: String,
    #[garde(length(min = 1))]
    pub device_version: String,
}

/// Service request for overwriting a device's descriptive fields
#[derive(Debug, Clone, Validate)]
pub struct UpdateDeviceInfoRequest {
    #[garde(length(min = 1))]
    pub device_identifier: String,
    #[garde(skip)]
    pub device_name: String,
    #[garde(skip)]
    pub device_description: String,
}

/// Idempotent device registration plus device lookups.
///
/// Registration is a two-state machine keyed by the device identifier:
/// absent devices are created with a freshly minted key and secret, present
/// devices only get their version refreshed. A lost race on the identifier's
/// unique constraint is folded into the refresh path.
pub struct DeviceProvisioner {
    device_repository: Arc<dyn DeviceRepository>,
    product_repository: Arc<dyn ProductRepository>,
    codec: Arc<KeyCodec>,
    validator: IdentityValidator,
    secret_generator: Arc<dyn SecretGenerator>,
}

impl DeviceProvisioner {
    pub fn new(
        device_repository: Arc<dyn DeviceRepository>,
        product_repository: Arc<dyn ProductRepository>,
        codec: Arc<KeyCodec>,
        secret_generator: Arc<dyn SecretGenerator>,
    ) -> Self {
        Self {
            device_repository,
            product_repository,
            validator: IdentityValidator::new(codec.clone()),
            codec,
            secret_generator,
        }
    }

    #[instrument(
        skip(self, request),
        fields(device_code = %request.device_code, device_version = %request.device_version)
    )]
    pub async fn register_device(&self, request: RegisterDeviceRequest) -> DomainResult<Device> {
        common::garde::validate_struct(&request)?;

        let products = &self.product_repository;
        let product = self
            .validator
            .validate(&request.product_key, |id| {
                products.get_product(GetProductRepoInput { id })
            })
            .await?;

        let device_identifier =
            derive_device_identifier(product.vendor_id, product.id, &request.device_code);

        let existing = self
            .device_repository
            .get_device_by_identifier(GetDeviceByIdentifierRepoInput {
                device_identifier: device_identifier.clone(),
            })
            .await?;

        match existing {
            Some(device) => {
                debug!(device_id = device.id, "device present, refreshing version");
                self.refresh_version(device_identifier, request.device_version)
                    .await
            }
            None => {
                self.provision(&product, device_identifier, request.device_version)
                    .await
            }
        }
    }

    /// Create a device whose key and secret are stamped in the same insert
    async fn provision(
        &self,
        product: &Product,
        device_identifier: String,
        device_version: String,
    ) -> DomainResult<Device> {
        let id = self.device_repository.allocate_device_id().await?;

        let input = CreateDeviceRepoInput {
            id,
            product_id: product.id,
            device_identifier: device_identifier.clone(),
            device_key: self.codec.encode(id)?,
            device_secret: self.secret_generator.generate_secret(),
            device_name: product.product_name.clone(),
            device_description: product.product_description.clone(),
            device_version: device_version.clone(),
        };

        match self.device_repository.create_device(input).await {
            Ok(device) => {
                info!(
                    device_id = device.id,
                    device_identifier = %device.device_identifier,
                    product_id = device.product_id,
                    "device provisioned"
                );
                Ok(device)
            }
            Err(DomainError::DeviceAlreadyExists(_)) => {
                // Another registration inserted first; its row wins
                debug!(
                    device_identifier = %device_identifier,
                    discarded_id = id,
                    "lost registration race, refreshing winner"
                );
                self.refresh_version(device_identifier, device_version)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn refresh_version(
        &self,
        device_identifier: String,
        device_version: String,
    ) -> DomainResult<Device> {
        self.device_repository
            .update_device_version(UpdateDeviceVersionRepoInput {
                device_identifier,
                device_version,
            })
            .await
    }

    #[instrument(skip(self, request), fields(device_identifier = %request.device_identifier))]
    pub async fn update_device_info(
        &self,
        request: UpdateDeviceInfoRequest,
    ) -> DomainResult<Device> {
        common::garde::validate_struct(&request)?;

        let device = self
            .device_repository
            .update_device_info(UpdateDeviceInfoRepoInput {
                device_identifier: request.device_identifier,
                device_name: request.device_name,
                device_description: request.device_description,
            })
            .await?;

        info!(device_id = device.id, "device info updated");
        Ok(device)
    }

    #[instrument(skip(self))]
    pub async fn find_device_by_identifier(&self, device_identifier: &str) -> DomainResult<Device> {
        self.device_repository
            .get_device_by_identifier(GetDeviceByIdentifierRepoInput {
                device_identifier: device_identifier.to_string(),
            })
            .await?
            .ok_or_else(|| DomainError::DeviceNotFound(device_identifier.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn find_device_by_id(&self, device_id: i64) -> DomainResult<Device> {
        self.device_repository
            .get_device(GetDeviceRepoInput { id: device_id })
            .await?
            .ok_or_else(|| DomainError::DeviceNotFound(device_id.to_string()))
    }

    #[instrument(skip_all)]
    pub async fn validate_device(&self, device_key: &str) -> DomainResult<Device> {
        let devices = &self.device_repository;
        self.validator
            .validate(device_key, |id| devices.get_device(GetDeviceRepoInput { id }))
            .await
    }
}
