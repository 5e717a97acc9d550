use crate::config::RegistryConfig;
use crate::domain::{
    ApplicationService, DeviceProvisioner, ProductService, RegisterDeviceRequest,
    SaveApplicationRequest, SaveProductRequest, SaveVendorRequest, UpdateDeviceInfoRequest,
    VendorService,
};
use anyhow::Context;
use common::crypto::{KeyCodec, RandomSecretGenerator, SecretGenerator};
use common::domain::{
    Application, ApplicationRepository, Device, DeviceRepository, DomainResult,
    InMemoryRegistryStore, Product, ProductRepository, Vendor, VendorRepository,
};
use common::postgres::{
    run_migrations, PostgresApplicationRepository, PostgresClient, PostgresDeviceRepository,
    PostgresProductRepository, PostgresVendorRepository,
};
use std::sync::Arc;
use tracing::info;

/// Storage backends behind a [`Registry`]
#[derive(Clone)]
pub struct RegistryRepositories {
    pub vendor: Arc<dyn VendorRepository>,
    pub product: Arc<dyn ProductRepository>,
    pub application: Arc<dyn ApplicationRepository>,
    pub device: Arc<dyn DeviceRepository>,
}

impl RegistryRepositories {
    pub fn postgres(client: PostgresClient) -> Self {
        Self {
            vendor: Arc::new(PostgresVendorRepository::new(client.clone())),
            product: Arc::new(PostgresProductRepository::new(client.clone())),
            application: Arc::new(PostgresApplicationRepository::new(client.clone())),
            device: Arc::new(PostgresDeviceRepository::new(client)),
        }
    }

    /// Every repository backed by the one shared store
    pub fn in_memory(store: Arc<InMemoryRegistryStore>) -> Self {
        Self {
            vendor: store.clone(),
            product: store.clone(),
            application: store.clone(),
            device: store,
        }
    }
}

/// Call boundary of the registry.
///
/// Holds no state of its own beyond the services; every call is a short
/// sequence of store operations and is safe to run concurrently.
pub struct Registry {
    vendors: VendorService,
    products: ProductService,
    applications: ApplicationService,
    devices: DeviceProvisioner,
}

impl Registry {
    pub fn new(
        codec: KeyCodec,
        repositories: RegistryRepositories,
        secret_generator: Arc<dyn SecretGenerator>,
    ) -> Self {
        let codec = Arc::new(codec);

        Self {
            vendors: VendorService::new(repositories.vendor.clone(), codec.clone()),
            products: ProductService::new(
                repositories.product.clone(),
                repositories.vendor,
                codec.clone(),
            ),
            applications: ApplicationService::new(repositories.application, codec.clone()),
            devices: DeviceProvisioner::new(
                repositories.device,
                repositories.product,
                codec,
                secret_generator,
            ),
        }
    }

    /// Registry over an in-process store, with random device secrets
    pub fn in_memory(codec: KeyCodec, store: Arc<InMemoryRegistryStore>) -> Self {
        Self::new(
            codec,
            RegistryRepositories::in_memory(store),
            Arc::new(RandomSecretGenerator::new()),
        )
    }

    /// Connect to PostgreSQL, apply pending migrations and build the registry
    pub async fn connect(config: &RegistryConfig) -> anyhow::Result<Self> {
        let codec = config.key_codec().context("invalid registry AES key")?;

        info!(
            host = %config.postgres_host,
            port = config.postgres_port,
            database = %config.postgres_database,
            "Initializing PostgreSQL..."
        );

        let client = PostgresClient::new(&config.postgres_config())?;
        client.ping().await.context("PostgreSQL is unreachable")?;
        run_migrations(&client).await?;

        info!("Registry ready");

        Ok(Self::new(
            codec,
            RegistryRepositories::postgres(client),
            Arc::new(RandomSecretGenerator::new()),
        ))
    }

    pub async fn save_vendor(&self, request: SaveVendorRequest) -> DomainResult<Vendor> {
        self.vendors.save_vendor(request).await
    }

    pub async fn save_product(&self, request: SaveProductRequest) -> DomainResult<Product> {
        self.products.save_product(request).await
    }

    pub async fn save_application(
        &self,
        request: SaveApplicationRequest,
    ) -> DomainResult<Application> {
        self.applications.save_application(request).await
    }

    pub async fn validate_vendor(&self, vendor_key: &str) -> DomainResult<Vendor> {
        self.vendors.validate_vendor(vendor_key).await
    }

    pub async fn validate_product(&self, product_key: &str) -> DomainResult<Product> {
        self.products.validate_product(product_key).await
    }

    pub async fn validate_application(&self, app_key: &str) -> DomainResult<Application> {
        self.applications.validate_application(app_key).await
    }

    pub async fn validate_device(&self, device_key: &str) -> DomainResult<Device> {
        self.devices.validate_device(device_key).await
    }

    pub async fn find_product(&self, product_id: i64) -> DomainResult<Product> {
        self.products.find_product(product_id).await
    }

    pub async fn register_device(
        &self,
        product_key: &str,
        device_code: &str,
        device_version: &str,
    ) -> DomainResult<Device> {
        self.devices
            .register_device(RegisterDeviceRequest {
                product_key: product_key.to_string(),
                device_code: device_code.to_string(),
                device_version: device_version.to_string(),
            })
            .await
    }

    pub async fn find_device_by_identifier(&self, device_identifier: &str) -> DomainResult<Device> {
        self.devices.find_device_by_identifier(device_identifier).await
    }

    pub async fn find_device_by_id(&self, device_id: i64) -> DomainResult<Device> {
        self.devices.find_device_by_id(device_id).await
    }

    pub async fn update_device_info(
        &self,
        device_identifier: &str,
        device_name: &str,
        device_description: &str,
    ) -> DomainResult<Device> {
        self.devices
            .update_device_info(UpdateDeviceInfoRequest {
                device_identifier: device_identifier.to_string(),
                device_name: device_name.to_string(),
                device_description: device_description.to_string(),
            })
            .await
    }
}
