use crate::domain::{
    Application, ApplicationRepository, CreateApplicationRepoInput, CreateDeviceRepoInput,
    CreateProductRepoInput, CreateVendorRepoInput, Device, DeviceRepository, DomainError,
    DomainResult, GetApplicationRepoInput, GetDeviceByIdentifierRepoInput, GetDeviceRepoInput,
    GetProductRepoInput, GetVendorRepoInput, Product, ProductRepository,
    UpdateApplicationRepoInput, UpdateDeviceInfoRepoInput, UpdateDeviceVersionRepoInput,
    UpdateProductRepoInput, UpdateVendorRepoInput, Vendor, VendorRepository,
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    vendors: HashMap<i64, Vendor>,
    products: HashMap<i64, Product>,
    applications: HashMap<i64, Application>,
    devices: HashMap<i64, Device>,
    /// Unique index over `devices.device_identifier`
    device_identifiers: HashMap<String, i64>,
}

/// Per-table identity sequence starting at 1
struct Sequence(AtomicI64);

impl Sequence {
    fn new() -> Self {
        Self(AtomicI64::new(1))
    }

    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// In-memory implementation of every registry repository.
///
/// All tables sit behind one lock so the device identifier uniqueness check
/// and the insert happen atomically, the same guarantee the SQL unique
/// constraint gives the PostgreSQL repositories.
pub struct InMemoryRegistryStore {
    tables: RwLock<Tables>,
    vendor_ids: Sequence,
    product_ids: Sequence,
    application_ids: Sequence,
    device_ids: Sequence,
}

impl InMemoryRegistryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            vendor_ids: Sequence::new(),
            product_ids: Sequence::new(),
            application_ids: Sequence::new(),
            device_ids: Sequence::new(),
        }
    }

    pub async fn device_count(&self) -> usize {
        self.tables.read().await.devices.len()
    }
}

impl Default for InMemoryRegistryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate_identity(table: &str, id: i64) -> DomainError {
    DomainError::RepositoryError(anyhow!("duplicate primary key {} in {}", id, table))
}

#[async_trait]
impl VendorRepository for InMemoryRegistryStore {
    async fn allocate_vendor_id(&self) -> DomainResult<i64> {
        Ok(self.vendor_ids.next())
    }

    async fn create_vendor(&self, input: CreateVendorRepoInput) -> DomainResult<Vendor> {
        let mut tables = self.tables.write().await;
        if tables.vendors.contains_key(&input.id) {
            return Err(duplicate_identity("vendors", input.id));
        }

        let now = Utc::now();
        let vendor = Vendor {
            id: input.id,
            vendor_key: input.vendor_key,
            vendor_name: input.vendor_name,
            vendor_description: input.vendor_description,
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.vendors.insert(vendor.id, vendor.clone());
        Ok(vendor)
    }

    async fn update_vendor(&self, input: UpdateVendorRepoInput) -> DomainResult<Vendor> {
        let mut tables = self.tables.write().await;
        let vendor = tables
            .vendors
            .get_mut(&input.id)
            .ok_or_else(|| DomainError::VendorNotFound(input.id.to_string()))?;

        vendor.vendor_name = input.vendor_name;
        vendor.vendor_description = input.vendor_description;
        vendor.updated_at = Some(Utc::now());
        Ok(vendor.clone())
    }

    async fn get_vendor(&self, input: GetVendorRepoInput) -> DomainResult<Option<Vendor>> {
        Ok(self.tables.read().await.vendors.get(&input.id).cloned())
    }
}

#[async_trait]
impl ProductRepository for InMemoryRegistryStore {
    async fn allocate_product_id(&self) -> DomainResult<i64> {
        Ok(self.product_ids.next())
    }

    async fn create_product(&self, input: CreateProductRepoInput) -> DomainResult<Product> {
        let mut tables = self.tables.write().await;
        if !tables.vendors.contains_key(&input.vendor_id) {
            return Err(DomainError::VendorNotFound(input.vendor_id.to_string()));
        }
        if tables.products.contains_key(&input.id) {
            return Err(duplicate_identity("products", input.id));
        }

        let now = Utc::now();
        let product = Product {
            id: input.id,
            vendor_id: input.vendor_id,
            product_key: input.product_key,
            product_name: input.product_name,
            product_description: input.product_description,
            product_config: input.product_config,
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, input: UpdateProductRepoInput) -> DomainResult<Product> {
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .get_mut(&input.id)
            .ok_or_else(|| DomainError::ProductNotFound(input.id.to_string()))?;

        product.product_name = input.product_name;
        product.product_description = input.product_description;
        product.product_config = input.product_config;
        product.updated_at = Some(Utc::now());
        Ok(product.clone())
    }

    async fn get_product(&self, input: GetProductRepoInput) -> DomainResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&input.id).cloned())
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryRegistryStore {
    async fn allocate_application_id(&self) -> DomainResult<i64> {
        Ok(self.application_ids.next())
    }

    async fn create_application(
        &self,
        input: CreateApplicationRepoInput,
    ) -> DomainResult<Application> {
        let mut tables = self.tables.write().await;
        if tables.applications.contains_key(&input.id) {
            return Err(duplicate_identity("applications", input.id));
        }

        let now = Utc::now();
        let application = Application {
            id: input.id,
            app_key: input.app_key,
            app_name: input.app_name,
            app_description: input.app_description,
            app_domain: input.app_domain,
            app_token: input.app_token,
            report_url: input.report_url,
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.applications.insert(application.id, application.clone());
        Ok(application)
    }

    async fn update_application(
        &self,
        input: UpdateApplicationRepoInput,
    ) -> DomainResult<Application> {
        let mut tables = self.tables.write().await;
        let application = tables
            .applications
            .get_mut(&input.id)
            .ok_or_else(|| DomainError::ApplicationNotFound(input.id.to_string()))?;

        application.app_name = input.app_name;
        application.app_description = input.app_description;
        application.app_domain = input.app_domain;
        application.app_token = input.app_token;
        application.report_url = input.report_url;
        application.updated_at = Some(Utc::now());
        Ok(application.clone())
    }

    async fn get_application(
        &self,
        input: GetApplicationRepoInput,
    ) -> DomainResult<Option<Application>> {
        Ok(self.tables.read().await.applications.get(&input.id).cloned())
    }
}

#[async_trait]
impl DeviceRepository for InMemoryRegistryStore {
    async fn allocate_device_id(&self) -> DomainResult<i64> {
        Ok(self.device_ids.next())
    }

    async fn create_device(&self, input: CreateDeviceRepoInput) -> DomainResult<Device> {
        let mut tables = self.tables.write().await;
        if tables.device_identifiers.contains_key(&input.device_identifier) {
            return Err(DomainError::DeviceAlreadyExists(input.device_identifier));
        }
        if !tables.products.contains_key(&input.product_id) {
            return Err(DomainError::ProductNotFound(input.product_id.to_string()));
        }
        if tables.devices.contains_key(&input.id) {
            return Err(duplicate_identity("devices", input.id));
        }

        let now = Utc::now();
        let device = Device {
            id: input.id,
            product_id: input.product_id,
            device_identifier: input.device_identifier,
            device_key: input.device_key,
            device_secret: input.device_secret,
            device_name: input.device_name,
            device_description: input.device_description,
            device_version: input.device_version,
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables
            .device_identifiers
            .insert(device.device_identifier.clone(), device.id);
        tables.devices.insert(device.id, device.clone());
        Ok(device)
    }

    async fn get_device(&self, input: GetDeviceRepoInput) -> DomainResult<Option<Device>> {
        Ok(self.tables.read().await.devices.get(&input.id).cloned())
    }

    async fn get_device_by_identifier(
        &self,
        input: GetDeviceByIdentifierRepoInput,
    ) -> DomainResult<Option<Device>> {
        let tables = self.tables.read().await;
        Ok(tables
            .device_identifiers
            .get(&input.device_identifier)
            .and_then(|id| tables.devices.get(id))
            .cloned())
    }

    async fn update_device_version(
        &self,
        input: UpdateDeviceVersionRepoInput,
    ) -> DomainResult<Device> {
        let mut tables = self.tables.write().await;
        let device = device_by_identifier_mut(&mut tables, &input.device_identifier)?;

        device.device_version = input.device_version;
        device.updated_at = Some(Utc::now());
        Ok(device.clone())
    }

    async fn update_device_info(&self, input: UpdateDeviceInfoRepoInput) -> DomainResult<Device> {
        let mut tables = self.tables.write().await;
        let device = device_by_identifier_mut(&mut tables, &input.device_identifier)?;

        device.device_name = input.device_name;
        device.device_description = input.device_description;
        device.updated_at = Some(Utc::now());
        Ok(device.clone())
    }
}

fn device_by_identifier_mut<'a>(
    tables: &'a mut Tables,
    device_identifier: &str,
) -> DomainResult<&'a mut Device> {
    let id = tables
        .device_identifiers
        .get(device_identifier)
        .copied()
        .ok_or_else(|| DomainError::DeviceNotFound(device_identifier.to_string()))?;

    tables
        .devices
        .get_mut(&id)
        .ok_or_else(|| DomainError::DeviceNotFound(device_identifier.to_string()))
}
