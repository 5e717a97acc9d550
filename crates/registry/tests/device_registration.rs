use async_trait::async_trait;
use common::crypto::{KeyCodec, RandomSecretGenerator};
use common::domain::{
    CreateDeviceRepoInput, Device, DeviceRepository, DomainError, DomainResult, EntityKind,
    GetDeviceByIdentifierRepoInput, GetDeviceRepoInput, InMemoryRegistryStore,
    UpdateDeviceInfoRepoInput, UpdateDeviceVersionRepoInput,
};
use registry::domain::{SaveProductRequest, SaveVendorRequest};
use registry::{Registry, RegistryRepositories};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const SECRET: [u8; 32] = [9u8; 32];

fn setup() -> (Arc<Registry>, Arc<InMemoryRegistryStore>) {
    let store = Arc::new(InMemoryRegistryStore::new());
    let registry = Registry::in_memory(KeyCodec::new(&SECRET).unwrap(), store.clone());
    (Arc::new(registry), store)
}

/// Device store whose identifier lookup never finds anything, so every
/// registration after the first one collides on insert
struct MissingLookupDevices {
    store: Arc<InMemoryRegistryStore>,
    inserts: AtomicUsize,
}

#[async_trait]
impl DeviceRepository for MissingLookupDevices {
    async fn allocate_device_id(&self) -> DomainResult<i64> {
        self.store.allocate_device_id().await
    }

    async fn create_device(&self, input: CreateDeviceRepoInput) -> DomainResult<Device> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.store.create_device(input).await
    }

    async fn get_device(&self, input: GetDeviceRepoInput) -> DomainResult<Option<Device>> {
        self.store.get_device(input).await
    }

    async fn get_device_by_identifier(
        &self,
        _input: GetDeviceByIdentifierRepoInput,
    ) -> DomainResult<Option<Device>> {
        Ok(None)
    }

    async fn update_device_version(
        &self,
        input: UpdateDeviceVersionRepoInput,
    ) -> DomainResult<Device> {
        self.store.update_device_version(input).await
    }

    async fn update_device_info(&self, input: UpdateDeviceInfoRepoInput) -> DomainResult<Device> {
        self.store.update_device_info(input).await
    }
}

fn setup_with_missing_lookups() -> (
    Arc<Registry>,
    Arc<InMemoryRegistryStore>,
    Arc<MissingLookupDevices>,
) {
    let store = Arc::new(InMemoryRegistryStore::new());
    let devices = Arc::new(MissingLookupDevices {
        store: store.clone(),
        inserts: AtomicUsize::new(0),
    });
    let repositories = RegistryRepositories {
        vendor: store.clone(),
        product: store.clone(),
        application: store.clone(),
        device: devices.clone(),
    };
    let registry = Registry::new(
        KeyCodec::new(&SECRET).unwrap(),
        repositories,
        Arc::new(RandomSecretGenerator::new()),
    );
    (Arc::new(registry), store, devices)
}

async fn create_vendor(registry: &Registry, name: &str) -> common::domain::Vendor {
    registry
        .save_vendor(SaveVendorRequest {
            id: None,
            vendor_name: name.to_string(),
            vendor_description: String::new(),
        })
        .await
        .unwrap()
}

async fn create_product(registry: &Registry, vendor_id: i64) -> common::domain::Product {
    registry
        .save_product(SaveProductRequest {
            id: None,
            vendor_id,
            product_name: "Thermostat".to_string(),
            product_description: "Smart thermostat".to_string(),
            product_config: "{}".to_string(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_registration_is_idempotent() {
    let (registry, store) = setup();
    let vendor = create_vendor(&registry, "Acme").await;
    let product = create_product(&registry, vendor.id).await;

    let first = registry
        .register_device(&product.product_key, "DEV001", "1.0.0")
        .await
        .unwrap();
    let second = registry
        .register_device(&product.product_key, "DEV001", "2.0.0")
        .await
        .unwrap();

    assert_eq!(store.device_count().await, 1);
    assert_eq!(second.id, first.id);
    assert_eq!(second.device_key, first.device_key);
    assert_eq!(second.device_secret, first.device_secret);
    assert_eq!(second.device_identifier, first.device_identifier);
    assert_eq!(second.device_version, "2.0.0");

    // Defaults come from the product
    assert_eq!(first.device_name, "Thermostat");
    assert_eq!(first.device_description, "Smart thermostat");
    assert_eq!(first.product_id, product.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_converge() {
    let (registry, store) = setup();
    let vendor = create_vendor(&registry, "Acme").await;
    let product = create_product(&registry, vendor.id).await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let registry = registry.clone();
        let product_key = product.product_key.clone();
        handles.push(tokio::spawn(async move {
            registry
                .register_device(&product_key, "DEV001", &format!("1.0.{}", i))
                .await
        }));
    }

    let mut ids = HashSet::new();
    let mut credentials = HashSet::new();
    for handle in handles {
        let device = handle.await.unwrap().unwrap();
        ids.insert(device.id);
        credentials.insert((device.device_key, device.device_secret));
    }

    assert_eq!(store.device_count().await, 1);
    assert_eq!(ids.len(), 1);
    assert_eq!(credentials.len(), 1);
}

#[tokio::test]
async fn test_insert_conflict_refreshes_winner() {
    let (registry, store, devices) = setup_with_missing_lookups();
    let vendor = create_vendor(&registry, "Acme").await;
    let product = create_product(&registry, vendor.id).await;

    let first = registry
        .register_device(&product.product_key, "DEV001", "1.0.0")
        .await
        .unwrap();
    let second = registry
        .register_device(&product.product_key, "DEV001", "2.0.0")
        .await
        .unwrap();

    // The second call inserted, collided and refreshed the first row
    assert_eq!(devices.inserts.load(Ordering::SeqCst), 2);
    assert_eq!(store.device_count().await, 1);
    assert_eq!(second.id, first.id);
    assert_eq!(second.device_key, first.device_key);
    assert_eq!(second.device_secret, first.device_secret);
    assert_eq!(second.device_version, "2.0.0");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_insert_conflicts_converge() {
    let (registry, store, devices) = setup_with_missing_lookups();
    let vendor = create_vendor(&registry, "Acme").await;
    let product = create_product(&registry, vendor.id).await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let registry = registry.clone();
        let product_key = product.product_key.clone();
        handles.push(tokio::spawn(async move {
            registry
                .register_device(&product_key, "DEV001", &format!("1.0.{}", i))
                .await
        }));
    }

    let mut ids = HashSet::new();
    let mut credentials = HashSet::new();
    for handle in handles {
        let device = handle.await.unwrap().unwrap();
        ids.insert(device.id);
        credentials.insert((device.device_key, device.device_secret));
    }

    // Every call attempted an insert, exactly one of them landed
    assert_eq!(devices.inserts.load(Ordering::SeqCst), 16);
    assert_eq!(store.device_count().await, 1);
    assert_eq!(ids.len(), 1);
    assert_eq!(credentials.len(), 1);
}

#[tokio::test]
async fn test_distinct_codes_get_distinct_devices() {
    let (registry, store) = setup();
    let vendor = create_vendor(&registry, "Acme").await;
    let product = create_product(&registry, vendor.id).await;

    let first = registry
        .register_device(&product.product_key, "DEV001", "1.0.0")
        .await
        .unwrap();
    let second = registry
        .register_device(&product.product_key, "DEV002", "1.0.0")
        .await
        .unwrap();

    assert_eq!(store.device_count().await, 2);
    assert_ne!(first.device_identifier, second.device_identifier);
    assert_ne!(first.device_key, second.device_key);
    assert_ne!(first.device_secret, second.device_secret);
}

#[tokio::test]
async fn test_keys_are_bound_to_their_entity_kind() {
    let (registry, _store) = setup();

    // Six throwaway vendors so the seventh shares no id with the first product
    for i in 0..6 {
        create_vendor(&registry, &format!("Vendor {}", i)).await;
    }
    let vendor = create_vendor(&registry, "Acme").await;
    assert_eq!(vendor.id, 7);

    let product = create_product(&registry, vendor.id).await;
    let device = registry
        .register_device(&product.product_key, "DEV001", "1.0.0")
        .await
        .unwrap();

    // Every key passes as its own kind
    assert_eq!(registry.validate_vendor(&vendor.vendor_key).await.unwrap().id, 7);
    assert_eq!(
        registry.validate_product(&product.product_key).await.unwrap().id,
        product.id
    );
    assert_eq!(
        registry.validate_device(&device.device_key).await.unwrap().id,
        device.id
    );

    // Product and device share identity 1, their keys still do not cross over
    assert_eq!(product.id, device.id);
    let result = registry.validate_device(&product.product_key).await;
    assert!(matches!(
        result,
        Err(DomainError::KeyMismatch(EntityKind::Device))
    ));
    let result = registry.validate_product(&device.device_key).await;
    assert!(matches!(
        result,
        Err(DomainError::KeyMismatch(EntityKind::Product))
    ));

    // Vendor 7 has no product counterpart
    let result = registry.validate_product(&vendor.vendor_key).await;
    assert!(matches!(result, Err(DomainError::ProductNotFound(id)) if id == "7"));
}

#[tokio::test]
async fn test_garbage_keys_are_rejected() {
    let (registry, store) = setup();

    let unauthenticated = "0".repeat(88);
    let not_hex = "zz".repeat(44);

    for key in ["", "garbage", unauthenticated.as_str(), not_hex.as_str()] {
        let result = registry.register_device(key, "DEV001", "1.0.0").await;
        assert!(
            matches!(result, Err(DomainError::InvalidKey(_))),
            "unexpected result for {:?}",
            key
        );
    }

    let result = registry.validate_vendor("garbage").await;
    assert!(matches!(result, Err(DomainError::InvalidKey(_))));
    assert_eq!(store.device_count().await, 0);
}

#[tokio::test]
async fn test_key_from_another_secret_is_rejected() {
    let (registry, _store) = setup();
    let vendor = create_vendor(&registry, "Acme").await;
    create_product(&registry, vendor.id).await;

    let foreign = KeyCodec::new(&[1u8; 32]).unwrap().encode(1).unwrap();

    let result = registry.validate_product(&foreign).await;
    assert!(matches!(result, Err(DomainError::InvalidKey(_))));
}

#[tokio::test]
async fn test_update_device_info_only_touches_descriptive_fields() {
    let (registry, _store) = setup();
    let vendor = create_vendor(&registry, "Acme").await;
    let product = create_product(&registry, vendor.id).await;
    let device = registry
        .register_device(&product.product_key, "DEV001", "1.0.0")
        .await
        .unwrap();

    let updated = registry
        .update_device_info(&device.device_identifier, "Kitchen", "Downstairs")
        .await
        .unwrap();

    assert_eq!(updated.device_name, "Kitchen");
    assert_eq!(updated.device_description, "Downstairs");
    assert_eq!(updated.device_key, device.device_key);
    assert_eq!(updated.device_secret, device.device_secret);
    assert_eq!(updated.device_version, "1.0.0");

    let found = registry
        .find_device_by_identifier(&device.device_identifier)
        .await
        .unwrap();
    assert_eq!(found.device_name, "Kitchen");

    let found = registry.find_device_by_id(device.id).await.unwrap();
    assert_eq!(found.device_identifier, device.device_identifier);

    let result = registry
        .update_device_info("missing", "Kitchen", "Downstairs")
        .await;
    assert!(matches!(result, Err(DomainError::DeviceNotFound(_))));
}

#[tokio::test]
async fn test_product_requires_existing_vendor() {
    let (registry, _store) = setup();

    let result = registry
        .save_product(SaveProductRequest {
            id: None,
            vendor_id: 42,
            product_name: "Orphan".to_string(),
            product_description: String::new(),
            product_config: String::new(),
        })
        .await;

    assert!(matches!(result, Err(DomainError::VendorNotFound(_))));
}

#[tokio::test]
async fn test_updates_keep_keys() {
    let (registry, _store) = setup();
    let vendor = create_vendor(&registry, "Acme").await;
    let product = create_product(&registry, vendor.id).await;

    let renamed = registry
        .save_vendor(SaveVendorRequest {
            id: Some(vendor.id),
            vendor_name: "Acme Corp".to_string(),
            vendor_description: "Renamed".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(renamed.vendor_key, vendor.vendor_key);
    assert!(registry.validate_vendor(&vendor.vendor_key).await.is_ok());

    let reconfigured = registry
        .save_product(SaveProductRequest {
            id: Some(product.id),
            vendor_id: vendor.id,
            product_name: "Thermostat v2".to_string(),
            product_description: String::new(),
            product_config: r#"{"interval":30}"#.to_string(),
        })
        .await
        .unwrap();
    assert_eq!(reconfigured.product_key, product.product_key);

    let found = registry.find_product(product.id).await.unwrap();
    assert_eq!(found.product_name, "Thermostat v2");
}
