pub mod crypto;
pub mod domain;
pub mod garde;
pub mod postgres;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use crypto::MockSecretGenerator;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockApplicationRepository;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockDeviceRepository;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockProductRepository;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockVendorRepository;
