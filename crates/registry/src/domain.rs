mod application_service;
mod device_provisioner;
mod identity_validator;
mod product_service;
mod vendor_service;

pub use application_service::*;
pub use device_provisioner::*;
pub use identity_validator::*;
pub use product_service::*;
pub use vendor_service::*;
