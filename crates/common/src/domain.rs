mod application;
mod device;
mod entity;
mod in_memory_registry_store;
mod product;
mod result;
mod vendor;

pub use application::*;
pub use device::*;
pub use entity::*;
pub use in_memory_registry_store::*;
pub use product::*;
pub use result::*;
pub use vendor::*;
