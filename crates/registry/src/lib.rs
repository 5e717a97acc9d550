pub mod config;
pub mod domain;
pub mod registry;

pub use config::RegistryConfig;
pub use registry::{Registry, RegistryRepositories};
