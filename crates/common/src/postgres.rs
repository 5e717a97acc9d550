mod application_repository;
mod client;
mod config;
mod device_repository;
mod migrations;
mod product_repository;
mod vendor_repository;

pub use application_repository::*;
pub use client::*;
pub use config::*;
pub use device_repository::*;
pub use migrations::*;
pub use product_repository::*;
pub use vendor_repository::*;
