pub mod client;
pub mod common;
pub mod error;
pub mod fabric;
pub mod metal;

pub use client::{Client, FabricAuth, RetryConfig, Service};
pub use error::ApiError;
