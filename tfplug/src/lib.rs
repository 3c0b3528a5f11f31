//! tfplug - Terraform Plugin Framework for Rust
//!
//! Provider-side building blocks: schemas, typed values, resource and data
//! source traits, and the state change waiter used by asynchronous APIs.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod typed;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod defaults;
pub mod import;
pub mod plan_modifier;
pub mod retry;
pub mod timeouts;
pub mod validator;

pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use import::import_state_passthrough_id;
pub use provider::{Provider, ProviderMetadataRequest, ProviderMetadataResponse};
pub use resource::{Resource, ResourceWithConfigure, ResourceWithModifyPlan};
pub use retry::{StateChangeConf, WaitError};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use timeouts::Timeouts;
pub use typed::{ListNestedObjectValueOf, ListValueOf, ObjectValueOf, Value};
pub use types::{Diagnostic, Diagnostics, Dynamic, DynamicValue};
