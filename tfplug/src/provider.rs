//! Provider trait and related types

use crate::context::Context;
use crate::data_source::{DataSourceSchemaRequest, DataSourceWithConfigure};
use crate::resource::{ResourceSchemaRequest, ResourceWithConfigure};
use crate::schema::Schema;
use crate::types::{ClientCapabilities, Diagnostic, DynamicValue, ServerCapabilities};
use async_trait::async_trait;
use serde_json::json;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub type ResourceFactory = Box<dyn Fn() -> Box<dyn ResourceWithConfigure> + Send + Sync>;

pub type DataSourceFactory = Box<dyn Fn() -> Box<dyn DataSourceWithConfigure> + Send + Sync>;

/// Provider is the entry point: it owns configuration and hands out
/// resources and data sources through factories.
#[async_trait]
pub trait Provider: Send + Sync {
    fn type_name(&self) -> &str;

    async fn metadata(
        &self,
        ctx: Context,
        request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse;

    async fn schema(&self, ctx: Context, request: ProviderSchemaRequest) -> ProviderSchemaResponse;

    async fn meta_schema(
        &self,
        ctx: Context,
        request: ProviderMetaSchemaRequest,
    ) -> ProviderMetaSchemaResponse;

    /// provider_data in the response is handed to every resource and data
    /// source through their configure call
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    async fn validate(
        &self,
        ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse;

    async fn stop(&self, ctx: Context, request: StopProviderRequest) -> StopProviderResponse;

    fn resources(&self) -> HashMap<String, ResourceFactory>;

    fn data_sources(&self) -> HashMap<String, DataSourceFactory>;
}

pub struct ProviderMetadataRequest;

pub struct ProviderMetadataResponse {
    pub type_name: String,
    pub server_capabilities: ServerCapabilities,
}

pub struct ProviderSchemaRequest;

pub struct ProviderSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ProviderMetaSchemaRequest;

pub struct ProviderMetaSchemaResponse {
    pub schema: Option<Schema>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ConfigureProviderRequest {
    pub terraform_version: String,
    pub config: DynamicValue,
    pub client_capabilities: ClientCapabilities,
}

pub struct ConfigureProviderResponse {
    pub diagnostics: Vec<Diagnostic>,
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

pub struct ValidateProviderConfigRequest {
    pub config: DynamicValue,
}

pub struct ValidateProviderConfigResponse {
    pub diagnostics: Vec<Diagnostic>,
}

pub struct StopProviderRequest;

pub struct StopProviderResponse {
    pub error: Option<String>,
}

/// Collects the provider, resource and data source schemas into one JSON
/// document keyed the way `terraform providers schema -json` keys them.
pub async fn schema_document<P: Provider + ?Sized>(provider: &P, ctx: Context) -> serde_json::Value {
    let provider_schema = provider
        .schema(ctx.clone(), ProviderSchemaRequest)
        .await
        .schema
        .to_json();

    let mut resources = BTreeMap::new();
    for (name, factory) in provider.resources() {
        let schema = factory().schema(ctx.clone(), ResourceSchemaRequest).await;
        resources.insert(name, schema.schema.to_json());
    }

    let mut data_sources = BTreeMap::new();
    for (name, factory) in provider.data_sources() {
        let schema = factory().schema(ctx.clone(), DataSourceSchemaRequest).await;
        data_sources.insert(name, schema.schema.to_json());
    }

    json!({
        "provider": provider_schema,
        "resource_schemas": resources,
        "data_source_schemas": data_sources,
    })
}
