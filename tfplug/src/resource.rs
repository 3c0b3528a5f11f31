//! Resource trait and related types
//!
//! Resources implement [`Resource`] for the CRUD lifecycle plus
//! [`ResourceWithConfigure`] to receive provider data. Planning and import
//! support are opt-in through the remaining traits.

use crate::context::Context;
use crate::schema::Schema;
use crate::types::{AttributePath, ClientCapabilities, Diagnostic, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// Base trait for resources - implement CRUD operations
#[async_trait]
pub trait Resource: Send + Sync {
    /// MUST match the key used in Provider::resources()
    fn type_name(&self) -> &str;

    async fn metadata(
        &self,
        ctx: Context,
        request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse;

    async fn schema(&self, ctx: Context, request: ResourceSchemaRequest) -> ResourceSchemaResponse;

    async fn validate(
        &self,
        ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse;

    /// MUST populate all attributes in response.new_state (including computed)
    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse;

    /// Returns None as new_state when the remote object no longer exists
    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse;

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse;

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse;
}

pub struct ResourceMetadataRequest;

pub struct ResourceMetadataResponse {
    pub type_name: String,
}

pub struct ResourceSchemaRequest;

pub struct ResourceSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ValidateResourceConfigRequest {
    pub type_name: String,
    pub config: DynamicValue,
    pub client_capabilities: ClientCapabilities,
}

pub struct ValidateResourceConfigResponse {
    pub diagnostics: Vec<Diagnostic>,
}

pub struct CreateResourceRequest {
    pub type_name: String,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
    pub provider_meta: Option<DynamicValue>,
}

pub struct CreateResourceResponse {
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ReadResourceRequest {
    pub type_name: String,
    pub current_state: DynamicValue,
    pub provider_meta: Option<DynamicValue>,
    pub client_capabilities: ClientCapabilities,
}

pub struct ReadResourceResponse {
    pub new_state: Option<DynamicValue>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct UpdateResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
    pub provider_meta: Option<DynamicValue>,
}

pub struct UpdateResourceResponse {
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct DeleteResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub provider_meta: Option<DynamicValue>,
}

pub struct DeleteResourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// Receives provider data right after the factory builds the resource
#[async_trait]
pub trait ResourceWithConfigure: Resource {
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse;
}

pub struct ConfigureResourceRequest {
    /// Data from ConfigureProviderResponse.provider_data; downcast it to the
    /// provider's own type
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

pub struct ConfigureResourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// Optional interface for customizing planning behavior
#[async_trait]
pub trait ResourceWithModifyPlan: Resource {
    async fn modify_plan(&self, ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse;
}

pub struct ModifyPlanRequest {
    pub type_name: String,
    pub config: DynamicValue,
    pub prior_state: DynamicValue,
    pub proposed_new_state: DynamicValue,
    pub provider_meta: Option<DynamicValue>,
}

pub struct ModifyPlanResponse {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ModifyPlanResponse {
    /// Plans `request` with the schema's defaults and plan modifiers.
    pub fn from_schema(schema: &Schema, request: &ModifyPlanRequest) -> Self {
        let planned = schema.plan(
            &request.prior_state,
            &request.proposed_new_state,
            &request.config,
        );
        Self {
            planned_state: planned.planned_state,
            requires_replace: planned.requires_replace,
            diagnostics: planned.diagnostics,
        }
    }
}

/// Optional interface for import functionality
#[async_trait]
pub trait ResourceWithImportState: Resource {
    /// Called during "terraform import"; the returned state is then read
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse;
}

pub struct ImportResourceStateRequest {
    pub type_name: String,
    pub id: String,
    pub client_capabilities: ClientCapabilities,
}

pub struct ImportResourceStateResponse {
    pub imported_resources: Vec<ImportedResource>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ImportedResource {
    pub type_name: String,
    pub state: DynamicValue,
}
