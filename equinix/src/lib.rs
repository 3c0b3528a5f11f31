//! Terraform provider for Equinix Fabric and Equinix Metal

pub mod api;
pub mod config;
pub mod data_sources;
pub mod provider_data;
pub mod resources;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetaSchemaRequest, ProviderMetaSchemaResponse, ProviderMetadataRequest,
    ProviderMetadataResponse, ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory,
    StopProviderRequest, StopProviderResponse, ValidateProviderConfigRequest,
    ValidateProviderConfigResponse,
};
use tfplug::types::{Diagnostic, Diagnostics, ServerCapabilities};

use crate::config::{provider_schema, EquinixConfig, ProviderConfigModel};
use crate::data_sources::{
    ConnectionRoutesDataSource, ProjectDataSource, RouteAggregationRuleDataSource,
    RouteAggregationRulesDataSource, StreamAlertRuleDataSource, StreamAlertRulesDataSource,
};
use crate::provider_data::EquinixProviderData;
use crate::resources::{
    PortResource, ProjectResource, RouteAggregationRuleResource, StreamAlertRuleResource,
};

pub struct EquinixProvider {
    provider_data: Option<Arc<EquinixProviderData>>,
}

impl Default for EquinixProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EquinixProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    pub fn provider_data(&self) -> Option<&EquinixProviderData> {
        self.provider_data.as_deref()
    }
}

#[async_trait]
impl Provider for EquinixProvider {
    fn type_name(&self) -> &str {
        "equinix"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
            server_capabilities: ServerCapabilities {
                plan_destroy: false,
                get_provider_schema_optional: true,
                move_resource_state: false,
            },
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: provider_schema(),
            diagnostics: vec![],
        }
    }

    async fn meta_schema(
        &self,
        _ctx: Context,
        _request: ProviderMetaSchemaRequest,
    ) -> ProviderMetaSchemaResponse {
        ProviderMetaSchemaResponse {
            schema: None,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let mut diagnostics = vec![];

        let model: ProviderConfigModel = match request.config.as_model() {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to read provider configuration",
                    e.to_string(),
                ));
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        let (config, warnings) = EquinixConfig::resolve(&model);
        diagnostics.extend(warnings);
        diagnostics.extend(config.validate());
        if diagnostics.has_error() {
            return ConfigureProviderResponse {
                diagnostics,
                provider_data: None,
            };
        }

        let client = match config.build_client() {
            Ok(client) => client,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                ));
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        let mut provider_data = EquinixProviderData::new(client);
        provider_data.page_size = config.page_size;
        tracing::info!(
            "Configured Equinix provider for {} (terraform {})",
            config.endpoint,
            request.terraform_version
        );

        let provider_data = Arc::new(provider_data);
        self.provider_data = Some(provider_data.clone());

        ConfigureProviderResponse {
            diagnostics,
            provider_data: Some(provider_data),
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        ValidateProviderConfigResponse {
            diagnostics: provider_schema().validate(&request.config),
        }
    }

    async fn stop(&self, _ctx: Context, _request: StopProviderRequest) -> StopProviderResponse {
        StopProviderResponse { error: None }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
        resources.insert(
            "equinix_fabric_port".to_string(),
            Box::new(|| Box::new(PortResource::new())),
        );
        resources.insert(
            "equinix_fabric_stream_alert_rule".to_string(),
            Box::new(|| Box::new(StreamAlertRuleResource::new())),
        );
        resources.insert(
            "equinix_fabric_route_aggregation_rule".to_string(),
            Box::new(|| Box::new(RouteAggregationRuleResource::new())),
        );
        resources.insert(
            "equinix_metal_project".to_string(),
            Box::new(|| Box::new(ProjectResource::new())),
        );
        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut data_sources: HashMap<String, DataSourceFactory> = HashMap::new();
        data_sources.insert(
            "equinix_fabric_stream_alert_rule".to_string(),
            Box::new(|| Box::new(StreamAlertRuleDataSource::new())),
        );
        data_sources.insert(
            "equinix_fabric_stream_alert_rules".to_string(),
            Box::new(|| Box::new(StreamAlertRulesDataSource::new())),
        );
        data_sources.insert(
            "equinix_fabric_route_aggregation_rule".to_string(),
            Box::new(|| Box::new(RouteAggregationRuleDataSource::new())),
        );
        data_sources.insert(
            "equinix_fabric_route_aggregation_rules".to_string(),
            Box::new(|| Box::new(RouteAggregationRulesDataSource::new())),
        );
        data_sources.insert(
            "equinix_fabric_connection_advertised_routes".to_string(),
            Box::new(|| Box::new(ConnectionRoutesDataSource::advertised())),
        );
        data_sources.insert(
            "equinix_fabric_connection_received_routes".to_string(),
            Box::new(|| Box::new(ConnectionRoutesDataSource::received())),
        );
        data_sources.insert(
            "equinix_metal_project".to_string(),
            Box::new(|| Box::new(ProjectDataSource::new())),
        );
        data_sources
    }
}
