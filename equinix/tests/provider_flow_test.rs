//! Provider level flows against a mocked Equinix API

#![allow(clippy::disallowed_methods)]

use equinix::config::ProviderConfigModel;
use equinix::data_sources::fabric::data_source_routes::RoutesModel;
use equinix::resources::metal::resource_project::ProjectResourceModel;
use equinix::EquinixProvider;
use mockito::{Matcher, Server};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, DataSource, DataSourceWithConfigure, ReadDataSourceRequest,
};
use tfplug::provider::{ConfigureProviderRequest, Provider};
use tfplug::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest, ReadResourceRequest,
    Resource, ResourceWithConfigure,
};
use tfplug::typed::{ListNestedObjectValueOf, Value};
use tfplug::types::{ClientCapabilities, Diagnostics, DynamicValue};

const PROJECT_ID: &str = "5d4c3b2a-1f0e-4d9c-8b7a-6f5e4d3c2b1a";

async fn configured_provider(server: &Server) -> (EquinixProvider, Arc<dyn Any + Send + Sync>) {
    let mut provider = EquinixProvider::new();
    let model = ProviderConfigModel {
        endpoint: server.url().as_str().into(),
        token: "fabric-token".into(),
        auth_token: "metal-token".into(),
        max_retries: Value::new(0),
        ..Default::default()
    };
    let response = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config: DynamicValue::from_model(&model).unwrap(),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(!response.diagnostics.has_error(), "{:?}", response.diagnostics);
    let data = response.provider_data.expect("provider data");
    (provider, data)
}

fn project_body(name: &str) -> String {
    json!({
        "id": PROJECT_ID,
        "name": name,
        "created_at": "2024-05-01T09:00:00Z",
        "updated_at": "2024-05-01T09:00:00Z",
        "backend_transfer_enabled": false,
        "organization": {"href": "/metal/v1/organizations/org-9"},
        "members": []
    })
    .to_string()
}

#[tokio::test]
async fn metal_project_lifecycle_through_provider_factories() {
    let mut server = Server::new_async().await;
    let project_path = format!("/metal/v1/projects/{}", PROJECT_ID);
    let bgp_path = format!("{}/bgp-config", project_path);

    let create = server
        .mock("POST", "/metal/v1/projects")
        .match_header("x-auth-token", "metal-token")
        .match_body(Matcher::PartialJson(json!({"name": "edge"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(project_body("edge"))
        .create_async()
        .await;
    let get = server
        .mock("GET", project_path.as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(project_body("edge"))
        .expect_at_least(1)
        .create_async()
        .await;
    let _bgp = server
        .mock("GET", bgp_path.as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", project_path.as_str())
        .with_status(204)
        .create_async()
        .await;

    let (provider, data) = configured_provider(&server).await;
    let factories = provider.resources();
    let mut resource = factories["equinix_metal_project"]();
    let configured = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(data),
            },
        )
        .await;
    assert!(configured.diagnostics.is_empty());

    let plan = DynamicValue::from_model(&ProjectResourceModel {
        id: Value::unknown(),
        name: "edge".into(),
        created: Value::unknown(),
        updated: Value::unknown(),
        backend_transfer: Value::new(false),
        payment_method_id: Value::unknown(),
        organization_id: Value::unknown(),
        bgp_config: ListNestedObjectValueOf::null(),
    })
    .unwrap();

    let created = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "equinix_metal_project".to_string(),
                planned_state: plan.clone(),
                config: plan,
                provider_meta: None,
            },
        )
        .await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
    let state: ProjectResourceModel = created.new_state.as_model().unwrap();
    assert_eq!(state.id.as_str(), PROJECT_ID);
    assert_eq!(state.organization_id.as_str(), "org-9");
    assert!(state.bgp_config.is_null());

    let read = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "equinix_metal_project".to_string(),
                current_state: created.new_state.clone(),
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(read.diagnostics.is_empty(), "{:?}", read.diagnostics);
    assert!(read.new_state.is_some());

    let deleted = resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "equinix_metal_project".to_string(),
                prior_state: created.new_state,
                provider_meta: None,
            },
        )
        .await;
    assert!(deleted.diagnostics.is_empty(), "{:?}", deleted.diagnostics);

    create.assert_async().await;
    get.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn received_routes_through_provider_factories() {
    let mut server = Server::new_async().await;
    let search = server
        .mock("POST", "/fabric/v4/connections/conn-7/receivedRoutes/search")
        .match_header("authorization", "Bearer fabric-token")
        .match_body(Matcher::Json(json!({
            "filter": {"and": [{"property": "/state", "operator": "=", "values": ["ACTIVE"]}]},
            "pagination": {"offset": 10, "limit": 5}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "pagination": {"offset": 10, "limit": 5, "total": 11},
                "data": [{
                    "type": "IPv4_BGP_ROUTE",
                    "state": "ACTIVE",
                    "prefix": "10.20.0.0/16",
                    "asPath": ["64512"]
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (provider, data) = configured_provider(&server).await;
    let factories = provider.data_sources();
    let mut data_source = factories["equinix_fabric_connection_received_routes"]();
    data_source
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: Some(data),
            },
        )
        .await;

    let config = json!({
        "id": null,
        "connection_id": "conn-7",
        "filter": {"property": "/state", "operator": "=", "values": ["ACTIVE"]},
        "pagination": {"offset": 10, "limit": 5, "total": null, "next": null, "previous": null},
        "sort": null,
        "data": null
    });
    let model: RoutesModel = serde_json::from_value(config).unwrap();

    let response = data_source
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "equinix_fabric_connection_received_routes".to_string(),
                config: DynamicValue::from_model(&model).unwrap(),
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    search.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state: RoutesModel = response.state.as_model().unwrap();
    assert_eq!(state.id.as_str(), "conn-7");
    assert_eq!(state.data.len(), 1);
    assert_eq!(state.data.to_slice()[0].prefix.as_str(), "10.20.0.0/16");
}

#[tokio::test]
async fn resources_refuse_to_run_before_configure() {
    let provider = EquinixProvider::new();
    let factories = provider.resources();
    let resource = factories["equinix_fabric_port"]();

    let response = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "equinix_fabric_port".to_string(),
                current_state: DynamicValue::null(),
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(response.diagnostics.has_error());
    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
}
