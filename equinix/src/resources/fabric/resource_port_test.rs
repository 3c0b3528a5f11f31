use super::*;
use crate::api::{Client, FabricAuth};
use mockito::{Matcher, Server};
use std::any::Any;
use std::sync::Arc;
use tfplug::resource::ResourceWithConfigure;
use tfplug::types::{AttributePath, ClientCapabilities, Diagnostics};

const ACTIVE_PORT: &str = r#"{
    "href": "https://api.equinix.com/fabric/v4/ports/c4d9350e",
    "uuid": "c4d9350e",
    "state": "ACTIVE",
    "type": "XF_PORT",
    "name": "tf-port",
    "connectivitySourceType": "COLO",
    "lagEnabled": false,
    "physicalPortsSpeed": 10000,
    "physicalPortsType": "10GBASE_LR",
    "physicalPortsCount": 1,
    "location": {"metroCode": "SV"},
    "settings": {"packageType": "STANDARD", "sharedPortType": false},
    "encapsulation": {"type": "DOT1Q", "tagProtocolId": "0x8100"},
    "account": {"accountNumber": 270848, "accountName": "ACME", "ucmId": "ucm-1"},
    "project": {"projectId": "proj-1"},
    "redundancy": {"priority": "PRIMARY"},
    "physicalPorts": [{"type": "XF_PHYSICAL_PORT", "demarcationPoint": {"ibx": "SV1", "patchPanel": "PP:0101:1"}}],
    "order": {"orderNumber": "1-23", "purchaseOrder": {"type": "NEW"}, "signature": {"signatory": "DELEGATE", "delegate": {"email": "a@b.c"}}},
    "notifications": [{"type": "TECHNICAL", "registeredUsers": ["ops"]}],
    "changelog": {"createdBy": "tester", "createdDateTime": "2024-05-01T00:00:00Z"}
}"#;

fn configured_resource(server: &Server) -> PortResource {
    let client = Client::new(&server.url(), FabricAuth::Token("t".to_string()), None).unwrap();
    PortResource {
        provider_data: Some(
            EquinixProviderData::new(client).with_poll_interval(Duration::from_millis(5)),
        ),
    }
}

fn planned_port() -> PortResourceModel {
    PortResourceModel {
        id: Value::unknown(),
        r#type: "XF_PORT".into(),
        name: "tf-port".into(),
        connectivity_source_type: "COLO".into(),
        location: ObjectValueOf::new(LocationModel {
            metro_code: "SV".into(),
        }),
        settings: ObjectValueOf::new(SettingsModel {
            package_type: Value::unknown(),
            shared_port_type: Value::new(false),
        }),
        encapsulation: ObjectValueOf::new(EncapsulationModel {
            r#type: "DOT1Q".into(),
            tag_protocol_id: "0x8100".into(),
        }),
        account: ObjectValueOf::new(AccountModel {
            account_number: Value::new(270848),
            ..Default::default()
        }),
        project: ObjectValueOf::new(ProjectModel {
            project_id: "proj-1".into(),
        }),
        redundancy: ObjectValueOf::new(RedundancyModel {
            priority: "PRIMARY".into(),
        }),
        lag_enabled: Value::new(false),
        physical_ports: ListNestedObjectValueOf::from_ptr(PhysicalPortModel {
            r#type: "XF_PHYSICAL_PORT".into(),
            interface: ObjectValueOf::null(),
            demarcation_point: ObjectValueOf::new(DemarcationPointModel {
                ibx: "SV1".into(),
                patch_panel: "PP:0101:1".into(),
                ..Default::default()
            }),
        }),
        physical_ports_speed: Value::new(10000),
        physical_ports_type: "10GBASE_LR".into(),
        physical_ports_count: Value::new(1),
        notifications: ListNestedObjectValueOf::from_ptr(NotificationModel {
            r#type: "TECHNICAL".into(),
            registered_users: ListValueOf::from_values(["ops".to_string()]),
        }),
        href: Value::unknown(),
        uuid: Value::unknown(),
        state: Value::unknown(),
        ..Default::default()
    }
}

fn create_request(plan: &PortResourceModel) -> CreateResourceRequest {
    let planned_state = DynamicValue::from_model(plan).unwrap();
    CreateResourceRequest {
        type_name: "equinix_fabric_port".to_string(),
        planned_state: planned_state.clone(),
        config: planned_state,
        provider_meta: None,
    }
}

fn stored_port(name: &str) -> DynamicValue {
    let mut state = planned_port();
    state.id = "c4d9350e".into();
    state.uuid = "c4d9350e".into();
    state.name = name.into();
    state.state = "ACTIVE".into();
    DynamicValue::from_model(&state).unwrap()
}

#[test]
fn test_resource_type_name() {
    assert_eq!(PortResource::new().type_name(), "equinix_fabric_port");
}

#[tokio::test]
async fn test_resource_schema() {
    let response = PortResource::new()
        .schema(Context::new(), ResourceSchemaRequest)
        .await;
    let schema = response.schema;

    assert!(schema.attribute("type").unwrap().required);
    assert!(schema.attribute("uuid").unwrap().computed);
    assert!(schema.attribute("change_log").unwrap().computed);
    assert!(schema.attribute("timeouts").unwrap().optional);
    let physical_ports = schema.attribute("physical_ports").unwrap();
    assert!(physical_ports.nested_type.is_some());
}

#[tokio::test]
async fn test_validate_reports_missing_required() {
    let mut config = DynamicValue::object();
    config
        .set_string(&AttributePath::new("type"), "XF_PORT")
        .unwrap();

    let response = PortResource::new()
        .validate(
            Context::new(),
            ValidateResourceConfigRequest {
                type_name: "equinix_fabric_port".to_string(),
                config,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(response.diagnostics.has_error());
}

#[test]
fn test_build_create_request() {
    let request = build_create_request(&planned_port());

    assert_eq!(request.port_type.as_deref(), Some("XF_PORT"));
    assert_eq!(request.lag_enabled, Some(false));
    assert_eq!(request.physical_ports_speed, Some(10000));
    assert_eq!(
        request.account.as_ref().and_then(|a| a.account_number),
        Some(270848)
    );
    // unknown planned values are not sent
    assert_eq!(
        request.settings.as_ref().and_then(|s| s.package_type.clone()),
        None
    );
    assert_eq!(request.physical_ports.len(), 1);
    assert!(request.physical_ports[0].interface.is_none());
    assert_eq!(request.notifications[0].registered_users, vec!["ops"]);
    assert!(request.order.is_none());
}

#[test]
fn test_parse_keeps_planned_values_the_api_omits() {
    let mut model = planned_port();
    let port = Port {
        uuid: Some("c4d9350e".to_string()),
        state: Some("PROVISIONING".to_string()),
        name: Some(String::new()),
        ..Default::default()
    };
    model.parse(&port);

    assert_eq!(model.id.as_str(), "c4d9350e");
    assert_eq!(model.state.as_str(), "PROVISIONING");
    assert_eq!(model.name.as_str(), "tf-port");
    assert_eq!(model.physical_ports_speed, Value::new(10000));
    assert!(model.href.is_null());
    assert!(model.change_log.to_ptr().is_some());
}

#[tokio::test]
async fn test_create_waits_for_port() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/fabric/v4/ports")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "type": "XF_PORT",
            "physicalPortsCount": 1,
            "project": {"projectId": "proj-1"}
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"uuid":"c4d9350e","state":"PENDING"}"#)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/fabric/v4/ports/c4d9350e")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ACTIVE_PORT)
        .create_async()
        .await;

    let resource = configured_resource(&server);
    let response = resource
        .create(Context::new(), create_request(&planned_port()))
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state: PortResourceModel = response.new_state.as_model().unwrap();
    assert_eq!(state.id.as_str(), "c4d9350e");
    assert_eq!(state.state.as_str(), "ACTIVE");
    assert_eq!(
        state.href.as_str(),
        "https://api.equinix.com/fabric/v4/ports/c4d9350e"
    );
    let account = state.account.to_ptr().unwrap();
    assert_eq!(account.account_name.as_str(), "ACME");
    assert_eq!(
        state.change_log.to_ptr().unwrap().created_by.as_str(),
        "tester"
    );
    create.assert_async().await;
    get.assert_async().await;
}

#[tokio::test]
async fn test_create_warns_when_reservation_is_not_readable() {
    let mut server = Server::new_async().await;
    let _create = server
        .mock("POST", "/fabric/v4/ports")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"uuid":"c4d9350e","state":"PENDING"}"#)
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/fabric/v4/ports/c4d9350e")
        .with_status(400)
        .with_body(r#"[{"errorCode":"EQ-3142102","errorMessage":"Invalid PortUUID"}]"#)
        .create_async()
        .await;

    let resource = configured_resource(&server);
    let response = resource
        .create(Context::new(), create_request(&planned_port()))
        .await;

    assert!(!response.diagnostics.has_error());
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(
        response.diagnostics[0].summary,
        "Port Order Created but Port Reservation Not Completed"
    );
    let state: PortResourceModel = response.new_state.as_model().unwrap();
    assert_eq!(state.id.as_str(), "c4d9350e");
    assert_eq!(state.state.as_str(), "PENDING");
}

#[tokio::test]
async fn test_create_api_error() {
    let mut server = Server::new_async().await;
    let _create = server
        .mock("POST", "/fabric/v4/ports")
        .with_status(400)
        .with_body(r#"[{"errorCode":"EQ-3142001","errorMessage":"Invalid metro"}]"#)
        .create_async()
        .await;

    let resource = configured_resource(&server);
    let response = resource
        .create(Context::new(), create_request(&planned_port()))
        .await;

    assert!(response.diagnostics.has_error());
    assert_eq!(response.diagnostics[0].summary, "Failed creating port");
    assert!(response.diagnostics[0].detail.contains("Invalid metro"));
}

#[tokio::test]
async fn test_read_removes_missing_port() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/fabric/v4/ports/c4d9350e")
        .with_status(404)
        .with_body(r#"[{"errorCode":"EQ-3000039","errorMessage":"Port not found"}]"#)
        .create_async()
        .await;

    let resource = configured_resource(&server);
    let response = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "equinix_fabric_port".to_string(),
                current_state: stored_port("tf-port"),
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty());
    assert!(response.new_state.is_none());
}

#[tokio::test]
async fn test_update_without_name_change_warns() {
    let server = Server::new_async().await;
    let resource = configured_resource(&server);

    let response = resource
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: "equinix_fabric_port".to_string(),
                prior_state: stored_port("tf-port"),
                planned_state: stored_port("tf-port"),
                config: stored_port("tf-port"),
                provider_meta: None,
            },
        )
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(
        response.diagnostics[0].summary,
        "No configurable values have changed"
    );
    assert!(!response.diagnostics.has_error());
}

#[tokio::test]
async fn test_update_renames_port() {
    let mut server = Server::new_async().await;
    let patch = server
        .mock("PATCH", "/fabric/v4/ports/c4d9350e")
        .match_body(Matcher::Json(serde_json::json!([
            {"op": "replace", "path": "/name", "value": "renamed"}
        ])))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"uuid":"c4d9350e","state":"ACTIVE"}"#)
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/fabric/v4/ports/c4d9350e")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ACTIVE_PORT.replace("\"tf-port\"", "\"renamed\""))
        .create_async()
        .await;

    let resource = configured_resource(&server);
    let response = resource
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: "equinix_fabric_port".to_string(),
                prior_state: stored_port("tf-port"),
                planned_state: stored_port("renamed"),
                config: stored_port("renamed"),
                provider_meta: None,
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state: PortResourceModel = response.new_state.as_model().unwrap();
    assert_eq!(state.name.as_str(), "renamed");
    patch.assert_async().await;
}

#[tokio::test]
async fn test_delete_waits_until_gone() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", "/fabric/v4/ports/c4d9350e")
        .with_status(204)
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/fabric/v4/ports/c4d9350e")
        .with_status(404)
        .create_async()
        .await;

    let resource = configured_resource(&server);
    let response = resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "equinix_fabric_port".to_string(),
                prior_state: stored_port("tf-port"),
                provider_meta: None,
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    delete.assert_async().await;
}

#[tokio::test]
async fn test_delete_ignores_forbidden() {
    let mut server = Server::new_async().await;
    let _delete = server
        .mock("DELETE", "/fabric/v4/ports/c4d9350e")
        .with_status(403)
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/fabric/v4/ports/c4d9350e")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"uuid":"c4d9350e","state":"DEPROVISIONED"}"#)
        .create_async()
        .await;

    let resource = configured_resource(&server);
    let response = resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "equinix_fabric_port".to_string(),
                prior_state: stored_port("tf-port"),
                provider_meta: None,
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
}

#[tokio::test]
async fn test_operations_need_configuration() {
    let resource = PortResource::new();
    let response = resource
        .create(Context::new(), create_request(&planned_port()))
        .await;
    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
}

#[tokio::test]
async fn test_configure_accepts_provider_data() {
    let server = Server::new_async().await;
    let client = Client::new(&server.url(), FabricAuth::Token("t".to_string()), None).unwrap();
    let data: Arc<dyn Any + Send + Sync> = Arc::new(EquinixProviderData::new(client));

    let mut resource = PortResource::new();
    let response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(data),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty());
    assert!(resource.provider_data.is_some());
}

#[test]
fn port_waiters_poll_provisioning_and_removal_states() {
    assert_eq!(CREATE_WAITER.pending, &["PENDING"]);
    assert!(CREATE_WAITER.target.contains(&"PENDING_CROSS_CONNECT"));
    assert_eq!(CREATE_WAITER.delay, Duration::from_secs(10));
    assert_eq!(CREATE_WAITER.min_timeout, Duration::from_secs(5));
    assert_eq!(CREATE_WAITER.not_found_checks, Some(6));

    assert_eq!(DELETE_WAITER.pending, &["PROVISIONED", "ADDED", "ACTIVE"]);
    assert!(DELETE_WAITER.target.contains(&"DEPROVISIONED"));
    assert_eq!(DELETE_WAITER.delay, Duration::from_secs(10));
    assert_eq!(DELETE_WAITER.min_timeout, Duration::from_secs(5));
    assert_eq!(DELETE_WAITER.not_found_checks, None);
}
