use super::*;
use crate::api::{Client, FabricAuth};
use mockito::{Matcher, Server};
use std::any::Any;
use std::sync::Arc;
use tfplug::types::{ClientCapabilities, Diagnostics};

const STREAM_ID: &str = "9d1b8f0e-stream";
const RULE_PATH: &str = "/fabric/v4/streams/9d1b8f0e-stream/alertRules/a1b2c3";

const ACTIVE_RULE: &str = r#"{
    "href": "https://api.equinix.com/fabric/v4/streams/9d1b8f0e-stream/alertRules/a1b2c3",
    "uuid": "a1b2c3",
    "state": "ACTIVE",
    "type": "METRIC_ALERT",
    "name": "port-bandwidth",
    "description": "alert on port bandwidth",
    "enabled": true,
    "resourceSelector": {"include": ["*/ports/c4d9350e"]},
    "metricSelector": {"include": ["equinix.fabric.port.bandwidth_tx.usage"]},
    "detectionMethod": {
        "type": "THRESHOLD",
        "windowSize": "PT15M",
        "operand": "ABOVE",
        "warningThreshold": "35000000",
        "criticalThreshold": "40000000"
    },
    "changeLog": {"createdBy": "tester"}
}"#;

fn configured_resource(server: &Server) -> StreamAlertRuleResource {
    let client = Client::new(&server.url(), FabricAuth::Token("t".to_string()), None).unwrap();
    StreamAlertRuleResource {
        provider_data: Some(
            EquinixProviderData::new(client).with_poll_interval(Duration::from_millis(5)),
        ),
    }
}

fn planned_rule() -> StreamAlertRuleResourceModel {
    StreamAlertRuleResourceModel {
        stream_id: STREAM_ID.into(),
        id: Value::unknown(),
        timeouts: ObjectValueOf::null(),
        base: StreamAlertRuleBaseModel {
            r#type: "METRIC_ALERT".into(),
            name: "port-bandwidth".into(),
            description: "alert on port bandwidth".into(),
            enabled: Value::new(true),
            resource_selector: ObjectValueOf::new(SelectorModel {
                include: ListValueOf::from_values(["*/ports/c4d9350e".to_string()]),
            }),
            metric_selector: ObjectValueOf::new(SelectorModel {
                include: ListValueOf::from_values([
                    "equinix.fabric.port.bandwidth_tx.usage".to_string()
                ]),
            }),
            detection_method: ObjectValueOf::new(DetectionMethodModel {
                r#type: "THRESHOLD".into(),
                window_size: "PT15M".into(),
                operand: "ABOVE".into(),
                warning_threshold: "35000000".into(),
                critical_threshold: "40000000".into(),
            }),
            href: Value::unknown(),
            uuid: Value::unknown(),
            state: Value::unknown(),
            change_log: ObjectValueOf::unknown(),
        },
    }
}

fn stored_rule() -> StreamAlertRuleResourceModel {
    let mut state = planned_rule();
    state.id = "a1b2c3".into();
    state.base.uuid = "a1b2c3".into();
    state.base.state = "ACTIVE".into();
    state.base.href = Value::null();
    state.base.change_log = ObjectValueOf::null();
    state
}

fn update_request(
    prior: &StreamAlertRuleResourceModel,
    plan: &StreamAlertRuleResourceModel,
) -> UpdateResourceRequest {
    let planned_state = DynamicValue::from_model(plan).unwrap();
    UpdateResourceRequest {
        type_name: "equinix_fabric_stream_alert_rule".to_string(),
        prior_state: DynamicValue::from_model(prior).unwrap(),
        planned_state: planned_state.clone(),
        config: planned_state,
        provider_meta: None,
    }
}

#[tokio::test]
async fn test_schema_defaults_enabled() {
    let schema = StreamAlertRuleResource::new()
        .schema(Context::new(), ResourceSchemaRequest)
        .await
        .schema;

    let enabled = schema.attribute("enabled").unwrap();
    assert!(enabled.optional && enabled.computed);
    assert!(enabled.default.is_some());
    assert!(schema.attribute("stream_id").unwrap().required);
    assert!(schema.attribute("detection_method").unwrap().nested_type.is_some());
}

#[test]
fn test_build_request_skips_unknown_values() {
    let mut plan = planned_rule();
    plan.base.enabled = Value::unknown();
    let request = build_request(&plan);

    assert_eq!(request.rule_type.as_deref(), Some("METRIC_ALERT"));
    assert_eq!(request.enabled, None);
    assert_eq!(
        request.resource_selector.unwrap().include,
        vec!["*/ports/c4d9350e"]
    );
    let detection = request.detection_method.unwrap();
    assert_eq!(detection.method_type.as_deref(), Some("THRESHOLD"));
    assert_eq!(detection.operand.as_deref(), Some("ABOVE"));

    let body = serde_json::to_value(build_request(&planned_rule())).unwrap();
    assert!(body.get("uuid").is_none());
    assert!(body.get("changeLog").is_none());
}

#[test]
fn test_needs_update_ignores_computed_fields() {
    let state = stored_rule();
    let mut plan = stored_rule();
    plan.base.state = "INACTIVE".into();
    assert!(!plan.needs_update(&state));

    plan.base.enabled = Value::new(false);
    assert!(plan.needs_update(&state));
}

#[tokio::test]
async fn test_create_waits_for_active_rule() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/fabric/v4/streams/9d1b8f0e-stream/alertRules")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "type": "METRIC_ALERT",
            "enabled": true,
            "detectionMethod": {"type": "THRESHOLD", "windowSize": "PT15M"}
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"uuid":"a1b2c3","state":"INACTIVE"}"#)
        .create_async()
        .await;
    let _get = server
        .mock("GET", RULE_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ACTIVE_RULE)
        .create_async()
        .await;

    let planned_state = DynamicValue::from_model(&planned_rule()).unwrap();
    let response = configured_resource(&server)
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "equinix_fabric_stream_alert_rule".to_string(),
                planned_state: planned_state.clone(),
                config: planned_state,
                provider_meta: None,
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state: StreamAlertRuleResourceModel = response.new_state.as_model().unwrap();
    assert_eq!(state.id.as_str(), "a1b2c3");
    assert_eq!(state.stream_id.as_str(), STREAM_ID);
    assert_eq!(state.base.state.as_str(), "ACTIVE");
    assert_eq!(
        state.base.change_log.to_ptr().unwrap().created_by.as_str(),
        "tester"
    );
    create.assert_async().await;
}

#[tokio::test]
async fn test_create_reports_api_error() {
    let mut server = Server::new_async().await;
    let _create = server
        .mock("POST", "/fabric/v4/streams/9d1b8f0e-stream/alertRules")
        .with_status(400)
        .with_body(r#"[{"errorCode":"EQ-3045003","errorMessage":"Invalid metric name"}]"#)
        .create_async()
        .await;

    let planned_state = DynamicValue::from_model(&planned_rule()).unwrap();
    let response = configured_resource(&server)
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "equinix_fabric_stream_alert_rule".to_string(),
                planned_state: planned_state.clone(),
                config: planned_state,
                provider_meta: None,
            },
        )
        .await;

    assert!(response.diagnostics.has_error());
    assert_eq!(
        response.diagnostics[0].summary,
        "failed creating stream alert rule"
    );
    assert!(response.diagnostics[0].detail.contains("Invalid metric name"));
}

#[tokio::test]
async fn test_read_reports_api_error() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", RULE_PATH)
        .with_status(400)
        .with_body(r#"[{"errorCode":"EQ-3045001","errorMessage":"bad request"}]"#)
        .create_async()
        .await;

    let current_state = DynamicValue::from_model(&stored_rule()).unwrap();
    let response = configured_resource(&server)
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "equinix_fabric_stream_alert_rule".to_string(),
                current_state: current_state.clone(),
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(response.diagnostics.has_error());
    assert_eq!(
        response.diagnostics[0].summary,
        "failed retrieving stream alert rule a1b2c3"
    );
    assert_eq!(response.new_state, Some(current_state));
}

#[tokio::test]
async fn test_update_without_changes_warns() {
    let server = Server::new_async().await;
    let response = configured_resource(&server)
        .update(Context::new(), update_request(&stored_rule(), &stored_rule()))
        .await;

    assert!(!response.diagnostics.has_error());
    assert_eq!(
        response.diagnostics[0].summary,
        "No updatable fields have changed"
    );
}

#[tokio::test]
async fn test_update_puts_full_rule() {
    let mut server = Server::new_async().await;
    let put = server
        .mock("PUT", RULE_PATH)
        .match_body(Matcher::PartialJson(serde_json::json!({
            "name": "renamed",
            "metricSelector": {"include": ["equinix.fabric.port.bandwidth_tx.usage"]}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"uuid":"a1b2c3","state":"INACTIVE"}"#)
        .create_async()
        .await;
    let _get = server
        .mock("GET", RULE_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ACTIVE_RULE.replace("\"port-bandwidth\"", "\"renamed\""))
        .create_async()
        .await;

    let mut plan = stored_rule();
    plan.base.name = "renamed".into();
    let response = configured_resource(&server)
        .update(Context::new(), update_request(&stored_rule(), &plan))
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state: StreamAlertRuleResourceModel = response.new_state.as_model().unwrap();
    assert_eq!(state.base.name.as_str(), "renamed");
    assert_eq!(state.id.as_str(), "a1b2c3");
    put.assert_async().await;
}

#[tokio::test]
async fn test_delete_accepts_inactive_or_missing_rule() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", RULE_PATH)
        .with_status(404)
        .create_async()
        .await;
    let _get = server
        .mock("GET", RULE_PATH)
        .with_status(403)
        .create_async()
        .await;

    let response = configured_resource(&server)
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "equinix_fabric_stream_alert_rule".to_string(),
                prior_state: DynamicValue::from_model(&stored_rule()).unwrap(),
                provider_meta: None,
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    delete.assert_async().await;
}

#[tokio::test]
async fn test_delete_reports_api_error() {
    let mut server = Server::new_async().await;
    let _delete = server
        .mock("DELETE", RULE_PATH)
        .with_status(400)
        .with_body(r#"[{"errorCode":"EQ-3045010","errorMessage":"rule is locked"}]"#)
        .create_async()
        .await;

    let response = configured_resource(&server)
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "equinix_fabric_stream_alert_rule".to_string(),
                prior_state: DynamicValue::from_model(&stored_rule()).unwrap(),
                provider_meta: None,
            },
        )
        .await;

    assert!(response.diagnostics.has_error());
    assert_eq!(
        response.diagnostics[0].summary,
        "Failed deleting Stream Alert Rule a1b2c3"
    );
}

#[tokio::test]
async fn test_configure_rejects_missing_provider_data() {
    let mut resource = StreamAlertRuleResource::new();
    let response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: None,
            },
        )
        .await;
    assert!(response.diagnostics.has_error());

    let server = Server::new_async().await;
    let client = Client::new(&server.url(), FabricAuth::Token("t".to_string()), None).unwrap();
    let data: Arc<dyn Any + Send + Sync> = Arc::new(EquinixProviderData::new(client));
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
fn alert_rule_waiters_track_activation_and_removal() {
    assert_eq!(CREATE_WAITER.pending, &["INACTIVE"]);
    assert_eq!(CREATE_WAITER.target, &["ACTIVE"]);
    assert_eq!(CREATE_WAITER.delay, Duration::from_secs(30));
    assert_eq!(CREATE_WAITER.min_timeout, Duration::from_secs(30));
    assert_eq!(CREATE_WAITER.not_found_checks, None);

    assert_eq!(DELETE_WAITER.pending, &["ACTIVE"]);
    assert_eq!(DELETE_WAITER.target, &[DELETED_MARKER, "INACTIVE"]);
    assert_eq!(DELETE_WAITER.delay, Duration::from_secs(10));
    assert_eq!(DELETE_WAITER.min_timeout, Duration::from_secs(5));
    assert_eq!(DELETE_WAITER.not_found_checks, None);
}
