//! Fabric stream alert rule resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::retry::{StateChangeConf, WaitError};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::timeouts::{timeouts_attribute, TimeoutOpts, Timeouts};
use tfplug::typed::{BoolValue, ListValueOf, ObjectValueOf, StringValue, Value};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::validator::StringOneOf;

use super::{change_log_attribute, ChangeLogModel, WaiterSettings};
use crate::api::fabric::stream_alert_rules::{DetectionMethod, Selector, StreamAlertRule};
use crate::api::ApiError;
use crate::provider_data::{not_configured, EquinixProviderData};
use crate::resources::timeouts_of;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

const STATE_ACTIVE: &str = "ACTIVE";
const STATE_INACTIVE: &str = "INACTIVE";
const DELETED_MARKER: &str = "tf-marker-for-deleted-stream-alert-rule";

pub(crate) const CREATE_WAITER: WaiterSettings = WaiterSettings {
    pending: &[STATE_INACTIVE],
    target: &[STATE_ACTIVE],
    delay: Duration::from_secs(30),
    min_timeout: Duration::from_secs(30),
    not_found_checks: None,
};

pub(crate) const DELETE_WAITER: WaiterSettings = WaiterSettings {
    pending: &[STATE_ACTIVE],
    target: &[DELETED_MARKER, STATE_INACTIVE],
    delay: Duration::from_secs(10),
    min_timeout: Duration::from_secs(5),
    not_found_checks: None,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorModel {
    pub include: ListValueOf<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionMethodModel {
    pub r#type: StringValue,
    pub window_size: StringValue,
    pub operand: StringValue,
    pub warning_threshold: StringValue,
    pub critical_threshold: StringValue,
}

/// Attributes shared by the resource and both data sources
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamAlertRuleBaseModel {
    pub r#type: StringValue,
    pub name: StringValue,
    pub description: StringValue,
    pub enabled: BoolValue,
    pub resource_selector: ObjectValueOf<SelectorModel>,
    pub metric_selector: ObjectValueOf<SelectorModel>,
    pub detection_method: ObjectValueOf<DetectionMethodModel>,
    pub href: StringValue,
    pub uuid: StringValue,
    pub state: StringValue,
    pub change_log: ObjectValueOf<ChangeLogModel>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamAlertRuleResourceModel {
    pub stream_id: StringValue,
    pub id: StringValue,
    pub timeouts: ObjectValueOf<Timeouts>,
    #[serde(flatten)]
    pub base: StreamAlertRuleBaseModel,
}

fn parse_selector(selector: &Option<Selector>) -> ObjectValueOf<SelectorModel> {
    let include = selector
        .as_ref()
        .map(|s| s.include.clone())
        .unwrap_or_default();
    ObjectValueOf::new(SelectorModel {
        include: ListValueOf::from_values(include),
    })
}

impl StreamAlertRuleBaseModel {
    pub fn parse(&mut self, rule: &StreamAlertRule) {
        self.r#type = rule.rule_type.clone().into();
        self.name = rule.name.clone().into();
        self.description = rule.description.clone().into();
        self.href = rule.href.clone().into();
        self.uuid = rule.uuid.clone().into();
        self.state = rule.state.clone().into();
        self.enabled = Value::new(rule.enabled.unwrap_or_default());
        self.resource_selector = parse_selector(&rule.resource_selector);
        self.metric_selector = parse_selector(&rule.metric_selector);
        self.detection_method = ObjectValueOf::from_ptr(rule.detection_method.as_ref().map(|d| {
            DetectionMethodModel {
                r#type: d.method_type.clone().into(),
                window_size: d.window_size.clone().into(),
                operand: d.operand.clone().into(),
                warning_threshold: d.warning_threshold.clone().into(),
                critical_threshold: d.critical_threshold.clone().into(),
            }
        }));
        self.change_log = ObjectValueOf::new(
            rule.change_log
                .as_ref()
                .map(ChangeLogModel::from)
                .unwrap_or_default(),
        );
    }
}

impl StreamAlertRuleResourceModel {
    pub fn parse(&mut self, rule: &StreamAlertRule) {
        self.id = rule.uuid.clone().into();
        self.base.parse(rule);
    }

    /// True when an attribute the PUT endpoint accepts differs from state
    fn needs_update(&self, state: &Self) -> bool {
        self.base.name.as_str() != state.base.name.as_str()
            || self.base.description.as_str() != state.base.description.as_str()
            || self.base.enabled.value_or_default() != state.base.enabled.value_or_default()
            || self.base.resource_selector != state.base.resource_selector
            || self.base.metric_selector != state.base.metric_selector
            || self.base.detection_method != state.base.detection_method
    }
}

fn build_selector(selector: &ObjectValueOf<SelectorModel>) -> Option<Selector> {
    selector.to_ptr().map(|s| Selector {
        include: s.include.to_vec(),
    })
}

/// Body for both POST and PUT; the two share a shape
pub fn build_request(plan: &StreamAlertRuleResourceModel) -> StreamAlertRule {
    let base = &plan.base;
    StreamAlertRule {
        rule_type: base.r#type.get().cloned(),
        name: base.name.get().cloned(),
        description: base.description.get().cloned(),
        enabled: base.enabled.get().copied(),
        resource_selector: build_selector(&base.resource_selector),
        metric_selector: build_selector(&base.metric_selector),
        detection_method: base.detection_method.to_ptr().map(|d| DetectionMethod {
            method_type: d.r#type.get().cloned(),
            window_size: d.window_size.get().cloned(),
            operand: d.operand.get().cloned(),
            warning_threshold: d.warning_threshold.get().cloned(),
            critical_threshold: d.critical_threshold.get().cloned(),
        }),
        ..Default::default()
    }
}

#[derive(Default)]
pub struct StreamAlertRuleResource {
    provider_data: Option<EquinixProviderData>,
}

impl StreamAlertRuleResource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn wait_for_create_update(
        provider_data: &EquinixProviderData,
        ctx: &Context,
        stream_id: &str,
        id: &str,
        timeout: Duration,
    ) -> Result<Option<StreamAlertRule>, WaitError> {
        let client = &*provider_data.client;
        let conf = CREATE_WAITER.apply(StateChangeConf::new(move || async move {
            let rule = client.fabric().stream_alert_rules(stream_id).get(id).await?;
            let state = rule.state.clone().unwrap_or_default();
            Ok::<_, ApiError>((Some(rule), state))
        }))
        .timeout(timeout);

        provider_data.tune_waiter(conf).wait_for_state(ctx).await
    }

    async fn wait_for_delete(
        provider_data: &EquinixProviderData,
        ctx: &Context,
        stream_id: &str,
        id: &str,
        timeout: Duration,
    ) -> Result<Option<StreamAlertRule>, WaitError> {
        let client = &*provider_data.client;
        let conf = DELETE_WAITER.apply(StateChangeConf::new(move || async move {
            match client.fabric().stream_alert_rules(stream_id).get(id).await {
                Ok(rule) => {
                    let state = rule.state.clone().unwrap_or_default();
                    Ok((Some(rule), state))
                }
                Err(e) if e.is_gone() => Ok((
                    Some(StreamAlertRule::default()),
                    DELETED_MARKER.to_string(),
                )),
                Err(e) => Err::<(Option<StreamAlertRule>, String), ApiError>(e),
            }
        }))
        .timeout(timeout);

        provider_data.tune_waiter(conf).wait_for_state(ctx).await
    }
}

fn selector_attribute(name: &str, description: &str, include_description: &str) -> Attribute {
    AttributeBuilder::nested(
        name,
        NestedType::single(vec![AttributeBuilder::new(
            "include",
            AttributeType::List(Box::new(AttributeType::String)),
        )
        .description(include_description)
        .required()
        .build()]),
    )
    .description(description)
    .optional()
    .computed()
    .plan_modifier(UseStateForUnknown::create())
    .build()
}

fn optional_computed_string(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .computed()
        .build()
}

fn computed_with_state(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .computed()
        .plan_modifier(UseStateForUnknown::create())
        .build()
}

#[async_trait]
impl Resource for StreamAlertRuleResource {
    fn type_name(&self) -> &str {
        "equinix_fabric_stream_alert_rule"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let detection_method = AttributeBuilder::nested(
            "detection_method",
            NestedType::single(vec![
                AttributeBuilder::new("type", AttributeType::String)
                    .description("Stream Alert Rule detection method type")
                    .required()
                    .build(),
                optional_computed_string("window_size", "Stream alert rule metric window size"),
                AttributeBuilder::new("operand", AttributeType::String)
                    .description("Stream alert rule metric operand")
                    .optional()
                    .computed()
                    .validator(StringOneOf::create(&["ABOVE", "BELOW"]))
                    .build(),
                optional_computed_string(
                    "warning_threshold",
                    "Stream alert rule metric warning threshold",
                ),
                optional_computed_string(
                    "critical_threshold",
                    "Stream alert rule metric critical threshold",
                ),
            ]),
        )
        .description("Detection method for stream alert rule")
        .optional()
        .computed()
        .plan_modifier(UseStateForUnknown::create())
        .build();

        let schema = SchemaBuilder::new()
            .version(0)
            .description(
                "Fabric V4 API compatible resource allows creation and management of Equinix Fabric Stream Alert Rules",
            )
            .attribute(computed_with_state("id", "The unique identifier of the resource"))
            .attribute(timeouts_attribute(TimeoutOpts::all()))
            .attribute(
                AttributeBuilder::new("stream_id", AttributeType::String)
                    .description("The stream UUID that contains this alert rule")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("Type of the stream alert rule")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Customer-provided stream alert rule name")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Customer-provided stream alert rule description")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enabled", AttributeType::Bool)
                    .description("Stream alert rule enabled status")
                    .optional()
                    .computed()
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(selector_attribute(
                "resource_selector",
                "Resource selector for the stream alert rule",
                "List of resources to include",
            ))
            .attribute(selector_attribute(
                "metric_selector",
                "Metric selector for the stream alert rule",
                "List of metrics to include",
            ))
            .attribute(detection_method)
            .attribute(computed_with_state(
                "href",
                "Equinix assigned URI of the stream alert rule",
            ))
            .attribute(computed_with_state(
                "uuid",
                "Equinix assigned unique identifier for the stream alert rule",
            ))
            .attribute(computed_with_state(
                "state",
                "Value representing provisioning status for the stream alert rule",
            ))
            .attribute(change_log_attribute("stream alert rule"))
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let schema = self.schema(ctx, ResourceSchemaRequest).await.schema;
        ValidateResourceConfigResponse {
            diagnostics: schema.validate(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let mut plan: StreamAlertRuleResourceModel = match request.planned_state.as_model() {
            Ok(plan) => plan,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read plan", e.to_string()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let stream_id = plan.stream_id.value_or_default();
        let rules = provider_data.client.fabric().stream_alert_rules(&stream_id);
        let created = match rules.create(&build_request(&plan)).await {
            Ok(rule) => rule,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "failed creating stream alert rule",
                    e.fabric_message(),
                ));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let uuid = created.uuid.clone().unwrap_or_default();
        tracing::info!("Created stream alert rule {} on stream {}", uuid, stream_id);

        let timeout = timeouts_of(&plan.timeouts).create(DEFAULT_TIMEOUT);
        let checked =
            match Self::wait_for_create_update(provider_data, &ctx, &stream_id, &uuid, timeout)
                .await
            {
                Ok(checked) => checked.unwrap_or(created),
                Err(e) => {
                    diagnostics.push(Diagnostic::error(
                        format!("failed creating stream alert rule {}", uuid),
                        e.to_string(),
                    ));
                    return CreateResourceResponse {
                        new_state: request.planned_state,
                        diagnostics,
                    };
                }
            };

        plan.parse(&checked);
        match DynamicValue::from_model(&plan) {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to encode state", e.to_string()));
                CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                }
            }
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        let mut state: StreamAlertRuleResourceModel = match request.current_state.as_model() {
            Ok(state) => state,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read state", e.to_string()));
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        let id = state.id.value_or_default();
        let stream_id = state.stream_id.value_or_default();
        match provider_data
            .client
            .fabric()
            .stream_alert_rules(&stream_id)
            .get(&id)
            .await
        {
            Ok(rule) => {
                state.parse(&rule);
                match DynamicValue::from_model(&state) {
                    Ok(new_state) => ReadResourceResponse {
                        new_state: Some(new_state),
                        diagnostics,
                    },
                    Err(e) => {
                        diagnostics.push(Diagnostic::error("Failed to encode state", e.to_string()));
                        ReadResourceResponse {
                            new_state: Some(request.current_state),
                            diagnostics,
                        }
                    }
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("Stream alert rule {} not found, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("failed retrieving stream alert rule {}", id),
                    e.fabric_message(),
                ));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let models = request
            .planned_state
            .as_model::<StreamAlertRuleResourceModel>()
            .and_then(|plan| {
                Ok((
                    plan,
                    request
                        .prior_state
                        .as_model::<StreamAlertRuleResourceModel>()?,
                ))
            });
        let (mut plan, state) = match models {
            Ok(models) => models,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read plan", e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let id = state.id.value_or_default();
        let stream_id = state.stream_id.value_or_default();

        if !plan.needs_update(&state) {
            diagnostics.push(Diagnostic::warning(
                "No updatable fields have changed",
                "Terraform detected a config change, but it is for a field that isn't updatable \
                 for the stream alert rule resource. Please revert to prior config",
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let rules = provider_data.client.fabric().stream_alert_rules(&stream_id);
        if let Err(e) = rules.update(&id, &build_request(&plan)).await {
            diagnostics.push(Diagnostic::error(
                format!("failed updating stream alert rule {}", id),
                e.fabric_message(),
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let timeout = timeouts_of(&plan.timeouts).update(DEFAULT_TIMEOUT);
        let checked =
            match Self::wait_for_create_update(provider_data, &ctx, &stream_id, &id, timeout).await
            {
                Ok(checked) => checked.unwrap_or_default(),
                Err(e) => {
                    diagnostics.push(Diagnostic::error(
                        format!("failed updating stream alert rule {}", id),
                        e.to_string(),
                    ));
                    return UpdateResourceResponse {
                        new_state: request.prior_state,
                        diagnostics,
                    };
                }
            };

        plan.parse(&checked);
        if plan.id.as_str().is_empty() {
            plan.id = Value::new(id);
        }

        match DynamicValue::from_model(&plan) {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to encode state", e.to_string()));
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                }
            }
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return DeleteResourceResponse { diagnostics };
            }
        };

        let state: StreamAlertRuleResourceModel = match request.prior_state.as_model() {
            Ok(state) => state,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read state", e.to_string()));
                return DeleteResourceResponse { diagnostics };
            }
        };

        let id = state.id.value_or_default();
        let stream_id = state.stream_id.value_or_default();
        let rules = provider_data.client.fabric().stream_alert_rules(&stream_id);
        if let Err(e) = rules.delete(&id).await {
            if !e.is_gone() {
                diagnostics.push(Diagnostic::error(
                    format!("Failed deleting Stream Alert Rule {}", id),
                    e.fabric_message(),
                ));
                return DeleteResourceResponse { diagnostics };
            }
        }

        let timeout = timeouts_of(&state.timeouts).delete(DEFAULT_TIMEOUT);
        if let Err(e) = Self::wait_for_delete(provider_data, &ctx, &stream_id, &id, timeout).await {
            diagnostics.push(Diagnostic::error(
                format!("Failed deleting Stream Alert Rule {}", id),
                e.to_string(),
            ));
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for StreamAlertRuleResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        match EquinixProviderData::from_configure(request.provider_data, "resource") {
            Ok(provider_data) => self.provider_data = Some(provider_data),
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureResourceResponse { diagnostics }
    }
}

#[cfg(test)]
#[path = "./resource_stream_alert_rule_test.rs"]
mod resource_stream_alert_rule_test;
