//! Fabric route aggregation rule resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tfplug::context::Context;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::retry::{StateChangeConf, WaitError};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::timeouts::{timeouts_attribute, TimeoutOpts, Timeouts};
use tfplug::typed::{ObjectValueOf, StringValue, Value};
use tfplug::types::{Diagnostic, DynamicValue};

use super::{change_log_attribute, non_empty, ChangeLogModel, WaiterSettings};
use crate::api::fabric::route_aggregation_rules::{RouteAggregationRule, RULE_NOT_FOUND_CODE};
use crate::api::ApiError;
use crate::provider_data::{not_configured, EquinixProviderData};
use crate::resources::timeouts_of;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

const STATE_PROVISIONING: &str = "PROVISIONING";
const STATE_PROVISIONED: &str = "PROVISIONED";
const STATE_DEPROVISIONING: &str = "DEPROVISIONING";
const DELETED_MARKER: &str = "tf-marker-for-deleted-route-aggregation-rule";

pub(crate) const CREATE_WAITER: WaiterSettings = WaiterSettings {
    pending: &[STATE_PROVISIONING],
    target: &[STATE_PROVISIONED],
    delay: Duration::from_secs(30),
    min_timeout: Duration::from_secs(30),
    not_found_checks: None,
};

pub(crate) const DELETE_WAITER: WaiterSettings = WaiterSettings {
    pending: &[STATE_DEPROVISIONING],
    target: &[DELETED_MARKER],
    delay: Duration::from_secs(10),
    min_timeout: Duration::from_secs(5),
    not_found_checks: None,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeModel {
    pub uuid: StringValue,
    pub r#type: StringValue,
    pub href: StringValue,
}

/// Attributes shared by the resource and both data sources
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteAggregationRuleBaseModel {
    pub name: StringValue,
    pub description: StringValue,
    pub prefix: StringValue,
    pub href: StringValue,
    pub r#type: StringValue,
    pub uuid: StringValue,
    pub state: StringValue,
    pub change: ObjectValueOf<ChangeModel>,
    pub change_log: ObjectValueOf<ChangeLogModel>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteAggregationRuleResourceModel {
    pub id: StringValue,
    pub timeouts: ObjectValueOf<Timeouts>,
    pub route_aggregation_id: StringValue,
    #[serde(flatten)]
    pub base: RouteAggregationRuleBaseModel,
}

impl RouteAggregationRuleBaseModel {
    pub fn parse(&mut self, rule: &RouteAggregationRule) {
        self.name = rule.name.clone().into();
        self.description = non_empty(&rule.description).into();
        self.prefix = rule.prefix.clone().into();
        self.href = rule.href.clone().into();
        self.r#type = rule.rule_type.clone().into();
        self.uuid = rule.uuid.clone().into();
        self.state = rule.state.clone().into();

        let change = rule.change.clone().unwrap_or_default();
        self.change = ObjectValueOf::new(ChangeModel {
            uuid: change.uuid.into(),
            r#type: change.change_type.into(),
            href: change.href.into(),
        });
        self.change_log = ObjectValueOf::new(
            rule.change_log
                .as_ref()
                .map(ChangeLogModel::from)
                .unwrap_or_default(),
        );
    }
}

impl RouteAggregationRuleResourceModel {
    pub fn parse(&mut self, rule: &RouteAggregationRule) {
        self.id = rule.uuid.clone().into();
        self.base.parse(rule);
    }
}

pub fn build_create_request(plan: &RouteAggregationRuleResourceModel) -> RouteAggregationRule {
    RouteAggregationRule {
        name: plan.base.name.get().cloned(),
        description: plan.base.description.get().cloned(),
        prefix: plan.base.prefix.get().cloned(),
        ..Default::default()
    }
}

#[derive(Default)]
pub struct RouteAggregationRuleResource {
    provider_data: Option<EquinixProviderData>,
}

impl RouteAggregationRuleResource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn wait_for_create_update(
        provider_data: &EquinixProviderData,
        ctx: &Context,
        route_aggregation_id: &str,
        id: &str,
        timeout: Duration,
    ) -> Result<Option<RouteAggregationRule>, WaitError> {
        let client = &*provider_data.client;
        let conf = CREATE_WAITER.apply(StateChangeConf::new(move || async move {
            let rule = client
                .fabric()
                .route_aggregation_rules(route_aggregation_id)
                .get(id)
                .await?;
            let state = rule.state.clone().unwrap_or_default();
            Ok::<_, ApiError>((Some(rule), state))
        }))
        .timeout(timeout);

        provider_data.tune_waiter(conf).wait_for_state(ctx).await
    }

    async fn wait_for_delete(
        provider_data: &EquinixProviderData,
        ctx: &Context,
        route_aggregation_id: &str,
        id: &str,
        timeout: Duration,
    ) -> Result<Option<RouteAggregationRule>, WaitError> {
        let client = &*provider_data.client;
        let conf = DELETE_WAITER.apply(StateChangeConf::new(move || async move {
            match client
                .fabric()
                .route_aggregation_rules(route_aggregation_id)
                .get(id)
                .await
            {
                Ok(rule) => {
                    let state = rule.state.clone().unwrap_or_default();
                    Ok((Some(rule), state))
                }
                Err(e) if e.is_gone() || e.has_error_code(RULE_NOT_FOUND_CODE) => Ok((
                    Some(RouteAggregationRule::default()),
                    DELETED_MARKER.to_string(),
                )),
                Err(e) => Err::<(Option<RouteAggregationRule>, String), ApiError>(e),
            }
        }))
        .timeout(timeout);

        provider_data.tune_waiter(conf).wait_for_state(ctx).await
    }
}

#[async_trait]
impl Resource for RouteAggregationRuleResource {
    fn type_name(&self) -> &str {
        "equinix_fabric_route_aggregation_rule"
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
        let computed = |name: &str, description: &str| {
            AttributeBuilder::new(name, AttributeType::String)
                .description(description)
                .computed()
                .build()
        };

        let change = AttributeBuilder::nested(
            "change",
            NestedType::single(vec![
                computed("uuid", "Equinix-assigned unique id for a change"),
                computed("type", "Equinix defined Route Aggregation Change Type"),
                computed(
                    "href",
                    "Equinix auto generated URI to the route aggregation change",
                ),
            ]),
        )
        .description("Current state of latest route aggregation rule change")
        .computed()
        .plan_modifier(UseStateForUnknown::create())
        .build();

        let schema = SchemaBuilder::new()
            .version(0)
            .description(
                "Fabric V4 API compatible resource allows creation and management of Equinix Fabric Route Aggregation Rules",
            )
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The unique identifier of the resource")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(timeouts_attribute(TimeoutOpts::all()))
            .attribute(
                AttributeBuilder::new("route_aggregation_id", AttributeType::String)
                    .description("UUID of the Route Aggregation to apply this Rule to")
                    .required()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Customer provided name of the route aggregation rule")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Customer-provided route aggregation rule description")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("prefix", AttributeType::String)
                    .description("Customer-provided route aggregation rule prefix")
                    .required()
                    .build(),
            )
            .attribute(computed(
                "href",
                "Equinix auto generated URI to the route aggregation rule resource",
            ))
            .attribute(computed(
                "type",
                "Equinix defined Route Aggregation Type; BGP_IPv4_PREFIX_AGGREGATION, BGP_IPv6_PREFIX_AGGREGATION",
            ))
            .attribute(computed(
                "uuid",
                "Equinix-assigned unique id for the route aggregation rule resource",
            ))
            .attribute(computed(
                "state",
                "Value representing provisioning status for the route aggregation rule resource",
            ))
            .attribute(change)
            .attribute(change_log_attribute("route aggregation rule resource"))
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

        let mut plan: RouteAggregationRuleResourceModel = match request.planned_state.as_model()
        {
            Ok(plan) => plan,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read plan", e.to_string()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let route_aggregation_id = plan.route_aggregation_id.value_or_default();
        let created = match provider_data
            .client
            .fabric()
            .route_aggregation_rules(&route_aggregation_id)
            .create(&build_create_request(&plan))
            .await
        {
            Ok(rule) => rule,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed creating Route Aggregation Rule",
                    e.fabric_message(),
                ));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let uuid = created.uuid.clone().unwrap_or_default();
        tracing::info!(
            "Created route aggregation rule {} on route aggregation {}",
            uuid,
            route_aggregation_id
        );

        let timeout = timeouts_of(&plan.timeouts).create(DEFAULT_TIMEOUT);
        let checked = match Self::wait_for_create_update(
            provider_data,
            &ctx,
            &route_aggregation_id,
            &uuid,
            timeout,
        )
        .await
        {
            Ok(checked) => checked.unwrap_or(created),
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed creating Route Aggregation Rule {}", uuid),
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

        let mut state: RouteAggregationRuleResourceModel = match request.current_state.as_model()
        {
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
        let rule = match provider_data
            .client
            .fabric()
            .route_aggregation_rules(state.route_aggregation_id.as_str())
            .get(&id)
            .await
        {
            Ok(rule) => rule,
            Err(e) if e.is_not_found() || e.has_error_code(RULE_NOT_FOUND_CODE) => {
                tracing::warn!("Route aggregation rule {} not found, removing from state", id);
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                };
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed retrieving Route Aggregation Rule {}", id),
                    e.fabric_message(),
                ));
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

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
            .as_model::<RouteAggregationRuleResourceModel>()
            .and_then(|plan| {
                Ok((
                    plan,
                    request
                        .prior_state
                        .as_model::<RouteAggregationRuleResourceModel>()?,
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
        let route_aggregation_id = state.route_aggregation_id.value_or_default();
        let prefix = plan.base.prefix.value_or_default();

        if prefix == state.base.prefix.as_str() {
            diagnostics.push(Diagnostic::warning(
                "No updatable fields have changed",
                "Terraform detected a config change, but it is for a field that isn't updatable \
                 for the route aggregation rule resource. Please revert to prior config",
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        if let Err(e) = provider_data
            .client
            .fabric()
            .route_aggregation_rules(&route_aggregation_id)
            .update_prefix(&id, &prefix)
            .await
        {
            diagnostics.push(Diagnostic::error(
                format!("Failed updating Route Aggregation Rule {}", id),
                e.fabric_message(),
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let timeout = timeouts_of(&plan.timeouts).update(DEFAULT_TIMEOUT);
        let checked = match Self::wait_for_create_update(
            provider_data,
            &ctx,
            &route_aggregation_id,
            &id,
            timeout,
        )
        .await
        {
            Ok(checked) => checked.unwrap_or_default(),
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed updating Route Aggregation Rule {}", id),
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

        let state: RouteAggregationRuleResourceModel = match request.prior_state.as_model() {
            Ok(state) => state,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read state", e.to_string()));
                return DeleteResourceResponse { diagnostics };
            }
        };

        let id = state.id.value_or_default();
        let route_aggregation_id = state.route_aggregation_id.value_or_default();
        if let Err(e) = provider_data
            .client
            .fabric()
            .route_aggregation_rules(&route_aggregation_id)
            .delete(&id)
            .await
        {
            if !e.is_gone() && !e.has_error_code(RULE_NOT_FOUND_CODE) {
                diagnostics.push(Diagnostic::error(
                    format!("Failed deleting Route Aggregation Rule {}", id),
                    e.fabric_message(),
                ));
                return DeleteResourceResponse { diagnostics };
            }
        }

        let timeout = timeouts_of(&state.timeouts).delete(DEFAULT_TIMEOUT);
        if let Err(e) =
            Self::wait_for_delete(provider_data, &ctx, &route_aggregation_id, &id, timeout).await
        {
            diagnostics.push(Diagnostic::error(
                format!("Failed deleting Route Aggregation Rule {}", id),
                e.to_string(),
            ));
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for RouteAggregationRuleResource {
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
#[path = "./resource_route_aggregation_rule_test.rs"]
mod resource_route_aggregation_rule_test;
