//! Stream alert rule data sources: one rule by ids, or a page of rules

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource,
    DataSourceMetadataRequest, DataSourceMetadataResponse, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::typed::{ListNestedObjectValueOf, ObjectValueOf, StringValue, Value};
use tfplug::types::{Diagnostic, DynamicValue};

use super::{pagination_attribute, PaginationModel};
use crate::provider_data::{not_configured, EquinixProviderData};
use crate::resources::fabric::change_log_attribute;
use crate::resources::fabric::resource_stream_alert_rule::StreamAlertRuleBaseModel;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamAlertRuleByIdsModel {
    pub id: StringValue,
    pub stream_id: StringValue,
    pub alert_rule_id: StringValue,
    #[serde(flatten)]
    pub base: StreamAlertRuleBaseModel,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamAlertRulesModel {
    pub id: StringValue,
    pub stream_id: StringValue,
    pub pagination: ObjectValueOf<PaginationModel>,
    pub data: ListNestedObjectValueOf<StreamAlertRuleBaseModel>,
}

fn computed(name: &str, r#type: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .computed()
        .build()
}

fn selector(name: &str, description: &str) -> Attribute {
    AttributeBuilder::nested(
        name,
        NestedType::single(vec![computed(
            "include",
            AttributeType::List(Box::new(AttributeType::String)),
            "List of values to include",
        )]),
    )
    .description(description)
    .computed()
    .build()
}

fn rule_attributes() -> Vec<Attribute> {
    let detection_method = AttributeBuilder::nested(
        "detection_method",
        NestedType::single(vec![
            computed("type", AttributeType::String, "Stream Alert Rule detection method type"),
            computed("window_size", AttributeType::String, "Stream alert rule metric window size"),
            computed("operand", AttributeType::String, "Stream alert rule metric operand"),
            computed(
                "warning_threshold",
                AttributeType::String,
                "Stream alert rule metric warning threshold",
            ),
            computed(
                "critical_threshold",
                AttributeType::String,
                "Stream alert rule metric critical threshold",
            ),
        ]),
    )
    .description("Detection method for stream alert rule")
    .computed()
    .build();

    vec![
        computed("type", AttributeType::String, "Type of the stream alert rule"),
        computed("name", AttributeType::String, "Customer-provided stream alert rule name"),
        computed(
            "description",
            AttributeType::String,
            "Customer-provided stream alert rule description",
        ),
        computed("enabled", AttributeType::Bool, "Stream alert rule enabled status"),
        selector("resource_selector", "Resource selector for the stream alert rule"),
        selector("metric_selector", "Metric selector for the stream alert rule"),
        detection_method,
        computed("href", AttributeType::String, "Equinix assigned URI of the stream alert rule"),
        computed(
            "uuid",
            AttributeType::String,
            "Equinix assigned unique identifier for the stream alert rule",
        ),
        computed(
            "state",
            AttributeType::String,
            "Value representing provisioning status for the stream alert rule",
        ),
        change_log_attribute("stream alert rule"),
    ]
}

fn required_string(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .required()
        .build()
}

fn stream_id_attribute() -> Attribute {
    required_string(
        "stream_id",
        "The uuid of the stream that is the target of the stream alert rule",
    )
}

fn id_attribute() -> Attribute {
    computed(
        "id",
        AttributeType::String,
        "The unique identifier of the data source",
    )
}

/// `equinix_fabric_stream_alert_rule`
#[derive(Default)]
pub struct StreamAlertRuleDataSource {
    provider_data: Option<EquinixProviderData>,
}

impl StreamAlertRuleDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for StreamAlertRuleDataSource {
    fn type_name(&self) -> &str {
        "equinix_fabric_stream_alert_rule"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description(
                "Fabric V4 API compatible data source that allows user to fetch Equinix Fabric Stream Alert Rule by Stream Id and Alert Rule Id",
            )
            .attribute(id_attribute())
            .attribute(stream_id_attribute())
            .attribute(required_string(
                "alert_rule_id",
                "The uuid of the stream alert rule",
            ))
            .attributes(rule_attributes())
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        let schema = self.schema(ctx, DataSourceSchemaRequest).await.schema;
        ValidateDataSourceConfigResponse {
            diagnostics: schema.validate(&request.config),
        }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        let mut model: StreamAlertRuleByIdsModel = match request.config.as_model() {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read config", e.to_string()));
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        let alert_rule_id = model.alert_rule_id.value_or_default();
        let rule = match provider_data
            .client
            .fabric()
            .stream_alert_rules(model.stream_id.as_str())
            .get(&alert_rule_id)
            .await
        {
            Ok(rule) => rule,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("failed retrieving stream alert rule {}", alert_rule_id),
                    e.fabric_message(),
                ));
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        model.base.parse(&rule);
        let uuid = rule.uuid.clone().unwrap_or_default();
        model.id = Value::new(uuid.clone());
        model.alert_rule_id = Value::new(uuid);

        match DynamicValue::from_model(&model) {
            Ok(state) => ReadDataSourceResponse { state, diagnostics },
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to encode state", e.to_string()));
                ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                }
            }
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for StreamAlertRuleDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        match EquinixProviderData::from_configure(request.provider_data, "data source") {
            Ok(provider_data) => self.provider_data = Some(provider_data),
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}

/// `equinix_fabric_stream_alert_rules`
#[derive(Default)]
pub struct StreamAlertRulesDataSource {
    provider_data: Option<EquinixProviderData>,
}

impl StreamAlertRulesDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for StreamAlertRulesDataSource {
    fn type_name(&self) -> &str {
        "equinix_fabric_stream_alert_rules"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description(
                "Fabric V4 API compatible data source that allows user to fetch Equinix Fabric Stream Alert Rules with pagination",
            )
            .attribute(id_attribute())
            .attribute(stream_id_attribute())
            .attribute(pagination_attribute(
                "Pagination details for the returned stream alert rules list",
                true,
                "The total number of alert rules available to the user making the request",
            ))
            .attribute(
                AttributeBuilder::nested("data", NestedType::list(rule_attributes()))
                    .description("Returned list of stream alert rule objects")
                    .computed()
                    .build(),
            )
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        let schema = self.schema(ctx, DataSourceSchemaRequest).await.schema;
        ValidateDataSourceConfigResponse {
            diagnostics: schema.validate(&request.config),
        }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        let mut model: StreamAlertRulesModel = match request.config.as_model() {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read config", e.to_string()));
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        let (offset, limit) = PaginationModel::requested(&model.pagination);
        let page = match provider_data
            .client
            .fabric()
            .stream_alert_rules(model.stream_id.as_str())
            .list(offset, limit)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "failed retrieving stream alert rules",
                    e.fabric_message(),
                ));
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        if page.data.is_empty() {
            diagnostics.push(Diagnostic::error(
                "no data retrieved by stream alert rule data source",
                "either the account does not have any stream alert rule data to pull or the combination of limit and offset needs to be updated",
            ));
            return ReadDataSourceResponse {
                state: request.config,
                diagnostics,
            };
        }

        let rules = page
            .data
            .iter()
            .map(|rule| {
                let mut base = StreamAlertRuleBaseModel::default();
                base.parse(rule);
                base
            })
            .collect::<Vec<_>>();
        model.id = rules[0].uuid.clone();
        model.pagination = ObjectValueOf::new(PaginationModel::from(&page.pagination));
        model.data = ListNestedObjectValueOf::from_slice(rules);

        match DynamicValue::from_model(&model) {
            Ok(state) => ReadDataSourceResponse { state, diagnostics },
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to encode state", e.to_string()));
                ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                }
            }
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for StreamAlertRulesDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        match EquinixProviderData::from_configure(request.provider_data, "data source") {
            Ok(provider_data) => self.provider_data = Some(provider_data),
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}
