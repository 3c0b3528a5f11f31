//! Route aggregation rule data sources

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
use tfplug::typed::{ListNestedObjectValueOf, ObjectValueOf, StringValue};
use tfplug::types::{Diagnostic, DynamicValue};

use super::{pagination_attribute, PaginationModel};
use crate::provider_data::{not_configured, EquinixProviderData};
use crate::resources::fabric::change_log_attribute;
use crate::resources::fabric::resource_route_aggregation_rule::RouteAggregationRuleBaseModel;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteAggregationRuleByIdModel {
    pub id: StringValue,
    pub route_aggregation_id: StringValue,
    pub route_aggregation_rule_id: StringValue,
    #[serde(flatten)]
    pub base: RouteAggregationRuleBaseModel,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteAggregationRulesModel {
    pub id: StringValue,
    pub route_aggregation_id: StringValue,
    pub pagination: ObjectValueOf<PaginationModel>,
    pub data: ListNestedObjectValueOf<RouteAggregationRuleBaseModel>,
}

fn computed_string(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .computed()
        .build()
}

fn rule_attributes() -> Vec<Attribute> {
    let change = AttributeBuilder::nested(
        "change",
        NestedType::single(vec![
            computed_string("uuid", "Equinix-assigned unique id for a change"),
            computed_string("type", "Equinix defined Route Aggregation Change Type"),
            computed_string("href", "Equinix auto-generated URI to the route aggregation change"),
        ]),
    )
    .description("Current state of latest Route Aggregation Rule change")
    .computed()
    .build();

    vec![
        computed_string("name", "Customer provided name of the route aggregation rule"),
        computed_string(
            "description",
            "Customer-provided route aggregation rule description",
        ),
        computed_string("prefix", "Route aggregation rule prefix"),
        computed_string("href", "Equinix auto-generated URI to the route aggregation rule resource"),
        computed_string("type", "Equinix defined Route Aggregation Type"),
        computed_string(
            "uuid",
            "Equinix-assigned unique id for the route aggregation rule resource",
        ),
        computed_string("state", "Value representing provisioning status for the route aggregation rule resource"),
        change,
        change_log_attribute("route aggregation rule"),
    ]
}

fn required_string(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .required()
        .build()
}

/// `equinix_fabric_route_aggregation_rule`
#[derive(Default)]
pub struct RouteAggregationRuleDataSource {
    provider_data: Option<EquinixProviderData>,
}

impl RouteAggregationRuleDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for RouteAggregationRuleDataSource {
    fn type_name(&self) -> &str {
        "equinix_fabric_route_aggregation_rule"
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
                "Fabric V4 API compatible data source that allows user to fetch Equinix Fabric Route Aggregation Rule by Rule Id",
            )
            .attribute(computed_string(
                "id",
                "The unique identifier of the data source",
            ))
            .attribute(required_string(
                "route_aggregation_id",
                "The uuid of the route aggregation this data source should retrieve",
            ))
            .attribute(required_string(
                "route_aggregation_rule_id",
                "The uuid of the route aggregation rule this data source should retrieve",
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

        let mut model: RouteAggregationRuleByIdModel = match request.config.as_model() {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read config", e.to_string()));
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        let rule_id = model.route_aggregation_rule_id.value_or_default();
        let rule = match provider_data
            .client
            .fabric()
            .route_aggregation_rules(model.route_aggregation_id.as_str())
            .get(&rule_id)
            .await
        {
            Ok(rule) => rule,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed retrieving Route Aggregation Rule {}", rule_id),
                    e.fabric_message(),
                ));
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        model.base.parse(&rule);
        model.id = rule.uuid.clone().into();

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
impl DataSourceWithConfigure for RouteAggregationRuleDataSource {
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

/// `equinix_fabric_route_aggregation_rules`
#[derive(Default)]
pub struct RouteAggregationRulesDataSource {
    provider_data: Option<EquinixProviderData>,
}

impl RouteAggregationRulesDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for RouteAggregationRulesDataSource {
    fn type_name(&self) -> &str {
        "equinix_fabric_route_aggregation_rules"
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
                "Fabric V4 API compatible data source that allows user to fetch Equinix Fabric Route Aggregation Rules with pagination",
            )
            .attribute(computed_string(
                "id",
                "The unique identifier of the data source",
            ))
            .attribute(required_string(
                "route_aggregation_id",
                "The uuid of the route aggregation this data source should retrieve",
            ))
            .attribute(pagination_attribute(
                "Pagination details for the returned route aggregation rules list",
                false,
                "The total number of route aggregation rules available to the user making the request",
            ))
            .attribute(
                AttributeBuilder::nested("data", NestedType::list(rule_attributes()))
                    .description("Returned list of route aggregation rule objects")
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

        let mut model: RouteAggregationRulesModel = match request.config.as_model() {
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
            .route_aggregation_rules(model.route_aggregation_id.as_str())
            .list(offset, limit)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed retrieving Route Aggregation Rules",
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
                "no data retrieved by route aggregation rules data source",
                "either the route aggregation does not have any rules to pull or the combination of limit and offset needs to be updated",
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
                let mut base = RouteAggregationRuleBaseModel::default();
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
impl DataSourceWithConfigure for RouteAggregationRulesDataSource {
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
