//! Advertised and received route table search for a Fabric connection

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
use tfplug::typed::{Int32Value, ListNestedObjectValueOf, ListValueOf, ObjectValueOf, StringValue};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::validator::{NumberRange, StringOneOf};

use super::PaginationModel;
use crate::api::fabric::routes::{
    ConnectionRoute, RouteDirection, RouteFilterExpression, RouteFilters, RoutePagination,
    RouteSearchRequest, RouteSort, DEFAULT_SEARCH_LIMIT,
};
use crate::provider_data::{not_configured, EquinixProviderData};
use crate::resources::fabric::{change_log_attribute, ChangeLogModel};

const FILTER_OPERATORS: &[&str] = &[
    "=",
    "!=",
    ">",
    ">=",
    "<",
    "<=",
    "BETWEEN",
    "NOT BETWEEN",
    "LIKE",
    "NOT LIKE",
    "IN",
    "NOT IN",
    "IS NOT NULL",
    "IS NULL",
];

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterModel {
    pub property: StringValue,
    pub operator: StringValue,
    pub values: ListValueOf<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortModel {
    pub direction: StringValue,
    pub property: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConnectionModel {
    pub uuid: StringValue,
    pub name: StringValue,
    pub href: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteModel {
    pub r#type: StringValue,
    pub protocol_type: StringValue,
    pub state: StringValue,
    pub prefix: StringValue,
    pub next_hop: StringValue,
    pub med: Int32Value,
    pub local_preference: Int32Value,
    pub as_path: ListValueOf<String>,
    pub connection: ObjectValueOf<RouteConnectionModel>,
    pub change_log: ObjectValueOf<ChangeLogModel>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesModel {
    pub id: StringValue,
    pub connection_id: StringValue,
    pub filter: ObjectValueOf<FilterModel>,
    pub pagination: ObjectValueOf<PaginationModel>,
    pub sort: ObjectValueOf<SortModel>,
    pub data: ListNestedObjectValueOf<RouteModel>,
}

impl From<&ConnectionRoute> for RouteModel {
    fn from(route: &ConnectionRoute) -> Self {
        let connection = route.connection.clone().unwrap_or_default();
        Self {
            r#type: route.route_type.clone().into(),
            protocol_type: route.protocol_type.clone().into(),
            state: route.state.clone().into(),
            prefix: route.prefix.clone().into(),
            next_hop: route.next_hop.clone().into(),
            med: route.med.into(),
            local_preference: route.local_preference.into(),
            as_path: ListValueOf::from_values(route.as_path.clone()),
            connection: ObjectValueOf::new(RouteConnectionModel {
                uuid: connection.uuid.into(),
                name: connection.name.into(),
                href: connection.href.into(),
            }),
            change_log: ObjectValueOf::new(
                route
                    .change_log
                    .as_ref()
                    .map(ChangeLogModel::from)
                    .unwrap_or_default(),
            ),
        }
    }
}

impl RoutesModel {
    /// Search body: a single `and` expression, limit falling back to the
    /// API page size, sort only when a property is named.
    pub fn search_request(&self) -> RouteSearchRequest {
        let filter = self.filter.to_ptr().cloned().unwrap_or_default();
        let values = filter
            .values
            .elements()
            .iter()
            .filter_map(|v| v.get().cloned())
            .collect();
        let expression = RouteFilterExpression {
            property: filter.property.value_or_default(),
            operator: filter.operator.into_option(),
            values,
        };

        let pagination = self.pagination.to_ptr().cloned().unwrap_or_default();
        let limit = match pagination.limit.value_or_default() {
            0 => DEFAULT_SEARCH_LIMIT,
            limit => limit,
        };

        let sort = self
            .sort
            .to_ptr()
            .filter(|s| !s.property.as_str().is_empty())
            .map(|s| RouteSort {
                property: s.property.value_or_default(),
                direction: match s.direction.as_str() {
                    "" => "DESC".to_string(),
                    direction => direction.to_string(),
                },
            })
            .into_iter()
            .collect();

        RouteSearchRequest {
            filter: RouteFilters {
                and: vec![expression],
            },
            pagination: RoutePagination {
                offset: pagination.offset.value_or_default(),
                limit,
            },
            sort,
        }
    }
}

fn computed(name: &str, r#type: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .computed()
        .build()
}

fn route_attributes(noun: &str) -> Vec<Attribute> {
    let connection = AttributeBuilder::nested(
        "connection",
        NestedType::single(vec![
            computed("uuid", AttributeType::String, "UUID of the Connection"),
            computed("name", AttributeType::String, "Name of the Connection"),
            computed("href", AttributeType::String, "HREF of the Connection"),
        ]),
    )
    .description("Connection of the route table entry")
    .computed()
    .build();

    vec![
        computed("type", AttributeType::String, &format!("Indicator of a {}", noun)),
        computed(
            "protocol_type",
            AttributeType::String,
            &format!("{} protocol type", noun),
        ),
        computed("state", AttributeType::String, &format!("State of the {}", noun)),
        computed("prefix", AttributeType::String, &format!("Prefix of the {}", noun)),
        computed("next_hop", AttributeType::String, &format!("Next hop of the {}", noun)),
        computed(
            "med",
            AttributeType::Number,
            &format!("Multi-Exit Discriminator of the {}", noun),
        ),
        computed(
            "local_preference",
            AttributeType::Number,
            &format!("Local preference of the {}", noun),
        ),
        computed(
            "as_path",
            AttributeType::List(Box::new(AttributeType::String)),
            &format!("AS path of the {}", noun),
        ),
        connection,
        change_log_attribute("route table entry"),
    ]
}

/// `equinix_fabric_connection_advertised_routes` and
/// `equinix_fabric_connection_received_routes`
pub struct ConnectionRoutesDataSource {
    direction: RouteDirection,
    provider_data: Option<EquinixProviderData>,
}

impl ConnectionRoutesDataSource {
    pub fn advertised() -> Self {
        Self {
            direction: RouteDirection::Advertised,
            provider_data: None,
        }
    }

    pub fn received() -> Self {
        Self {
            direction: RouteDirection::Received,
            provider_data: None,
        }
    }

    fn noun(&self) -> String {
        format!("{} route", self.direction)
    }
}

#[async_trait]
impl DataSource for ConnectionRoutesDataSource {
    fn type_name(&self) -> &str {
        match self.direction {
            RouteDirection::Advertised => "equinix_fabric_connection_advertised_routes",
            RouteDirection::Received => "equinix_fabric_connection_received_routes",
        }
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
        let noun = self.noun();

        let filter = AttributeBuilder::nested(
            "filter",
            NestedType::single(vec![
                AttributeBuilder::new("property", AttributeType::String)
                    .description("Route property to filter on, e.g. /type or /prefix")
                    .required()
                    .build(),
                AttributeBuilder::new("operator", AttributeType::String)
                    .description("Operator applied to the property and values")
                    .required()
                    .validator(StringOneOf::create(FILTER_OPERATORS))
                    .build(),
                AttributeBuilder::new("values", AttributeType::List(Box::new(AttributeType::String)))
                    .description("Values the property and operator combination is applied to")
                    .required()
                    .build(),
            ]),
        )
        .description("Filter for the route search request")
        .required()
        .build();

        let pagination = AttributeBuilder::nested(
            "pagination",
            NestedType::single(vec![
                AttributeBuilder::new("offset", AttributeType::Number)
                    .description("Index of the first item returned in the response")
                    .optional()
                    .validator(NumberRange::create(Some(0.0), None))
                    .build(),
                AttributeBuilder::new("limit", AttributeType::Number)
                    .description("Maximum number of search results returned per page")
                    .optional()
                    .validator(NumberRange::create(Some(1.0), Some(100.0)))
                    .build(),
                computed("total", AttributeType::Number, "The total number of elements returned"),
                computed(
                    "next",
                    AttributeType::String,
                    "URL relative to the next item in the response",
                ),
                computed(
                    "previous",
                    AttributeType::String,
                    "URL relative to the previous item in the response",
                ),
            ]),
        )
        .description(&format!("Pagination details for the returned {}s list", noun))
        .required()
        .build();

        let sort = AttributeBuilder::nested(
            "sort",
            NestedType::single(vec![
                AttributeBuilder::new("direction", AttributeType::String)
                    .description("Sort direction, one of [ASC, DESC]")
                    .optional()
                    .validator(StringOneOf::create(&["ASC", "DESC"]))
                    .build(),
                AttributeBuilder::new("property", AttributeType::String)
                    .description("Property name to sort by")
                    .optional()
                    .build(),
            ]),
        )
        .description(&format!("Sort details for the returned {}s list", noun))
        .optional()
        .build();

        let schema = SchemaBuilder::new()
            .version(0)
            .description(&format!(
                "Fabric V4 API compatible data source that searches the {}s of a connection",
                noun
            ))
            .attribute(computed(
                "id",
                AttributeType::String,
                "The unique identifier of the data source",
            ))
            .attribute(
                AttributeBuilder::new("connection_id", AttributeType::String)
                    .description("The uuid of the connection whose routes are retrieved")
                    .required()
                    .build(),
            )
            .attribute(filter)
            .attribute(pagination)
            .attribute(sort)
            .attribute(
                AttributeBuilder::nested("data", NestedType::list(route_attributes(&noun)))
                    .description(&format!("Returned list of {} objects", noun))
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

        let mut model: RoutesModel = match request.config.as_model() {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read config", e.to_string()));
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        let search = model.search_request();
        let page = match provider_data
            .client
            .fabric()
            .routes(model.connection_id.as_str())
            .search(self.direction, &search)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("api error retrieving {} routes data", self.direction),
                    e.fabric_message(),
                ));
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        if page.data.is_empty() {
            diagnostics.push(Diagnostic::error(
                format!("no data retrieved by {} routes data source", self.direction),
                format!(
                    "either the connection does not have any {} routes data to pull or the combination of limit and offset needs to be updated",
                    self.direction
                ),
            ));
            return ReadDataSourceResponse {
                state: request.config,
                diagnostics,
            };
        }

        model.id = model.connection_id.clone();
        model.pagination = ObjectValueOf::new(PaginationModel::from(&page.pagination));
        model.data = ListNestedObjectValueOf::from_slice(
            page.data.iter().map(RouteModel::from).collect(),
        );
        tracing::debug!(
            "Read {} {} routes of connection {}",
            page.data.len(),
            self.direction,
            model.connection_id.as_str()
        );

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
impl DataSourceWithConfigure for ConnectionRoutesDataSource {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Client, FabricAuth};
    use mockito::{Matcher, Server};
    use tfplug::typed::Value;
    use tfplug::types::{ClientCapabilities, Diagnostics};

    fn configured(direction: RouteDirection, server: &Server) -> ConnectionRoutesDataSource {
        let client = Client::new(&server.url(), FabricAuth::Token("t".to_string()), None).unwrap();
        ConnectionRoutesDataSource {
            direction,
            provider_data: Some(EquinixProviderData::new(client)),
        }
    }

    fn config(limit: Option<i32>, sort: Option<SortModel>) -> RoutesModel {
        RoutesModel {
            connection_id: "conn-1".into(),
            filter: ObjectValueOf::new(FilterModel {
                property: "/type".into(),
                operator: "=".into(),
                values: ListValueOf::from_values(["IPv4_BGP_ROUTE".to_string()]),
            }),
            pagination: ObjectValueOf::new(PaginationModel {
                offset: Value::new(0),
                limit: limit.into(),
                ..Default::default()
            }),
            sort: ObjectValueOf::from_ptr(sort),
            ..Default::default()
        }
    }

    fn read_request(model: &RoutesModel) -> ReadDataSourceRequest {
        ReadDataSourceRequest {
            type_name: "equinix_fabric_connection_advertised_routes".to_string(),
            config: DynamicValue::from_model(model).unwrap(),
            provider_meta: None,
            client_capabilities: ClientCapabilities::default(),
        }
    }

    #[test]
    fn test_search_request_defaults() {
        let request = config(None, None).search_request();
        assert_eq!(request.pagination.limit, DEFAULT_SEARCH_LIMIT);
        assert_eq!(request.pagination.offset, 0);
        assert!(request.sort.is_empty());
        assert_eq!(request.filter.and.len(), 1);
        assert_eq!(request.filter.and[0].operator.as_deref(), Some("="));
        assert_eq!(request.filter.and[0].values, vec!["IPv4_BGP_ROUTE".to_string()]);
    }

    #[test]
    fn test_search_request_sort() {
        let request = config(
            Some(50),
            Some(SortModel {
                direction: Value::null(),
                property: "/changeLog/updatedDateTime".into(),
            }),
        )
        .search_request();
        assert_eq!(request.pagination.limit, 50);
        assert_eq!(
            request.sort,
            vec![RouteSort {
                property: "/changeLog/updatedDateTime".to_string(),
                direction: "DESC".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_read_advertised_routes() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/fabric/v4/connections/conn-1/advertisedRoutes/search")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "pagination": {"offset": 0, "limit": 20}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "pagination": {"offset": 0, "limit": 20, "total": 1},
                    "data": [{
                        "type": "IPv4_BGP_ROUTE",
                        "protocolType": "BGP",
                        "state": "ACTIVE",
                        "prefix": "192.168.10.0/24",
                        "nextHop": "10.1.1.2",
                        "MED": 100,
                        "localPreference": 200,
                        "asPath": ["65001", "65002"],
                        "connection": {"uuid": "conn-1", "name": "primary"}
                    }]
                }"#,
            )
            .create_async()
            .await;

        let data_source = configured(RouteDirection::Advertised, &server);
        let response = data_source
            .read(Context::new(), read_request(&config(None, None)))
            .await;

        m.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state: RoutesModel = response.state.as_model().unwrap();
        assert_eq!(state.id.as_str(), "conn-1");
        let route = &state.data.to_slice()[0];
        assert_eq!(route.prefix.as_str(), "192.168.10.0/24");
        assert_eq!(route.med, Value::new(100));
        assert_eq!(route.as_path.to_vec(), vec!["65001", "65002"]);
        assert_eq!(route.connection.to_ptr().unwrap().name.as_str(), "primary");
        assert_eq!(state.pagination.to_ptr().unwrap().total, Value::new(1));
    }

    #[tokio::test]
    async fn test_read_received_routes_empty_is_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/fabric/v4/connections/conn-1/receivedRoutes/search")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"pagination": {"offset": 0, "limit": 20, "total": 0}, "data": []}"#)
            .create_async()
            .await;

        let data_source = configured(RouteDirection::Received, &server);
        let response = data_source
            .read(Context::new(), read_request(&config(None, None)))
            .await;

        assert!(response.diagnostics.has_error());
        assert_eq!(
            response.diagnostics[0].summary,
            "no data retrieved by received routes data source"
        );
        assert!(response.diagnostics[0].detail.contains("received routes data to pull"));
    }

    #[tokio::test]
    async fn test_read_api_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/fabric/v4/connections/conn-1/advertisedRoutes/search")
            .with_status(400)
            .with_body(r#"[{"errorCode":"EQ-3040055","errorMessage":"Invalid filter"}]"#)
            .create_async()
            .await;

        let data_source = configured(RouteDirection::Advertised, &server);
        let response = data_source
            .read(Context::new(), read_request(&config(None, None)))
            .await;

        assert!(response.diagnostics.has_error());
        assert_eq!(
            response.diagnostics[0].summary,
            "api error retrieving advertised routes data"
        );
        assert!(response.diagnostics[0].detail.contains("Invalid filter"));
    }

    #[tokio::test]
    async fn test_type_names_and_schema() {
        assert_eq!(
            ConnectionRoutesDataSource::advertised().type_name(),
            "equinix_fabric_connection_advertised_routes"
        );
        let received = ConnectionRoutesDataSource::received();
        assert_eq!(
            received.type_name(),
            "equinix_fabric_connection_received_routes"
        );

        let schema = received
            .schema(Context::new(), DataSourceSchemaRequest)
            .await
            .schema;
        assert!(schema.attribute("filter").unwrap().required);
        assert!(schema.attribute("pagination").unwrap().required);
        assert!(schema.attribute("sort").unwrap().optional);
        assert!(schema.attribute("data").unwrap().computed);
    }
}
