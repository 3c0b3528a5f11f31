//! Metal project lookup by name or id

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource,
    DataSourceMetadataRequest, DataSourceMetadataResponse, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::typed::{BoolValue, ListNestedObjectValueOf, ListValueOf, StringValue, Value};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::validator::ConflictsWith;

use crate::api::metal::projects::{BgpConfig, Project};
use crate::api::{ApiError, Client};
use crate::provider_data::{not_configured, EquinixProviderData};
use crate::resources::metal::resource_project::{
    bgp_config_attributes, fetch_bgp_config, fetch_project, parse_bgp_config, BgpConfigModel,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDataSourceModel {
    pub id: StringValue,
    pub name: StringValue,
    pub project_id: StringValue,
    pub created: StringValue,
    pub updated: StringValue,
    pub backend_transfer: BoolValue,
    pub payment_method_id: StringValue,
    pub organization_id: StringValue,
    pub user_ids: ListValueOf<String>,
    pub bgp_config: ListNestedObjectValueOf<BgpConfigModel>,
}

impl ProjectDataSourceModel {
    pub fn parse(&mut self, project: &Project, bgp_config: Option<&BgpConfig>) {
        self.id = Value::new(project.id.clone());
        self.project_id = Value::new(project.id.clone());
        self.name = Value::new(project.name.clone());
        self.created = project.created_at.clone().into();
        self.updated = project.updated_at.clone().into();
        self.backend_transfer = Value::new(project.backend_transfer_enabled);
        self.organization_id = Value::new(project.organization_id().unwrap_or_default().to_string());
        self.payment_method_id =
            Value::new(project.payment_method_id().unwrap_or_default().to_string());
        self.user_ids = ListValueOf::from_values(project.member_ids());
        self.bgp_config = parse_bgp_config(bgp_config, &ListNestedObjectValueOf::null());
    }
}

#[derive(Debug)]
enum LookupError {
    Missing,
    NoMatch(String),
    Ambiguous(String, usize),
    Api(ApiError),
}

impl LookupError {
    fn diagnostic(&self) -> Diagnostic {
        match self {
            LookupError::Missing => Diagnostic::error(
                "Missing project identifier",
                "you must supply project_id or name",
            ),
            LookupError::NoMatch(name) => Diagnostic::error(
                "Project not found",
                format!("no project found with name {}", name),
            ),
            LookupError::Ambiguous(name, count) => Diagnostic::error(
                "Multiple projects found",
                format!(
                    "too many projects found with name {} (found {}, expected 1)",
                    name, count
                ),
            ),
            LookupError::Api(e) => Diagnostic::error("Error reading project", e.to_string()),
        }
    }
}

impl From<ApiError> for LookupError {
    fn from(e: ApiError) -> Self {
        LookupError::Api(e)
    }
}

/// Name lookups keep exact matches only; the API matches names loosely.
async fn lookup(
    client: &Client,
    model: &ProjectDataSourceModel,
) -> Result<(Project, Option<BgpConfig>), LookupError> {
    if let Some(name) = model.name.get().filter(|n| !n.is_empty()) {
        let mut matches: Vec<Project> = client
            .metal()
            .projects()
            .list_by_name(name)
            .await?
            .into_iter()
            .filter(|p| &p.name == name)
            .collect();
        return match matches.len() {
            0 => Err(LookupError::NoMatch(name.clone())),
            1 => {
                let project = matches.remove(0);
                let bgp_config = fetch_bgp_config(client, &project.id).await;
                Ok((project, bgp_config))
            }
            n => Err(LookupError::Ambiguous(name.clone(), n)),
        };
    }

    match model.project_id.get().filter(|id| !id.is_empty()) {
        Some(id) => Ok(fetch_project(client, id).await?),
        None => Err(LookupError::Missing),
    }
}

/// `equinix_metal_project`
#[derive(Default)]
pub struct ProjectDataSource {
    provider_data: Option<EquinixProviderData>,
}

impl ProjectDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for ProjectDataSource {
    fn type_name(&self) -> &str {
        "equinix_metal_project"
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
            .description("Use this data source to retrieve attributes of an existing Equinix Metal project")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The unique identifier of the project")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name which is used to look up the project")
                    .optional()
                    .computed()
                    .validator(ConflictsWith::create(&["project_id"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("project_id", AttributeType::String)
                    .description("The UUID by which to look up the project")
                    .optional()
                    .computed()
                    .validator(ConflictsWith::create(&["name"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("The timestamp for when the project was created")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated", AttributeType::String)
                    .description("The timestamp for the last time the project was updated")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("backend_transfer", AttributeType::Bool)
                    .description("Whether Backend Transfer is enabled for this project")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("payment_method_id", AttributeType::String)
                    .description("The UUID of payment method for this project")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_id", AttributeType::String)
                    .description("The UUID of this project's parent organization")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("user_ids", AttributeType::List(Box::new(AttributeType::String)))
                    .description("List of UUIDs of user accounts which belong to this project")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested("bgp_config", NestedType::list(bgp_config_attributes(true)))
                    .description("Optional BGP settings")
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

        let mut model: ProjectDataSourceModel = match request.config.as_model() {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read config", e.to_string()));
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        };

        match lookup(&provider_data.client, &model).await {
            Ok((project, bgp_config)) => model.parse(&project, bgp_config.as_ref()),
            Err(e) => {
                diagnostics.push(e.diagnostic());
                return ReadDataSourceResponse {
                    state: request.config,
                    diagnostics,
                };
            }
        }

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
impl DataSourceWithConfigure for ProjectDataSource {
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
    use crate::api::FabricAuth;
    use mockito::{Matcher, Server};
    use tfplug::types::{ClientCapabilities, Diagnostics};

    const PROJECT_ID: &str = "0b2a8f36-2b0c-4d1c-9e0e-8f9d4c2a6a11";

    fn project_json(id: &str, name: &str) -> String {
        format!(
            r#"{{
                "id": "{id}",
                "name": "{name}",
                "created_at": "2024-03-01T10:00:00Z",
                "updated_at": "2024-03-02T10:00:00Z",
                "backend_transfer_enabled": true,
                "organization": {{"href": "/metal/v1/organizations/org-1"}},
                "members": [{{"href": "/metal/v1/users/u-1"}}, {{"href": "/metal/v1/users/u-2"}}]
            }}"#
        )
    }

    fn configured(server: &Server) -> ProjectDataSource {
        let client =
            Client::new(&server.url(), FabricAuth::None, Some("metal-token".to_string())).unwrap();
        ProjectDataSource {
            provider_data: Some(EquinixProviderData::new(client)),
        }
    }

    fn read_request(model: ProjectDataSourceModel) -> ReadDataSourceRequest {
        ReadDataSourceRequest {
            type_name: "equinix_metal_project".to_string(),
            config: DynamicValue::from_model(&model).unwrap(),
            provider_meta: None,
            client_capabilities: ClientCapabilities::default(),
        }
    }

    #[tokio::test]
    async fn test_read_by_id_with_bgp_config() {
        let mut server = Server::new_async().await;
        let _project = server
            .mock("GET", format!("/metal/v1/projects/{}", PROJECT_ID).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(project_json(PROJECT_ID, "prod"))
            .create_async()
            .await;
        let _bgp = server
            .mock("GET", format!("/metal/v1/projects/{}/bgp-config", PROJECT_ID).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"bgp-1","deployment_type":"local","asn":65000,"status":"enabled","max_prefix":10}"#)
            .create_async()
            .await;

        let response = configured(&server)
            .read(
                Context::new(),
                read_request(ProjectDataSourceModel {
                    project_id: PROJECT_ID.into(),
                    ..Default::default()
                }),
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state: ProjectDataSourceModel = response.state.as_model().unwrap();
        assert_eq!(state.id.as_str(), PROJECT_ID);
        assert_eq!(state.name.as_str(), "prod");
        assert_eq!(state.organization_id.as_str(), "org-1");
        assert_eq!(state.payment_method_id.as_str(), "");
        assert_eq!(state.backend_transfer, Value::new(true));
        assert_eq!(state.user_ids.to_vec(), vec!["u-1", "u-2"]);
        let bgp = &state.bgp_config.to_slice()[0];
        assert_eq!(bgp.asn, Value::new(65000));
        assert_eq!(bgp.status.as_str(), "enabled");
    }

    #[tokio::test]
    async fn test_read_by_name_picks_exact_match() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", "/metal/v1/projects")
            .match_query(Matcher::UrlEncoded("name".into(), "prod".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"projects":[{},{}]}}"#,
                project_json("other", "prod-staging"),
                project_json(PROJECT_ID, "prod")
            ))
            .create_async()
            .await;
        let _bgp = server
            .mock("GET", format!("/metal/v1/projects/{}/bgp-config", PROJECT_ID).as_str())
            .with_status(404)
            .create_async()
            .await;

        let response = configured(&server)
            .read(
                Context::new(),
                read_request(ProjectDataSourceModel {
                    name: "prod".into(),
                    ..Default::default()
                }),
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state: ProjectDataSourceModel = response.state.as_model().unwrap();
        assert_eq!(state.project_id.as_str(), PROJECT_ID);
        assert!(state.bgp_config.is_null());
    }

    #[tokio::test]
    async fn test_read_by_name_ambiguous() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", "/metal/v1/projects")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"projects":[{},{}]}}"#,
                project_json("a", "prod"),
                project_json("b", "prod")
            ))
            .create_async()
            .await;

        let response = configured(&server)
            .read(
                Context::new(),
                read_request(ProjectDataSourceModel {
                    name: "prod".into(),
                    ..Default::default()
                }),
            )
            .await;

        assert!(response.diagnostics.has_error());
        assert_eq!(
            response.diagnostics[0].detail,
            "too many projects found with name prod (found 2, expected 1)"
        );
    }

    #[tokio::test]
    async fn test_read_by_name_no_match() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", "/metal/v1/projects")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"projects":[]}"#)
            .create_async()
            .await;

        let response = configured(&server)
            .read(
                Context::new(),
                read_request(ProjectDataSourceModel {
                    name: "missing".into(),
                    ..Default::default()
                }),
            )
            .await;

        assert_eq!(
            response.diagnostics[0].detail,
            "no project found with name missing"
        );
    }

    #[tokio::test]
    async fn test_read_requires_name_or_id() {
        let server = Server::new_async().await;
        let response = configured(&server)
            .read(Context::new(), read_request(ProjectDataSourceModel::default()))
            .await;

        assert!(response.diagnostics.has_error());
        assert_eq!(
            response.diagnostics[0].detail,
            "you must supply project_id or name"
        );
    }

    #[tokio::test]
    async fn test_name_conflicts_with_project_id() {
        let data_source = ProjectDataSource::new();
        let config = DynamicValue::from_model(&ProjectDataSourceModel {
            name: "prod".into(),
            project_id: PROJECT_ID.into(),
            ..Default::default()
        })
        .unwrap();

        let response = data_source
            .validate(
                Context::new(),
                ValidateDataSourceConfigRequest {
                    type_name: "equinix_metal_project".to_string(),
                    config,
                },
            )
            .await;

        assert!(response.diagnostics.has_error());
    }
}
