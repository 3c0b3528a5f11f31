//! Metal project resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ModifyPlanRequest,
    ModifyPlanResponse, ReadResourceRequest, ReadResourceResponse, Resource,
    ResourceMetadataRequest, ResourceMetadataResponse, ResourceSchemaRequest,
    ResourceSchemaResponse, ResourceWithConfigure, ResourceWithImportState,
    ResourceWithModifyPlan, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::typed::{BoolValue, Int64Value, ListNestedObjectValueOf, StringValue, Value};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{IsUuid, ListLength, StringOneOf};

use crate::api::metal::projects::{
    BgpConfig, BgpConfigRequest, Project, ProjectCreateRequest, ProjectUpdateRequest,
};
use crate::api::{ApiError, Client};
use crate::provider_data::{not_configured, EquinixProviderData};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BgpConfigModel {
    pub deployment_type: StringValue,
    pub asn: Int64Value,
    pub md5: StringValue,
    pub status: StringValue,
    pub max_prefix: Int64Value,
}

impl BgpConfigModel {
    /// `md5` is write-only on the API side, so the known value is carried over.
    fn from_api(config: &BgpConfig, md5: &StringValue) -> Self {
        Self {
            deployment_type: config.deployment_type.clone().into(),
            asn: config.asn.into(),
            md5: match config.md5.as_deref().filter(|m| !m.is_empty()) {
                Some(m) => Value::new(m.to_string()),
                None if md5.is_known() => md5.clone(),
                None => Value::null(),
            },
            status: config.status.clone().into(),
            max_prefix: config.max_prefix.into(),
        }
    }

    fn to_request(&self) -> BgpConfigRequest {
        BgpConfigRequest {
            deployment_type: self.deployment_type.value_or_default(),
            asn: self.asn.value_or_default(),
            md5: self.md5.get().filter(|m| !m.is_empty()).cloned(),
        }
    }
}

/// A BGP config only counts once the API has assigned it an id.
pub(crate) fn parse_bgp_config(
    config: Option<&BgpConfig>,
    prior: &ListNestedObjectValueOf<BgpConfigModel>,
) -> ListNestedObjectValueOf<BgpConfigModel> {
    match config.filter(|c| c.id.as_deref().is_some_and(|id| !id.is_empty())) {
        Some(config) => {
            let md5 = prior
                .iter()
                .next()
                .map(|p| p.md5.clone())
                .unwrap_or_default();
            ListNestedObjectValueOf::from_ptr(BgpConfigModel::from_api(config, &md5))
        }
        None => ListNestedObjectValueOf::null(),
    }
}

/// Fetches a project and its BGP config. A failed BGP lookup is not fatal.
pub(crate) async fn fetch_project(
    client: &Client,
    id: &str,
) -> Result<(Project, Option<BgpConfig>), ApiError> {
    let project = client.metal().projects().get(id).await?;
    let bgp_config = fetch_bgp_config(client, &project.id).await;
    Ok((project, bgp_config))
}

pub(crate) async fn fetch_bgp_config(client: &Client, project_id: &str) -> Option<BgpConfig> {
    match client.metal().projects().get_bgp_config(project_id).await {
        Ok(config) => config,
        Err(e) => {
            tracing::debug!(
                "Ignoring BGP config lookup failure for project {}: {}",
                project_id,
                e
            );
            None
        }
    }
}

fn same_id(a: &str, b: &str) -> bool {
    a.trim_matches('"').eq_ignore_ascii_case(b.trim_matches('"'))
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectResourceModel {
    pub id: StringValue,
    pub name: StringValue,
    pub created: StringValue,
    pub updated: StringValue,
    pub backend_transfer: BoolValue,
    pub payment_method_id: StringValue,
    pub organization_id: StringValue,
    pub bgp_config: ListNestedObjectValueOf<BgpConfigModel>,
}

impl ProjectResourceModel {
    pub fn parse(&mut self, project: &Project, bgp_config: Option<&BgpConfig>) {
        self.id = Value::new(project.id.clone());
        self.name = Value::new(project.name.clone());
        self.created = project.created_at.clone().into();
        self.updated = project.updated_at.clone().into();
        self.backend_transfer = Value::new(project.backend_transfer_enabled);
        if let Some(organization_id) = project.organization_id() {
            self.organization_id = Value::new(organization_id.to_string());
        }

        // keep the configured spelling when only the case differs
        match project.payment_method_id() {
            Some(id) if self.payment_method_id.is_known()
                && same_id(self.payment_method_id.as_str(), id) => {}
            Some(id) => self.payment_method_id = Value::new(id.to_string()),
            None => self.payment_method_id = Value::new(String::new()),
        }

        self.bgp_config = parse_bgp_config(bgp_config, &self.bgp_config);
    }

    fn update_request(&self, state: &Self) -> ProjectUpdateRequest {
        let mut request = ProjectUpdateRequest::default();
        if self.name.is_known() && self.name != state.name {
            request.name = self.name.get().cloned();
        }
        if self.payment_method_id.is_known()
            && !same_id(self.payment_method_id.as_str(), state.payment_method_id.as_str())
        {
            request.payment_method_id = self.payment_method_id.get().cloned();
        }
        if self.backend_transfer.is_known() && self.backend_transfer != state.backend_transfer {
            request.backend_transfer_enabled = self.backend_transfer.get().copied();
        }
        request
    }
}

fn bgp_removal_error(prior: &BgpConfigModel) -> Diagnostic {
    Diagnostic::error(
        "BGP Config can not be removed from a project",
        format!(
            "BGP Config can not be removed from a project, please add back\n\
             bgp_config {{\n  deployment_type = \"{}\"\n  md5 = \"{}\"\n  asn = {}\n}}",
            prior.deployment_type.as_str(),
            prior.md5.as_str(),
            prior.asn.value_or_default()
        ),
    )
}

pub(crate) fn bgp_config_attributes(computed_only: bool) -> Vec<Attribute> {
    let input = |builder: AttributeBuilder, required: bool| match (computed_only, required) {
        (true, _) => builder.computed(),
        (false, true) => builder.required(),
        (false, false) => builder.optional(),
    };

    vec![
        input(
            AttributeBuilder::new("deployment_type", AttributeType::String)
                .description("The BGP deployment type, either 'local' or 'global'")
                .validator(StringOneOf::create(&["local", "global"])),
            true,
        )
        .build(),
        input(
            AttributeBuilder::new("asn", AttributeType::Number)
                .description("Autonomous System Number for local BGP deployment"),
            true,
        )
        .build(),
        input(
            AttributeBuilder::new("md5", AttributeType::String)
                .description("Password for BGP session in plaintext (not a checksum)")
                .sensitive(),
            false,
        )
        .build(),
        AttributeBuilder::new("status", AttributeType::String)
            .description("Status of BGP configuration in the project")
            .computed()
            .build(),
        AttributeBuilder::new("max_prefix", AttributeType::Number)
            .description("The maximum number of route filters allowed per server")
            .computed()
            .build(),
    ]
}

#[derive(Default)]
pub struct ProjectResource {
    provider_data: Option<EquinixProviderData>,
}

impl ProjectResource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_into(
        client: &Client,
        model: &mut ProjectResourceModel,
    ) -> Result<bool, ApiError> {
        let id = model.id.value_or_default();
        match fetch_project(client, &id).await {
            Ok((project, bgp_config)) => {
                model.parse(&project, bgp_config.as_ref());
                Ok(true)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Resource for ProjectResource {
    fn type_name(&self) -> &str {
        "equinix_metal_project"
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
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Provides an Equinix Metal project resource")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The unique identifier of the resource")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the project. The maximum length is 80 characters")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("The timestamp for when the project was created")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
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
                    .description("Enable or disable Backend Transfer, default is false")
                    .optional()
                    .computed()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("payment_method_id", AttributeType::String)
                    .description(
                        "The UUID of payment method for this project. The payment method and the project need to belong to the same organization (passed with organization_id, or default)",
                    )
                    .optional()
                    .computed()
                    .validator(IsUuid::or_empty())
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_id", AttributeType::String)
                    .description("The UUID of organization under which the project is created")
                    .optional()
                    .computed()
                    .validator(IsUuid::create())
                    .plan_modifier(RequiresReplace::create())
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "bgp_config",
                    NestedType::list(bgp_config_attributes(false)),
                )
                .description("Optional BGP settings")
                .optional()
                .validator(ListLength::at_most(1))
                .build(),
            )
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

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
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

        let mut plan: ProjectResourceModel = match request.planned_state.as_model() {
            Ok(plan) => plan,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read plan", e.to_string()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let projects = provider_data.client.metal().projects();
        let create_request = ProjectCreateRequest {
            name: plan.name.value_or_default(),
            organization_id: plan
                .organization_id
                .get()
                .filter(|id| !id.is_empty())
                .cloned(),
        };
        let project = match projects.create(&create_request).await {
            Ok(project) => project,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Error creating project", e.to_string()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };
        tracing::info!("Created Metal project {}", project.id);
        plan.id = Value::new(project.id.clone());

        if let Some(bgp_config) = plan.bgp_config.iter().next() {
            if let Err(e) = projects
                .request_bgp_config(&project.id, &bgp_config.to_request())
                .await
            {
                diagnostics.push(Diagnostic::error(
                    format!("Error requesting BGP config for project {}", project.id),
                    e.to_string(),
                ));
            }
        }

        if !diagnostics.is_empty() {
            // the project exists; store what we have so it is not orphaned
            plan.parse(&project, None);
            return CreateResourceResponse {
                new_state: DynamicValue::from_model(&plan).unwrap_or(request.planned_state),
                diagnostics,
            };
        }

        if plan.backend_transfer.value_or_default() {
            let update = ProjectUpdateRequest {
                backend_transfer_enabled: Some(true),
                ..Default::default()
            };
            if let Err(e) = projects.update(&project.id, &update).await {
                diagnostics.push(Diagnostic::error(
                    format!("Error updating project {}", project.id),
                    e.to_string(),
                ));
                plan.parse(&project, None);
                return CreateResourceResponse {
                    new_state: DynamicValue::from_model(&plan).unwrap_or(request.planned_state),
                    diagnostics,
                };
            }
        }

        match Self::read_into(&provider_data.client, &mut plan).await {
            Ok(true) => {}
            Ok(false) => {
                diagnostics.push(Diagnostic::error(
                    format!("Error reading project {}", project.id),
                    "Project was not found right after it was created",
                ));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Error reading project {}", project.id),
                    e.to_string(),
                ));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        }

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

        let mut state: ProjectResourceModel = match request.current_state.as_model() {
            Ok(state) => state,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read state", e.to_string()));
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        match Self::read_into(&provider_data.client, &mut state).await {
            Ok(true) => match DynamicValue::from_model(&state) {
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
            },
            Ok(false) => {
                tracing::warn!(
                    "Project {} not found, removing from state",
                    state.id.as_str()
                );
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Error reading project {}", state.id.as_str()),
                    e.to_string(),
                ));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
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
            .as_model::<ProjectResourceModel>()
            .and_then(|plan| Ok((plan, request.prior_state.as_model::<ProjectResourceModel>()?)));
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
        let projects = provider_data.client.metal().projects();

        if plan.bgp_config != state.bgp_config {
            match (plan.bgp_config.iter().next(), state.bgp_config.iter().next()) {
                (Some(bgp_config), _) => {
                    if let Err(e) = projects
                        .request_bgp_config(&id, &bgp_config.to_request())
                        .await
                    {
                        diagnostics.push(Diagnostic::error(
                            format!("Error requesting BGP config for project {}", id),
                            e.to_string(),
                        ));
                        return UpdateResourceResponse {
                            new_state: request.prior_state,
                            diagnostics,
                        };
                    }
                }
                (None, Some(prior)) => {
                    diagnostics.push(bgp_removal_error(prior));
                    return UpdateResourceResponse {
                        new_state: request.prior_state,
                        diagnostics,
                    };
                }
                (None, None) => {}
            }
        }

        let update = plan.update_request(&state);
        if !update.is_empty() {
            if let Err(e) = projects.update(&id, &update).await {
                diagnostics.push(Diagnostic::error(
                    format!("Error updating project {}", id),
                    e.to_string(),
                ));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        }

        plan.id = Value::new(id.clone());
        if let Err(e) = Self::read_into(&provider_data.client, &mut plan).await {
            diagnostics.push(Diagnostic::error(
                format!("Error reading project {}", id),
                e.to_string(),
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
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

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return DeleteResourceResponse { diagnostics };
            }
        };

        let state: ProjectResourceModel = match request.prior_state.as_model() {
            Ok(state) => state,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read state", e.to_string()));
                return DeleteResourceResponse { diagnostics };
            }
        };

        let id = state.id.value_or_default();
        match provider_data.client.metal().projects().delete(&id).await {
            Ok(()) => tracing::info!("Deleted Metal project {}", id),
            Err(e) if e.is_gone() => {
                tracing::debug!("Metal project {} already gone: {}", id, e);
            }
            Err(e) => diagnostics.push(Diagnostic::error(
                format!("Error deleting project {}", id),
                e.to_string(),
            )),
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for ProjectResource {
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

#[async_trait]
impl ResourceWithModifyPlan for ProjectResource {
    /// Case-only differences in the id attributes are not changes; the prior
    /// value is planned instead so `organization_id` does not force a replace.
    async fn modify_plan(&self, ctx: Context, mut request: ModifyPlanRequest) -> ModifyPlanResponse {
        if !request.prior_state.is_null() && !request.proposed_new_state.is_null() {
            for name in ["organization_id", "payment_method_id"] {
                let path = AttributePath::new(name);
                let prior = request.prior_state.get_string(&path).ok();
                let proposed = request.proposed_new_state.get_string(&path).ok();
                if let (Some(prior), Some(proposed)) = (prior, proposed) {
                    if prior != proposed && same_id(&prior, &proposed) {
                        if let Err(e) = request.proposed_new_state.set_string(&path, prior) {
                            tracing::debug!("Could not keep prior {}: {}", name, e);
                        }
                    }
                }
            }
        }

        let schema = self.schema(ctx, ResourceSchemaRequest).await.schema;
        ModifyPlanResponse::from_schema(&schema, &request)
    }
}

#[async_trait]
impl ResourceWithImportState for ProjectResource {
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };
        tfplug::import_state_passthrough_id(AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[cfg(test)]
#[path = "./resource_project_test.rs"]
mod resource_project_test;
