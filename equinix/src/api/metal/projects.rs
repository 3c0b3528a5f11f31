//! Metal project and BGP config API implementation

use serde::{Deserialize, Serialize};

use crate::api::client::{Client, Service};
use crate::api::common::{href_basename, ApiQueryParams};
use crate::api::error::ApiError;

const PROJECTS_PATH: &str = "/metal/v1/projects";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub backend_transfer_enabled: bool,
    pub organization: Option<Href>,
    pub payment_method: Option<Href>,
    pub members: Vec<Href>,
}

impl Project {
    pub fn organization_id(&self) -> Option<&str> {
        self.organization
            .as_ref()
            .map(|o| href_basename(&o.href))
            .filter(|id| !id.is_empty())
    }

    pub fn payment_method_id(&self) -> Option<&str> {
        self.payment_method
            .as_ref()
            .map(|p| href_basename(&p.href))
            .filter(|id| !id.is_empty())
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members
            .iter()
            .map(|m| href_basename(&m.href).to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Href {
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectCreateRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_transfer_enabled: Option<bool>,
}

impl ProjectUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.payment_method_id.is_none()
            && self.backend_transfer_enabled.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BgpConfigRequest {
    pub deployment_type: String,
    pub asn: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BgpConfig {
    pub id: Option<String>,
    pub deployment_type: Option<String>,
    pub asn: Option<i64>,
    pub md5: Option<String>,
    pub status: Option<String>,
    pub max_prefix: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectList {
    projects: Vec<Project>,
}

/// Projects API for project operations
pub struct ProjectsApi<'a> {
    client: &'a Client,
}

impl<'a> ProjectsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: &ProjectCreateRequest) -> Result<Project, ApiError> {
        self.client.post(Service::Metal, PROJECTS_PATH, request).await
    }

    pub async fn get(&self, id: &str) -> Result<Project, ApiError> {
        self.client
            .get(Service::Metal, &format!("{}/{}", PROJECTS_PATH, id))
            .await
    }

    /// Projects whose name matches; the API filters server side
    pub async fn list_by_name(&self, name: &str) -> Result<Vec<Project>, ApiError> {
        let query = ApiQueryParams::new().add("name", name);
        let list: ProjectList = self
            .client
            .get(
                Service::Metal,
                &format!("{}{}", PROJECTS_PATH, query.to_query_string()),
            )
            .await?;
        Ok(list.projects)
    }

    pub async fn update(&self, id: &str, request: &ProjectUpdateRequest) -> Result<Project, ApiError> {
        self.client
            .put(Service::Metal, &format!("{}/{}", PROJECTS_PATH, id), request)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete::<serde_json::Value>(Service::Metal, &format!("{}/{}", PROJECTS_PATH, id))
            .await
            .map(|_| ())
    }

    /// POST /metal/v1/projects/{id}/bgp-configs
    pub async fn request_bgp_config(
        &self,
        project_id: &str,
        request: &BgpConfigRequest,
    ) -> Result<(), ApiError> {
        self.client
            .post::<serde_json::Value, _>(
                Service::Metal,
                &format!("{}/{}/bgp-configs", PROJECTS_PATH, project_id),
                request,
            )
            .await
            .map(|_| ())
    }

    /// GET /metal/v1/projects/{id}/bgp-config
    pub async fn get_bgp_config(&self, project_id: &str) -> Result<Option<BgpConfig>, ApiError> {
        self.client
            .get(
                Service::Metal,
                &format!("{}/{}/bgp-config", PROJECTS_PATH, project_id),
            )
            .await
    }
}
