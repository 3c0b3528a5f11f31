//! Stream alert rule API implementation

use serde::{Deserialize, Serialize};

use super::ListResponse;
use crate::api::client::{Client, Service};
use crate::api::common::{ApiQueryParams, Changelog};
use crate::api::error::ApiError;

/// Alert rule attached to a Fabric stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamAlertRule {
    #[serde(skip_serializing)]
    pub href: Option<String>,
    #[serde(skip_serializing)]
    pub uuid: Option<String>,
    #[serde(skip_serializing)]
    pub state: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_selector: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_selector: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_method: Option<DetectionMethod>,
    #[serde(skip_serializing)]
    pub change_log: Option<Changelog>,
}

/// Inclusion list used by both the resource and metric selectors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selector {
    pub include: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectionMethod {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub method_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_threshold: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_threshold: Option<String>,
}

/// Stream alert rules API scoped to one stream
pub struct StreamAlertRulesApi<'a> {
    client: &'a Client,
    stream_id: String,
}

impl<'a> StreamAlertRulesApi<'a> {
    pub fn new(client: &'a Client, stream_id: &str) -> Self {
        Self {
            client,
            stream_id: stream_id.to_string(),
        }
    }

    fn base_path(&self) -> String {
        format!("/fabric/v4/streams/{}/alertRules", self.stream_id)
    }

    /// POST /fabric/v4/streams/{streamId}/alertRules
    pub async fn create(&self, request: &StreamAlertRule) -> Result<StreamAlertRule, ApiError> {
        self.client
            .post(Service::Fabric, &self.base_path(), request)
            .await
    }

    /// GET /fabric/v4/streams/{streamId}/alertRules/{alertRuleId}
    pub async fn get(&self, id: &str) -> Result<StreamAlertRule, ApiError> {
        self.client
            .get(Service::Fabric, &format!("{}/{}", self.base_path(), id))
            .await
    }

    /// GET /fabric/v4/streams/{streamId}/alertRules?offset=&limit=
    pub async fn list(
        &self,
        offset: Option<i32>,
        limit: Option<i32>,
    ) -> Result<ListResponse<StreamAlertRule>, ApiError> {
        let query = ApiQueryParams::new()
            .add_optional("offset", offset)
            .add_optional("limit", limit);
        self.client
            .get(
                Service::Fabric,
                &format!("{}{}", self.base_path(), query.to_query_string()),
            )
            .await
    }

    /// PUT /fabric/v4/streams/{streamId}/alertRules/{alertRuleId}
    pub async fn update(
        &self,
        id: &str,
        request: &StreamAlertRule,
    ) -> Result<StreamAlertRule, ApiError> {
        self.client
            .put(Service::Fabric, &format!("{}/{}", self.base_path(), id), request)
            .await
    }

    /// DELETE /fabric/v4/streams/{streamId}/alertRules/{alertRuleId}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete::<serde_json::Value>(Service::Fabric, &format!("{}/{}", self.base_path(), id))
            .await
            .map(|_| ())
    }
}
