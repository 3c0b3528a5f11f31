//! Route aggregation rule API implementation

use serde::{Deserialize, Serialize};

use super::ListResponse;
use crate::api::client::{Client, Service};
use crate::api::common::{ApiQueryParams, Changelog, PatchOperation};
use crate::api::error::ApiError;

/// Fabric error code returned when a rule no longer exists
pub const RULE_NOT_FOUND_CODE: &str = "EQ-3044402";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteAggregationRule {
    #[serde(skip_serializing)]
    pub href: Option<String>,
    #[serde(rename = "type", skip_serializing)]
    pub rule_type: Option<String>,
    #[serde(skip_serializing)]
    pub uuid: Option<String>,
    #[serde(skip_serializing)]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing)]
    pub change: Option<RuleChange>,
    #[serde(skip_serializing)]
    pub change_log: Option<Changelog>,
}

/// Pending change that produced the current rule state
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuleChange {
    pub uuid: Option<String>,
    #[serde(rename = "type")]
    pub change_type: Option<String>,
    pub href: Option<String>,
}

/// Route aggregation rules API scoped to one route aggregation
pub struct RouteAggregationRulesApi<'a> {
    client: &'a Client,
    route_aggregation_id: String,
}

impl<'a> RouteAggregationRulesApi<'a> {
    pub fn new(client: &'a Client, route_aggregation_id: &str) -> Self {
        Self {
            client,
            route_aggregation_id: route_aggregation_id.to_string(),
        }
    }

    fn base_path(&self) -> String {
        format!(
            "/fabric/v4/routeAggregations/{}/routeAggregationRules",
            self.route_aggregation_id
        )
    }

    pub async fn create(
        &self,
        request: &RouteAggregationRule,
    ) -> Result<RouteAggregationRule, ApiError> {
        self.client
            .post(Service::Fabric, &self.base_path(), request)
            .await
    }

    pub async fn get(&self, id: &str) -> Result<RouteAggregationRule, ApiError> {
        self.client
            .get(Service::Fabric, &format!("{}/{}", self.base_path(), id))
            .await
    }

    pub async fn list(
        &self,
        offset: Option<i32>,
        limit: Option<i32>,
    ) -> Result<ListResponse<RouteAggregationRule>, ApiError> {
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

    /// Only the prefix can be patched
    pub async fn update_prefix(
        &self,
        id: &str,
        prefix: &str,
    ) -> Result<RouteAggregationRule, ApiError> {
        let operations = [PatchOperation::replace("/prefix", prefix)];
        self.client
            .patch(
                Service::Fabric,
                &format!("{}/{}", self.base_path(), id),
                &operations,
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete::<serde_json::Value>(Service::Fabric, &format!("{}/{}", self.base_path(), id))
            .await
            .map(|_| ())
    }
}
