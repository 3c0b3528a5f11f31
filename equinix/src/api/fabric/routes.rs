//! Connection route table search (advertised and received routes)

use serde::{Deserialize, Serialize};

use super::ListResponse;
use crate::api::client::{Client, Service};
use crate::api::common::Changelog;
use crate::api::error::ApiError;

/// Page size used when the caller leaves the limit at zero
pub const DEFAULT_SEARCH_LIMIT: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDirection {
    Advertised,
    Received,
}

impl RouteDirection {
    fn path_segment(&self) -> &'static str {
        match self {
            RouteDirection::Advertised => "advertisedRoutes",
            RouteDirection::Received => "receivedRoutes",
        }
    }
}

impl std::fmt::Display for RouteDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteDirection::Advertised => write!(f, "advertised"),
            RouteDirection::Received => write!(f, "received"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteSearchRequest {
    pub filter: RouteFilters,
    pub pagination: RoutePagination,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<RouteSort>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteFilters {
    pub and: Vec<RouteFilterExpression>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteFilterExpression {
    pub property: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoutePagination {
    pub offset: i32,
    pub limit: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteSort {
    pub property: String,
    pub direction: String,
}

/// One route table entry of a connection
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionRoute {
    #[serde(rename = "type")]
    pub route_type: Option<String>,
    pub protocol_type: Option<String>,
    pub state: Option<String>,
    pub prefix: Option<String>,
    pub next_hop: Option<String>,
    #[serde(rename = "MED")]
    pub med: Option<i32>,
    pub local_preference: Option<i32>,
    pub as_path: Vec<String>,
    pub connection: Option<RouteConnection>,
    pub change_log: Option<Changelog>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RouteConnection {
    pub href: Option<String>,
    pub name: Option<String>,
    pub uuid: Option<String>,
}

/// Route search API scoped to one connection
pub struct RoutesApi<'a> {
    client: &'a Client,
    connection_id: String,
}

impl<'a> RoutesApi<'a> {
    pub fn new(client: &'a Client, connection_id: &str) -> Self {
        Self {
            client,
            connection_id: connection_id.to_string(),
        }
    }

    /// POST /fabric/v4/connections/{connectionId}/{advertisedRoutes|receivedRoutes}/search
    pub async fn search(
        &self,
        direction: RouteDirection,
        request: &RouteSearchRequest,
    ) -> Result<ListResponse<ConnectionRoute>, ApiError> {
        let path = format!(
            "/fabric/v4/connections/{}/{}/search",
            self.connection_id,
            direction.path_segment()
        );
        tracing::debug!("Searching {} routes of connection {}", direction, self.connection_id);
        self.client.post(Service::Fabric, &path, request).await
    }
}
