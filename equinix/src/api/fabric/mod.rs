//! Equinix Fabric v4 endpoints

pub mod ports;
pub mod route_aggregation_rules;
pub mod routes;
pub mod stream_alert_rules;

pub use ports::{Port, PortsApi};
pub use route_aggregation_rules::{RouteAggregationRule, RouteAggregationRulesApi};
pub use routes::{ConnectionRoute, RouteDirection, RouteSearchRequest, RoutesApi};
pub use stream_alert_rules::{StreamAlertRule, StreamAlertRulesApi};

use crate::api::Client;
use serde::Deserialize;

use super::common::Pagination;

/// Paged list returned by Fabric GET-all and search endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

pub struct FabricApi<'a> {
    client: &'a Client,
}

impl<'a> FabricApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn ports(&self) -> PortsApi<'a> {
        PortsApi::new(self.client)
    }

    pub fn stream_alert_rules(&self, stream_id: &str) -> StreamAlertRulesApi<'a> {
        StreamAlertRulesApi::new(self.client, stream_id)
    }

    pub fn route_aggregation_rules(&self, route_aggregation_id: &str) -> RouteAggregationRulesApi<'a> {
        RouteAggregationRulesApi::new(self.client, route_aggregation_id)
    }

    pub fn routes(&self, connection_id: &str) -> RoutesApi<'a> {
        RoutesApi::new(self.client, connection_id)
    }
}
