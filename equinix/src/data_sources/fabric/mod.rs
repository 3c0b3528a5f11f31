//! Equinix Fabric data sources

pub mod data_source_route_aggregation_rules;
pub mod data_source_routes;
pub mod data_source_stream_alert_rules;

pub use data_source_route_aggregation_rules::{
    RouteAggregationRuleDataSource, RouteAggregationRulesDataSource,
};
pub use data_source_routes::ConnectionRoutesDataSource;
pub use data_source_stream_alert_rules::{StreamAlertRuleDataSource, StreamAlertRulesDataSource};

use crate::api::common::Pagination;
use serde::{Deserialize, Serialize};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedType};
use tfplug::typed::{Int32Value, ObjectValueOf, StringValue, Value};

/// `pagination` block of the list data sources
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationModel {
    pub offset: Int32Value,
    pub limit: Int32Value,
    pub total: Int32Value,
    pub next: StringValue,
    pub previous: StringValue,
}

impl PaginationModel {
    /// Requested (offset, limit); unset values are left to the API.
    pub fn requested(pagination: &ObjectValueOf<PaginationModel>) -> (Option<i32>, Option<i32>) {
        match pagination.to_ptr() {
            Some(p) => (p.offset.get().copied(), p.limit.get().copied()),
            None => (None, None),
        }
    }
}

impl From<&Pagination> for PaginationModel {
    fn from(pagination: &Pagination) -> Self {
        Self {
            offset: Value::new(pagination.offset),
            limit: Value::new(pagination.limit),
            total: Value::new(pagination.total),
            next: Value::new(pagination.next.clone().unwrap_or_default()),
            previous: Value::new(pagination.previous.clone().unwrap_or_default()),
        }
    }
}

pub(crate) fn pagination_attribute(description: &str, required: bool, total: &str) -> Attribute {
    let attributes = vec![
        AttributeBuilder::new("offset", AttributeType::Number)
            .description("Index of the first item returned in the response. The default is 0")
            .optional()
            .computed()
            .build(),
        AttributeBuilder::new("limit", AttributeType::Number)
            .description(
                "Maximum number of search results returned per page. Number must be between 1 and 100, and the default is 20",
            )
            .optional()
            .computed()
            .build(),
        AttributeBuilder::new("total", AttributeType::Number)
            .description(total)
            .computed()
            .build(),
        AttributeBuilder::new("next", AttributeType::String)
            .description("The URL relative to the next item in the response")
            .computed()
            .build(),
        AttributeBuilder::new("previous", AttributeType::String)
            .description("The URL relative to the previous item in the response")
            .computed()
            .build(),
    ];

    let builder = AttributeBuilder::nested("pagination", NestedType::single(attributes))
        .description(description);
    if required {
        builder.required().build()
    } else {
        builder.optional().computed().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_from_api() {
        let model = PaginationModel::from(&Pagination {
            offset: 20,
            limit: 10,
            total: 42,
            next: Some("/next".to_string()),
            previous: None,
        });
        assert_eq!(model.offset, Value::new(20));
        assert_eq!(model.total, Value::new(42));
        assert_eq!(model.next.as_str(), "/next");
        assert_eq!(model.previous.as_str(), "");
    }

    #[test]
    fn test_requested_pagination() {
        assert_eq!(PaginationModel::requested(&ObjectValueOf::null()), (None, None));

        let pagination = ObjectValueOf::new(PaginationModel {
            limit: Value::new(5),
            offset: Value::unknown(),
            ..Default::default()
        });
        assert_eq!(PaginationModel::requested(&pagination), (None, Some(5)));
    }

    #[test]
    fn test_pagination_attribute() {
        let attr = pagination_attribute("Pagination details", true, "Total");
        assert!(attr.required);
        let attr = pagination_attribute("Pagination details", false, "Total");
        assert!(attr.optional && attr.computed);
    }
}
