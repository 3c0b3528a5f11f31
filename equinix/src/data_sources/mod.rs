//! Data source implementations

pub mod fabric;
pub mod metal;

pub use fabric::{
    ConnectionRoutesDataSource, RouteAggregationRuleDataSource, RouteAggregationRulesDataSource,
    StreamAlertRuleDataSource, StreamAlertRulesDataSource,
};
pub use metal::ProjectDataSource;
