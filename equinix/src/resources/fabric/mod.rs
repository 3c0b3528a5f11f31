//! Equinix Fabric resources

pub mod resource_port;
pub mod resource_route_aggregation_rule;
pub mod resource_stream_alert_rule;

pub use resource_port::PortResource;
pub use resource_route_aggregation_rule::RouteAggregationRuleResource;
pub use resource_stream_alert_rule::StreamAlertRuleResource;

use crate::api::common::Changelog;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tfplug::retry::StateChangeConf;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedType};
use tfplug::typed::StringValue;

/// Polling parameters of one Fabric waiter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaiterSettings {
    pub pending: &'static [&'static str],
    pub target: &'static [&'static str],
    pub delay: Duration,
    pub min_timeout: Duration,
    /// None keeps the waiter default
    pub not_found_checks: Option<u32>,
}

impl WaiterSettings {
    pub fn apply<F>(&self, conf: StateChangeConf<F>) -> StateChangeConf<F> {
        let conf = conf
            .pending(self.pending.iter().copied())
            .target(self.target.iter().copied())
            .delay(self.delay)
            .min_timeout(self.min_timeout);
        match self.not_found_checks {
            Some(checks) => conf.not_found_checks(checks),
            None => conf,
        }
    }
}

/// `change_log` block carried by every Fabric object
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeLogModel {
    pub created_by: StringValue,
    pub created_by_full_name: StringValue,
    pub created_by_email: StringValue,
    pub created_date_time: StringValue,
    pub updated_by: StringValue,
    pub updated_by_full_name: StringValue,
    pub updated_by_email: StringValue,
    pub updated_date_time: StringValue,
    pub deleted_by: StringValue,
    pub deleted_by_full_name: StringValue,
    pub deleted_by_email: StringValue,
    pub deleted_date_time: StringValue,
}

impl From<&Changelog> for ChangeLogModel {
    fn from(log: &Changelog) -> Self {
        Self {
            created_by: log.created_by.clone().into(),
            created_by_full_name: log.created_by_full_name.clone().into(),
            created_by_email: log.created_by_email.clone().into(),
            created_date_time: log.created_date_time.clone().into(),
            updated_by: log.updated_by.clone().into(),
            updated_by_full_name: log.updated_by_full_name.clone().into(),
            updated_by_email: log.updated_by_email.clone().into(),
            updated_date_time: log.updated_date_time.clone().into(),
            deleted_by: log.deleted_by.clone().into(),
            deleted_by_full_name: log.deleted_by_full_name.clone().into(),
            deleted_by_email: log.deleted_by_email.clone().into(),
            deleted_date_time: log.deleted_date_time.clone().into(),
        }
    }
}

/// Computed `change_log` attribute; `noun` ends up in the descriptions.
pub(crate) fn change_log_attribute(noun: &str) -> Attribute {
    let fields = [
        ("created_by", "User name of creator of the"),
        ("created_by_full_name", "Legal name of creator of the"),
        ("created_by_email", "Email of creator of the"),
        ("created_date_time", "Creation time of the"),
        ("updated_by", "User name of last updater of the"),
        ("updated_by_full_name", "Legal name of last updater of the"),
        ("updated_by_email", "Email of last updater of the"),
        ("updated_date_time", "Last update time of the"),
        ("deleted_by", "User name of deleter of the"),
        ("deleted_by_full_name", "Legal name of deleter of the"),
        ("deleted_by_email", "Email of deleter of the"),
        ("deleted_date_time", "Deletion time of the"),
    ];
    let attributes = fields
        .into_iter()
        .map(|(name, prefix)| {
            AttributeBuilder::new(name, AttributeType::String)
                .description(&format!("{} {}", prefix, noun))
                .computed()
                .build()
        })
        .collect();

    AttributeBuilder::nested("change_log", NestedType::single(attributes))
        .description(&format!("Details of the last change on the {}", noun))
        .computed()
        .build()
}

/// Some(value) unless the API left it empty
pub(crate) fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
