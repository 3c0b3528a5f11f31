//! Resource implementations

pub mod fabric;
pub mod metal;

pub use fabric::{PortResource, RouteAggregationRuleResource, StreamAlertRuleResource};
pub use metal::ProjectResource;

use tfplug::timeouts::Timeouts;
use tfplug::typed::ObjectValueOf;

/// Configured operation timeouts, or all defaults when the block is absent.
pub(crate) fn timeouts_of(timeouts: &ObjectValueOf<Timeouts>) -> Timeouts {
    timeouts.to_ptr().cloned().unwrap_or_default()
}
