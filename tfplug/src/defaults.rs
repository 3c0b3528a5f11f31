//! Default value providers for attributes
//!
//! Defaults are applied during planning when an attribute is absent from the
//! configuration.

use crate::schema::{Default, DefaultRequest, DefaultResponse};
use crate::types::{Dynamic, DynamicValue};

/// StaticDefault provides a fixed default value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Box<dyn Default> {
        Box::new(Self { value })
    }

    pub fn string(value: &str) -> Box<dyn Default> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Box<dyn Default> {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Box<dyn Default> {
        Self::create(Dynamic::Bool(value))
    }
}

impl Default for StaticDefault {
    fn description(&self) -> String {
        format!("value defaults to {}", self.value.to_json())
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: DynamicValue::new(self.value.clone()),
        }
    }
}
