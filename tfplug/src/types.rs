//! Core value types for tfplug
//!
//! `Dynamic` is the untyped Terraform value tree handed to resources and data
//! sources. Typed access goes through `DynamicValue` accessors or, for whole
//! models, through the adapters in [`crate::typed`].

use crate::error::{Result, TfplugError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Key of the single-entry object `{"$unknown": true}` that carries an
/// unknown value across a JSON boundary. Known strings are never reinterpreted.
pub const UNKNOWN_KEY: &str = "$unknown";

/// JSON stand-in for an unknown value
pub fn unknown_json() -> serde_json::Value {
    serde_json::json!({ UNKNOWN_KEY: true })
}

/// Matches only the exact `{"$unknown": true}` object.
pub fn is_unknown_json(value: &serde_json::Value) -> bool {
    matches!(value, serde_json::Value::Object(fields)
        if fields.len() == 1 && fields.get(UNKNOWN_KEY) == Some(&serde_json::Value::Bool(true)))
}

pub(crate) fn serialize_unknown<S: serde::Serializer>(
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(UNKNOWN_KEY, &true)?;
    map.end()
}

/// Dynamic represents Terraform values that can be of any type
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Dynamic {
    #[default]
    Null,
    Bool(bool),
    /// All numbers are f64 to match Terraform
    Number(f64),
    String(String),
    List(Vec<Dynamic>),
    /// Objects and maps share this representation
    Map(HashMap<String, Dynamic>),
    /// Value not yet known (during planning)
    Unknown,
}

impl Dynamic {
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    /// True when neither this value nor anything nested inside it is unknown.
    pub fn is_fully_known(&self) -> bool {
        match self {
            Dynamic::Unknown => false,
            Dynamic::List(items) => items.iter().all(Dynamic::is_fully_known),
            Dynamic::Map(fields) => fields.values().all(Dynamic::is_fully_known),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Dynamic::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Dynamic]> {
        match self {
            Dynamic::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Dynamic>> {
        match self {
            Dynamic::Map(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown => "unknown",
        }
    }

    /// Converts into a JSON tree. Integral numbers become JSON integers so
    /// that integer model fields deserialize from them.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Dynamic::Null => Json::Null,
            Dynamic::Unknown => unknown_json(),
            Dynamic::Bool(b) => Json::Bool(*b),
            Dynamic::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    Json::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(Json::Number)
                        .unwrap_or(Json::Null)
                }
            }
            Dynamic::String(s) => Json::String(s.clone()),
            Dynamic::List(items) => Json::Array(items.iter().map(Dynamic::to_json).collect()),
            Dynamic::Map(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        if is_unknown_json(&value) {
            return Dynamic::Unknown;
        }
        match value {
            Json::Null => Dynamic::Null,
            Json::Bool(b) => Dynamic::Bool(b),
            Json::Number(n) => Dynamic::Number(n.as_f64().unwrap_or_default()),
            Json::String(s) => Dynamic::String(s),
            Json::Array(items) => Dynamic::List(items.into_iter().map(Dynamic::from_json).collect()),
            Json::Object(fields) => Dynamic::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Dynamic::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Dynamic {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Dynamic::Null => serializer.serialize_unit(),
            Dynamic::Bool(b) => serializer.serialize_bool(*b),
            Dynamic::Number(n) => serializer.serialize_f64(*n),
            Dynamic::String(s) => serializer.serialize_str(s),
            Dynamic::List(l) => l.serialize(serializer),
            Dynamic::Map(m) => m.serialize(serializer),
            Dynamic::Unknown => serialize_unknown(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Dynamic::from_json)
    }
}

/// DynamicValue wraps a Dynamic tree and provides path based access
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self {
            value: Dynamic::Null,
        }
    }

    pub fn unknown() -> Self {
        Self {
            value: Dynamic::Unknown,
        }
    }

    /// An empty object, the usual starting point for building state
    pub fn object() -> Self {
        Self {
            value: Dynamic::Map(HashMap::new()),
        }
    }

    pub fn encode_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.value)
            .map_err(|e| TfplugError::EncodingError(format!("json encoding failed: {}", e)))
    }

    pub fn decode_json(data: &[u8]) -> Result<Self> {
        let value = serde_json::from_slice(data)
            .map_err(|e| TfplugError::DecodingError(format!("json decoding failed: {}", e)))?;
        Ok(Self { value })
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.value.is_unknown()
    }

    /// Returns the value at `path`, or None when any step is missing.
    pub fn get(&self, path: &AttributePath) -> Option<&Dynamic> {
        let mut current = &self.value;
        for step in &path.steps {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => m.get(name)?,
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                    l.get(usize::try_from(*idx).ok()?)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        self.typed(path, "string", |v| v.as_str().map(str::to_string))
    }

    pub fn get_number(&self, path: &AttributePath) -> Result<f64> {
        self.typed(path, "number", Dynamic::as_number)
    }

    pub fn get_bool(&self, path: &AttributePath) -> Result<bool> {
        self.typed(path, "bool", Dynamic::as_bool)
    }

    pub fn get_list(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        self.typed(path, "list", |v| v.as_list().map(<[Dynamic]>::to_vec))
    }

    pub fn get_map(&self, path: &AttributePath) -> Result<HashMap<String, Dynamic>> {
        self.typed(path, "map", |v| v.as_map().cloned())
    }

    pub fn set_string(&mut self, path: &AttributePath, value: impl Into<String>) -> Result<()> {
        self.set(path, Dynamic::String(value.into()))
    }

    pub fn set_number(&mut self, path: &AttributePath, value: f64) -> Result<()> {
        self.set(path, Dynamic::Number(value))
    }

    pub fn set_bool(&mut self, path: &AttributePath, value: bool) -> Result<()> {
        self.set(path, Dynamic::Bool(value))
    }

    pub fn set_list(&mut self, path: &AttributePath, value: Vec<Dynamic>) -> Result<()> {
        self.set(path, Dynamic::List(value))
    }

    pub fn mark_unknown(&mut self, path: &AttributePath) -> Result<()> {
        self.set(path, Dynamic::Unknown)
    }

    /// Writes `new_value` at `path`, creating intermediate objects as needed.
    pub fn set(&mut self, path: &AttributePath, new_value: Dynamic) -> Result<()> {
        let Some((last, parents)) = path.steps.split_last() else {
            self.value = new_value;
            return Ok(());
        };

        if !matches!(self.value, Dynamic::Map(_)) {
            self.value = Dynamic::Map(HashMap::new());
        }

        let mut current = &mut self.value;
        for step in parents {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                    let slot = m.entry(name.clone()).or_insert(Dynamic::Null);
                    if slot.is_null() || slot.is_unknown() {
                        *slot = Dynamic::Map(HashMap::new());
                    }
                    slot
                }
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => usize::try_from(*idx)
                    .ok()
                    .and_then(|i| l.get_mut(i))
                    .ok_or_else(|| TfplugError::AttributeNotFound(path.clone()))?,
                _ => return Err(TfplugError::AttributeNotFound(path.clone())),
            };
        }

        match (current, last) {
            (Dynamic::Map(m), AttributePathStep::AttributeName(name))
            | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                m.insert(name.clone(), new_value);
                Ok(())
            }
            (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                let slot = usize::try_from(*idx)
                    .ok()
                    .and_then(|i| l.get_mut(i))
                    .ok_or_else(|| TfplugError::AttributeNotFound(path.clone()))?;
                *slot = new_value;
                Ok(())
            }
            _ => Err(TfplugError::AttributeNotFound(path.clone())),
        }
    }

    fn typed<T>(
        &self,
        path: &AttributePath,
        expected: &str,
        extract: impl FnOnce(&Dynamic) -> Option<T>,
    ) -> Result<T> {
        let value = self
            .get(path)
            .ok_or_else(|| TfplugError::AttributeNotFound(path.clone()))?;
        extract(value).ok_or_else(|| TfplugError::TypeMismatch {
            path: path.clone(),
            expected: expected.to_string(),
            actual: value.type_name().to_string(),
        })
    }
}

/// AttributePath represents a path to an attribute within a DynamicValue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![AttributePathStep::AttributeName(name.to_string())],
        }
    }

    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps
            .push(AttributePathStep::AttributeName(name.to_string()));
        self
    }

    pub fn index(mut self, idx: i64) -> Self {
        self.steps.push(AttributePathStep::ElementKeyInt(idx));
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.steps
            .push(AttributePathStep::ElementKeyString(key.to_string()));
        self
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                AttributePathStep::AttributeName(name) if i == 0 => write!(f, "{}", name)?,
                AttributePathStep::AttributeName(name) => write!(f, ".{}", name)?,
                AttributePathStep::ElementKeyString(key) => write!(f, "[{:?}]", key)?,
                AttributePathStep::ElementKeyInt(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

/// Individual step in an AttributePath
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributePathStep {
    AttributeName(String),
    ElementKeyString(String),
    ElementKeyInt(i64),
}

/// Diagnostic represents a warning or error from the provider
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// Convenience queries over a diagnostics list
pub trait Diagnostics {
    fn has_error(&self) -> bool;
    fn errors(&self) -> Vec<&Diagnostic>;
    fn warnings(&self) -> Vec<&Diagnostic>;
}

impl Diagnostics for [Diagnostic] {
    fn has_error(&self) -> bool {
        self.iter().any(Diagnostic::is_error)
    }

    fn errors(&self) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.is_error()).collect()
    }

    fn warnings(&self) -> Vec<&Diagnostic> {
        self.iter().filter(|d| !d.is_error()).collect()
    }
}

/// ServerCapabilities indicates provider capabilities
#[derive(Debug, Clone, Default)]
pub struct ServerCapabilities {
    pub plan_destroy: bool,
    pub get_provider_schema_optional: bool,
    pub move_resource_state: bool,
}

/// ClientCapabilities indicates Terraform client capabilities
#[derive(Debug, Clone, Default)]
pub struct ClientCapabilities {
    pub deferral_allowed: bool,
    pub write_only_attributes_allowed: bool,
}

pub type Config = DynamicValue;

pub type State = DynamicValue;
