//! Typed views over Terraform values
//!
//! Models are plain structs whose fields are [`Value`], [`ObjectValueOf`],
//! [`ListNestedObjectValueOf`] or [`ListValueOf`]. They move in and out of a
//! [`DynamicValue`] through serde, so a model only needs
//! `#[derive(Serialize, Deserialize)]` and `#[serde(default)]`.
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use tfplug::typed::{ObjectValueOf, StringValue};
//!
//! #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Location {
//!     metro_code: StringValue,
//! }
//!
//! #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
//! #[serde(default)]
//! struct PortModel {
//!     name: StringValue,
//!     location: ObjectValueOf<Location>,
//! }
//! ```

use crate::error::{Result, TfplugError};
use crate::types::{is_unknown_json, serialize_unknown, Dynamic, DynamicValue};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single Terraform value that may be null or not yet known.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<T> {
    Null,
    Unknown,
    Known(T),
}

pub type StringValue = Value<String>;
pub type BoolValue = Value<bool>;
pub type Int64Value = Value<i64>;
pub type Int32Value = Value<i32>;
pub type Float64Value = Value<f64>;

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Null
    }
}

impl<T> Value<T> {
    pub fn null() -> Self {
        Value::Null
    }

    pub fn unknown() -> Self {
        Value::Unknown
    }

    pub fn new(value: T) -> Self {
        Value::Known(value)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// True when the value is neither null nor unknown.
    pub fn is_known(&self) -> bool {
        matches!(self, Value::Known(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Value::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Value::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Value<U> {
        match self {
            Value::Null => Value::Null,
            Value::Unknown => Value::Unknown,
            Value::Known(v) => Value::Known(f(v)),
        }
    }
}

impl<T: Clone + Default> Value<T> {
    /// The known value, or the zero value for null and unknown.
    pub fn value_or_default(&self) -> T {
        self.get().cloned().unwrap_or_default()
    }
}

impl Value<String> {
    pub fn as_str(&self) -> &str {
        self.get().map(String::as_str).unwrap_or_default()
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Value::Known(v),
            None => Value::Null,
        }
    }
}

impl From<&str> for Value<String> {
    fn from(value: &str) -> Self {
        Value::Known(value.to_string())
    }
}

impl<T: Serialize> Serialize for Value<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Unknown => serialize_unknown(serializer),
            Value::Known(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Ok(Value::Null),
            json if is_unknown_json(&json) => Ok(Value::Unknown),
            other => serde_json::from_value(other)
                .map(Value::Known)
                .map_err(D::Error::custom),
        }
    }
}

/// A single nested object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: DeserializeOwned"))]
#[serde(transparent)]
pub struct ObjectValueOf<T>(Value<T>);

impl<T> Default for ObjectValueOf<T> {
    fn default() -> Self {
        Self(Value::Null)
    }
}

impl<T> ObjectValueOf<T> {
    pub fn null() -> Self {
        Self(Value::Null)
    }

    pub fn unknown() -> Self {
        Self(Value::Unknown)
    }

    pub fn new(value: T) -> Self {
        Self(Value::Known(value))
    }

    /// None becomes a null object.
    pub fn from_ptr(value: Option<T>) -> Self {
        Self(value.into())
    }

    /// The object when it is known.
    pub fn to_ptr(&self) -> Option<&T> {
        self.0.get()
    }

    pub fn into_inner(self) -> Option<T> {
        self.0.into_option()
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_unknown()
    }
}

/// A list of nested objects, usually a block with zero or one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: DeserializeOwned"))]
#[serde(transparent)]
pub struct ListNestedObjectValueOf<T>(Value<Vec<T>>);

impl<T> Default for ListNestedObjectValueOf<T> {
    fn default() -> Self {
        Self(Value::Null)
    }
}

impl<T> ListNestedObjectValueOf<T> {
    pub fn null() -> Self {
        Self(Value::Null)
    }

    pub fn unknown() -> Self {
        Self(Value::Unknown)
    }

    /// A one element list.
    pub fn from_ptr(value: T) -> Self {
        Self(Value::Known(vec![value]))
    }

    pub fn from_slice(values: Vec<T>) -> Self {
        Self(Value::Known(values))
    }

    pub fn from_value_slice(values: &[T]) -> Self
    where
        T: Clone,
    {
        Self(Value::Known(values.to_vec()))
    }

    /// The single element of the list. Null, unknown and empty lists give
    /// None; more than one element is an error.
    pub fn to_ptr(&self) -> Result<Option<&T>> {
        match self.to_slice() {
            [] => Ok(None),
            [only] => Ok(Some(only)),
            many => Err(TfplugError::TooManyElements(many.len())),
        }
    }

    /// Elements of a known list, empty otherwise.
    pub fn to_slice(&self) -> &[T] {
        self.0.get().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.to_slice().iter()
    }

    pub fn len(&self) -> usize {
        self.to_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_slice().is_empty()
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_unknown()
    }
}

/// A list of primitive values whose elements may individually be unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: DeserializeOwned"))]
#[serde(transparent)]
pub struct ListValueOf<T>(Value<Vec<Value<T>>>);

impl<T> Default for ListValueOf<T> {
    fn default() -> Self {
        Self(Value::Null)
    }
}

impl<T> ListValueOf<T> {
    pub fn null() -> Self {
        Self(Value::Null)
    }

    pub fn unknown() -> Self {
        Self(Value::Unknown)
    }

    pub fn from_values(values: impl IntoIterator<Item = T>) -> Self {
        Self(Value::Known(values.into_iter().map(Value::Known).collect()))
    }

    pub fn elements(&self) -> &[Value<T>] {
        self.0.get().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_unknown()
    }

    pub fn len(&self) -> usize {
        self.elements().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements().is_empty()
    }
}

impl<T: Clone> ListValueOf<T> {
    /// Known elements only.
    pub fn to_vec(&self) -> Vec<T> {
        self.elements()
            .iter()
            .filter_map(|v| v.get().cloned())
            .collect()
    }
}

/// Encodes a model into a Terraform value tree.
pub fn to_dynamic<T: Serialize>(model: &T) -> Result<DynamicValue> {
    let json = serde_json::to_value(model)
        .map_err(|e| TfplugError::EncodingError(format!("model encoding failed: {}", e)))?;
    Ok(DynamicValue::new(Dynamic::from_json(json)))
}

/// Decodes a Terraform value tree into a model.
pub fn from_dynamic<T: DeserializeOwned>(value: &DynamicValue) -> Result<T> {
    serde_json::from_value(value.value.to_json())
        .map_err(|e| TfplugError::DecodingError(format!("model decoding failed: {}", e)))
}

impl DynamicValue {
    pub fn as_model<T: DeserializeOwned>(&self) -> Result<T> {
        from_dynamic(self)
    }

    pub fn from_model<T: Serialize>(model: &T) -> Result<Self> {
        to_dynamic(model)
    }
}
