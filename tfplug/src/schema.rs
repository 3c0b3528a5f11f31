//! Schema types and builders for tfplug
//!
//! A [`Schema`] describes the attribute tree of a provider, resource or data
//! source. Besides describing, it drives two provider-side passes over
//! Terraform values: [`Schema::validate`] (required checks plus attribute
//! validators) and [`Schema::plan`] (defaults, computed values and plan
//! modifiers).

use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// AttributeType mirrors Terraform's type system
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(HashMap<String, AttributeType>),
}

impl AttributeType {
    /// Terraform's JSON encoding of a type, e.g. `["list","string"]`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeType::String => json!("string"),
            AttributeType::Number => json!("number"),
            AttributeType::Bool => json!("bool"),
            AttributeType::List(inner) => json!(["list", inner.to_json()]),
            AttributeType::Set(inner) => json!(["set", inner.to_json()]),
            AttributeType::Map(inner) => json!(["map", inner.to_json()]),
            AttributeType::Object(fields) => {
                let fields: BTreeMap<_, _> =
                    fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
                json!(["object", fields])
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub description: String,
    pub deprecated: bool,
}

#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub default: Option<Arc<dyn Default>>,
    pub nested_type: Option<NestedType>,
    pub deprecated: bool,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("validators", &self.validators.len())
            .field("plan_modifiers", &self.plan_modifiers.len())
            .field("default", &self.default.is_some())
            .field("nested_type", &self.nested_type)
            .finish()
    }
}

/// Nested attributes of a single object or a list of objects
#[derive(Debug, Clone)]
pub struct NestedType {
    pub attributes: Vec<Attribute>,
    pub nesting: ObjectNestingMode,
}

impl NestedType {
    pub fn single(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            nesting: ObjectNestingMode::Single,
        }
    }

    pub fn list(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            nesting: ObjectNestingMode::List,
        }
    }

    fn object_type(&self) -> AttributeType {
        AttributeType::Object(
            self.attributes
                .iter()
                .map(|a| (a.name.clone(), a.r#type.clone()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectNestingMode {
    Single,
    List,
}

/// Validator checks a configured attribute value
pub trait Validator: Send + Sync {
    fn description(&self) -> String;
    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse;
}

pub struct ValidatorRequest {
    pub config_value: DynamicValue,
    pub path: AttributePath,
    /// The whole configuration, for validators that compare siblings
    pub config: DynamicValue,
}

#[derive(Default)]
pub struct ValidatorResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// PlanModifier adjusts a planned attribute value
pub trait PlanModifier: Send + Sync {
    fn description(&self) -> String;
    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse;
}

pub struct PlanModifierRequest {
    pub config_value: DynamicValue,
    pub state_value: DynamicValue,
    pub plan_value: DynamicValue,
    pub path: AttributePath,
}

pub struct PlanModifierResponse {
    pub plan_value: DynamicValue,
    pub requires_replace: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Default supplies a value for an optional attribute missing from config
pub trait Default: Send + Sync {
    fn description(&self) -> String;
    fn default_value(&self, request: DefaultRequest) -> DefaultResponse;
}

pub struct DefaultRequest {
    pub path: AttributePath,
}

pub struct DefaultResponse {
    pub value: DynamicValue,
}

/// Result of [`Schema::plan`]
pub struct PlannedChange {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }

    /// Checks required attributes and runs attribute validators, descending
    /// into nested attributes.
    pub fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if config.is_null() || config.is_unknown() {
            return diagnostics;
        }
        validate_attributes(
            &self.block.attributes,
            &AttributePath::root(),
            config,
            &mut diagnostics,
        );
        diagnostics
    }

    /// Computes the planned state of the top level attributes.
    ///
    /// Unconfigured attributes receive their default; unconfigured computed
    /// attributes become unknown on create and keep their prior value on
    /// update. Plan modifiers run last.
    pub fn plan(
        &self,
        prior_state: &DynamicValue,
        proposed_new_state: &DynamicValue,
        config: &DynamicValue,
    ) -> PlannedChange {
        let mut planned_state = proposed_new_state.clone();
        let mut requires_replace = Vec::new();
        let mut diagnostics = Vec::new();

        if proposed_new_state.is_null() {
            return PlannedChange {
                planned_state,
                requires_replace,
                diagnostics,
            };
        }

        let creating = prior_state.is_null();
        for attr in &self.block.attributes {
            let path = AttributePath::new(&attr.name);
            let lookup = |dv: &DynamicValue| dv.get(&path).cloned().unwrap_or_default();

            let config_value = lookup(config);
            let state_value = lookup(prior_state);
            let mut plan_value = lookup(&planned_state);

            if config_value.is_null() {
                if let Some(default) = &attr.default {
                    plan_value = default
                        .default_value(DefaultRequest { path: path.clone() })
                        .value
                        .value;
                } else if attr.computed && plan_value.is_null() {
                    plan_value = if creating {
                        Dynamic::Unknown
                    } else {
                        state_value.clone()
                    };
                }
            }

            for modifier in &attr.plan_modifiers {
                let response = modifier.modify(PlanModifierRequest {
                    config_value: DynamicValue::new(config_value.clone()),
                    state_value: DynamicValue::new(state_value.clone()),
                    plan_value: DynamicValue::new(plan_value),
                    path: path.clone(),
                });
                plan_value = response.plan_value.value;
                diagnostics.extend(response.diagnostics);
                if response.requires_replace && !creating && !requires_replace.contains(&path) {
                    requires_replace.push(path.clone());
                }
            }

            if let Err(e) = planned_state.set(&path, plan_value) {
                diagnostics.push(
                    Diagnostic::error("Failed to plan attribute", e.to_string())
                        .with_attribute(path),
                );
            }
        }

        PlannedChange {
            planned_state,
            requires_replace,
            diagnostics,
        }
    }

    /// Schema document in the shape of `terraform providers schema -json`.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "version": self.version,
            "block": block_json(&self.block.attributes, &self.block.description, self.block.deprecated),
        })
    }
}

fn validate_attributes(
    attributes: &[Attribute],
    parent: &AttributePath,
    config: &DynamicValue,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for attr in attributes {
        let mut path = parent.clone();
        path.steps.push(crate::types::AttributePathStep::AttributeName(
            attr.name.clone(),
        ));
        let value = config.get(&path).cloned().unwrap_or_default();

        if value.is_null() {
            if attr.required {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!(
                            "The argument \"{}\" is required, but no definition was found.",
                            path
                        ),
                    )
                    .with_attribute(path),
                );
            }
            continue;
        }
        if value.is_unknown() {
            continue;
        }

        for validator in &attr.validators {
            let response = validator.validate(ValidatorRequest {
                config_value: DynamicValue::new(value.clone()),
                path: path.clone(),
                config: config.clone(),
            });
            diagnostics.extend(response.diagnostics);
        }

        if let Some(nested) = &attr.nested_type {
            match (nested.nesting, &value) {
                (ObjectNestingMode::Single, Dynamic::Map(_)) => {
                    validate_attributes(&nested.attributes, &path, config, diagnostics)
                }
                (ObjectNestingMode::List, Dynamic::List(items)) => {
                    for idx in 0..items.len() {
                        let element = path.clone().index(idx as i64);
                        validate_attributes(&nested.attributes, &element, config, diagnostics);
                    }
                }
                _ => {}
            }
        }
    }
}

fn block_json(attributes: &[Attribute], description: &str, deprecated: bool) -> serde_json::Value {
    let attrs: BTreeMap<_, _> = attributes
        .iter()
        .map(|a| (a.name.clone(), attribute_json(a)))
        .collect();
    json!({
        "attributes": attrs,
        "description": description,
        "deprecated": deprecated,
    })
}

fn attribute_json(attr: &Attribute) -> serde_json::Value {
    let mut value = json!({
        "description": attr.description,
        "required": attr.required,
        "optional": attr.optional,
        "computed": attr.computed,
        "sensitive": attr.sensitive,
        "deprecated": attr.deprecated,
    });
    match &attr.nested_type {
        Some(nested) => {
            let nesting = match nested.nesting {
                ObjectNestingMode::Single => "single",
                ObjectNestingMode::List => "list",
            };
            let inner: BTreeMap<_, _> = nested
                .attributes
                .iter()
                .map(|a| (a.name.clone(), attribute_json(a)))
                .collect();
            value["nested_type"] = json!({ "attributes": inner, "nesting_mode": nesting });
        }
        None => value["type"] = attr.r#type.to_json(),
    }
    value
}

/// AttributeBuilder provides a fluent API for building attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                validators: Vec::new(),
                plan_modifiers: Vec::new(),
                default: None,
                nested_type: None,
                deprecated: false,
            },
        }
    }

    /// Attribute holding a nested object or list of objects. The type is
    /// derived from the nested attributes.
    pub fn nested(name: &str, nested: NestedType) -> Self {
        let object = nested.object_type();
        let type_ = match nested.nesting {
            ObjectNestingMode::Single => object,
            ObjectNestingMode::List => AttributeType::List(Box::new(object)),
        };
        let mut builder = Self::new(name, type_);
        builder.attribute.nested_type = Some(nested);
        builder
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.attribute.validators.push(Arc::from(validator));
        self
    }

    pub fn plan_modifier(mut self, modifier: Box<dyn PlanModifier>) -> Self {
        self.attribute.plan_modifiers.push(Arc::from(modifier));
        self
    }

    pub fn default(mut self, default: Box<dyn Default>) -> Self {
        self.attribute.default = Some(Arc::from(default));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// SchemaBuilder provides a fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block {
                    attributes: Vec::new(),
                    description: String::new(),
                    deprecated: false,
                },
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn attributes(mut self, attrs: impl IntoIterator<Item = Attribute>) -> Self {
        self.schema.block.attributes.extend(attrs);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.schema.block.deprecated = true;
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
