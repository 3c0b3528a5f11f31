//! Built-in attribute validators
//!
//! Validators only see configured values: the schema walk skips null and
//! unknown values before calling them.

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::timeouts::parse_duration;
use crate::types::{AttributePath, Diagnostic, Dynamic};
use regex::Regex;

fn invalid(request: &ValidatorRequest, detail: String) -> ValidatorResponse {
    ValidatorResponse {
        diagnostics: vec![
            Diagnostic::error("Invalid Attribute Value", detail).with_attribute(request.path.clone()),
        ],
    }
}

fn string_value(request: &ValidatorRequest) -> Option<&str> {
    request.config_value.value.as_str()
}

pub struct StringLength {
    min: Option<usize>,
    max: Option<usize>,
}

impl StringLength {
    pub fn create(min: Option<usize>, max: Option<usize>) -> Box<dyn Validator> {
        Box::new(Self { min, max })
    }

    pub fn at_least(min: usize) -> Box<dyn Validator> {
        Self::create(Some(min), None)
    }
}

impl Validator for StringLength {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("string length must be between {} and {}", min, max),
            (Some(min), None) => format!("string length must be at least {}", min),
            (None, Some(max)) => format!("string length must be at most {}", max),
            (None, None) => "any string length".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(s) = string_value(&request) else {
            return ValidatorResponse::default();
        };
        let len = s.chars().count();
        let too_short = self.min.is_some_and(|min| len < min);
        let too_long = self.max.is_some_and(|max| len > max);
        if too_short || too_long {
            return invalid(
                &request,
                format!(
                    "Attribute {} {}, got: {}",
                    request.path,
                    self.description(),
                    len
                ),
            );
        }
        ValidatorResponse::default()
    }
}

pub struct StringPattern {
    pattern: Regex,
    message: String,
}

impl StringPattern {
    /// Fails when `pattern` is not a valid regular expression.
    pub fn create(pattern: &str, message: &str) -> Result<Box<dyn Validator>, regex::Error> {
        Ok(Box::new(Self {
            pattern: Regex::new(pattern)?,
            message: message.to_string(),
        }))
    }
}

impl Validator for StringPattern {
    fn description(&self) -> String {
        self.message.clone()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        match string_value(&request) {
            Some(s) if !self.pattern.is_match(s) => invalid(
                &request,
                format!("Attribute {} {}, got: {}", request.path, self.message, s),
            ),
            _ => ValidatorResponse::default(),
        }
    }
}

pub struct StringOneOf {
    values: Vec<String>,
    case_insensitive: bool,
}

impl StringOneOf {
    pub fn create(values: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            values: values.iter().map(|v| v.to_string()).collect(),
            case_insensitive: false,
        })
    }

    pub fn case_insensitive(values: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            values: values.iter().map(|v| v.to_string()).collect(),
            case_insensitive: true,
        })
    }
}

impl Validator for StringOneOf {
    fn description(&self) -> String {
        let quoted: Vec<_> = self.values.iter().map(|v| format!("{:?}", v)).collect();
        format!("value must be one of: [{}]", quoted.join(" "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(s) = string_value(&request) else {
            return ValidatorResponse::default();
        };
        let matched = self.values.iter().any(|v| {
            if self.case_insensitive {
                v.eq_ignore_ascii_case(s)
            } else {
                v == s
            }
        });
        if matched {
            return ValidatorResponse::default();
        }
        invalid(
            &request,
            format!(
                "Attribute {} {}, got: {:?}",
                request.path,
                self.description(),
                s
            ),
        )
    }
}

/// Accepts a UUID, optionally also the empty string.
pub struct IsUuid {
    allow_empty: bool,
}

impl IsUuid {
    pub fn create() -> Box<dyn Validator> {
        Box::new(Self { allow_empty: false })
    }

    pub fn or_empty() -> Box<dyn Validator> {
        Box::new(Self { allow_empty: true })
    }
}

impl Validator for IsUuid {
    fn description(&self) -> String {
        "value must be a valid UUID".to_string()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        match string_value(&request) {
            Some("") if self.allow_empty => ValidatorResponse::default(),
            Some(s) if uuid::Uuid::parse_str(s).is_err() => invalid(
                &request,
                format!("Attribute {} {}, got: {:?}", request.path, self.description(), s),
            ),
            _ => ValidatorResponse::default(),
        }
    }
}

pub struct NumberRange {
    min: Option<f64>,
    max: Option<f64>,
}

impl NumberRange {
    pub fn create(min: Option<f64>, max: Option<f64>) -> Box<dyn Validator> {
        Box::new(Self { min, max })
    }
}

impl Validator for NumberRange {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("value must be between {} and {}", min, max),
            (Some(min), None) => format!("value must be at least {}", min),
            (None, Some(max)) => format!("value must be at most {}", max),
            (None, None) => "any number".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(n) = request.config_value.value.as_number() else {
            return ValidatorResponse::default();
        };
        if self.min.is_some_and(|min| n < min) || self.max.is_some_and(|max| n > max) {
            return invalid(
                &request,
                format!("Attribute {} {}, got: {}", request.path, self.description(), n),
            );
        }
        ValidatorResponse::default()
    }
}

pub struct ListLength {
    min: Option<usize>,
    max: Option<usize>,
}

impl ListLength {
    pub fn create(min: Option<usize>, max: Option<usize>) -> Box<dyn Validator> {
        Box::new(Self { min, max })
    }

    pub fn at_most(max: usize) -> Box<dyn Validator> {
        Self::create(None, Some(max))
    }
}

impl Validator for ListLength {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("list must contain between {} and {} elements", min, max),
            (Some(min), None) => format!("list must contain at least {} elements", min),
            (None, Some(max)) => format!("list must contain at most {} elements", max),
            (None, None) => "any list size".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(items) = request.config_value.value.as_list() else {
            return ValidatorResponse::default();
        };
        let len = items.len();
        if self.min.is_some_and(|min| len < min) || self.max.is_some_and(|max| len > max) {
            return ValidatorResponse {
                diagnostics: vec![Diagnostic::error(
                    "Invalid Attribute Value",
                    format!("Attribute {} {}, got: {}", request.path, self.description(), len),
                )
                .with_attribute(request.path)],
            };
        }
        ValidatorResponse::default()
    }
}

/// Rejects configurations that also set any of the sibling attributes.
pub struct ConflictsWith {
    others: Vec<String>,
}

impl ConflictsWith {
    pub fn create(others: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            others: others.iter().map(|o| o.to_string()).collect(),
        })
    }
}

impl Validator for ConflictsWith {
    fn description(&self) -> String {
        format!("conflicts with: {}", self.others.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        let mut parent = request.path.clone();
        parent.steps.pop();

        for other in &self.others {
            let sibling = AttributePath {
                steps: parent.steps.clone(),
            }
            .attribute(other);
            let set = request
                .config
                .get(&sibling)
                .is_some_and(|v| !matches!(v, Dynamic::Null));
            if set {
                response.diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Combination",
                        format!(
                            "Attribute \"{}\" cannot be specified when \"{}\" is specified",
                            sibling, request.path
                        ),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
        }
        response
    }
}

/// Accepts strings such as `30s` or `1h30m`.
pub struct DurationString;

impl DurationString {
    pub fn create() -> Box<dyn Validator> {
        Box::new(Self)
    }
}

impl Validator for DurationString {
    fn description(&self) -> String {
        "value must be a duration such as \"30s\" or \"2h45m\"".to_string()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        match string_value(&request) {
            Some(s) if parse_duration(s).is_err() => invalid(
                &request,
                format!("Attribute {} {}, got: {:?}", request.path, self.description(), s),
            ),
            _ => ValidatorResponse::default(),
        }
    }
}
