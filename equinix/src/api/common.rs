use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of the error array Fabric returns on failure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FabricError {
    pub error_code: String,
    pub error_message: String,
    pub correlation_id: Option<String>,
    pub details: Option<String>,
    pub additional_info: Vec<FabricErrorInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FabricErrorInfo {
    pub property: Option<String>,
    pub reason: Option<String>,
}

/// Metal replies with `{"errors": [...]}` or `{"error": "..."}`
#[derive(Debug, Deserialize)]
struct MetalErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Decoded error body: Fabric error entries or plain Metal messages
#[derive(Debug)]
pub struct ApiErrorDetails {
    pub errors: Vec<FabricError>,
    pub metal_messages: Vec<String>,
}

impl fmt::Display for ApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error details: {}", self.messages().join("; "))
    }
}

impl std::error::Error for ApiErrorDetails {}

impl ApiErrorDetails {
    /// Decodes an error body from either API family.
    pub fn from_body(text: &str) -> Option<Self> {
        if let Ok(errors) = serde_json::from_str::<Vec<FabricError>>(text) {
            if !errors.is_empty() {
                return Some(Self {
                    errors,
                    metal_messages: vec![],
                });
            }
        }

        let metal = serde_json::from_str::<MetalErrorResponse>(text).ok()?;
        let mut messages = metal.errors;
        messages.extend(metal.error);
        if messages.is_empty() {
            return None;
        }
        Some(Self {
            errors: vec![],
            metal_messages: messages,
        })
    }

    pub fn messages(&self) -> Vec<String> {
        let fabric = self.errors.iter().map(|e| {
            let mut msg = format!("{}: {}", e.error_code, e.error_message);
            if let Some(details) = e.details.as_deref().filter(|d| !d.is_empty()) {
                msg.push_str(&format!(" ({})", details));
            }
            msg
        });
        fabric.chain(self.metal_messages.iter().cloned()).collect()
    }
}

#[derive(Debug, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// Pagination block of Fabric list and search responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub offset: i32,
    pub limit: i32,
    pub total: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

/// Audit trail attached to Fabric objects
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Changelog {
    pub created_by: Option<String>,
    pub created_by_full_name: Option<String>,
    pub created_by_email: Option<String>,
    pub created_date_time: Option<String>,
    pub updated_by: Option<String>,
    pub updated_by_full_name: Option<String>,
    pub updated_by_email: Option<String>,
    pub updated_date_time: Option<String>,
    pub deleted_by: Option<String>,
    pub deleted_by_full_name: Option<String>,
    pub deleted_by_email: Option<String>,
    pub deleted_date_time: Option<String>,
}

/// JSON patch operation used by Fabric PATCH endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    pub value: serde_json::Value,
}

impl PatchOperation {
    pub fn replace(path: &str, value: impl Into<serde_json::Value>) -> Self {
        Self {
            op: "replace".to_string(),
            path: path.to_string(),
            value: value.into(),
        }
    }
}

/// Last path segment of an href, e.g. the organization id in
/// `/metal/v1/organizations/<id>`.
pub fn href_basename(href: &str) -> &str {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}
