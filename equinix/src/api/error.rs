use thiserror::Error;

use super::common::ApiErrorDetails;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}): {message}")]
    ApiError {
        status: u16,
        message: String,
        #[source]
        details: Option<Box<ApiErrorDetails>>,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Too many requests, rate limited")]
    RateLimited,

    #[error("Service unavailable, retry later")]
    ServiceUnavailable,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// 403 and 404 both mean the object is gone as far as deletes care
    pub fn is_gone(&self) -> bool {
        self.is_not_found() || self.is_forbidden()
    }

    pub fn has_error_code(&self, code: &str) -> bool {
        match self {
            ApiError::ApiError {
                details: Some(details),
                ..
            } => details.errors.iter().any(|e| e.error_code == code),
            _ => false,
        }
    }

    pub fn message_contains(&self, needle: &str) -> bool {
        match self {
            ApiError::ApiError {
                message, details, ..
            } => {
                message.contains(needle)
                    || details
                        .as_ref()
                        .is_some_and(|d| d.messages().iter().any(|m| m.contains(needle)))
            }
            _ => false,
        }
    }

    /// Fabric error text: every decoded error message joined with "; ",
    /// falling back to the plain error when the body carried none.
    pub fn fabric_message(&self) -> String {
        if let ApiError::ApiError {
            status,
            details: Some(details),
            ..
        } = self
        {
            let messages = details.messages();
            if !messages.is_empty() {
                return format!("HTTP {} {}", status, messages.join("; "));
            }
        }
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::common::FabricError;

    fn fabric_error(status: u16, errors: Vec<FabricError>) -> ApiError {
        ApiError::ApiError {
            status,
            message: String::new(),
            details: Some(Box::new(ApiErrorDetails {
                errors,
                metal_messages: vec![],
            })),
        }
    }

    #[test]
    fn status_helpers() {
        let not_found = fabric_error(404, vec![]);
        assert!(not_found.is_not_found());
        assert!(not_found.is_gone());
        assert!(!not_found.is_forbidden());

        assert!(fabric_error(403, vec![]).is_gone());
        assert!(!ApiError::RateLimited.is_gone());
    }

    #[test]
    fn error_code_lookup() {
        let err = fabric_error(
            400,
            vec![FabricError {
                error_code: "EQ-3044402".to_string(),
                error_message: "Route Aggregation Rule not found".to_string(),
                ..Default::default()
            }],
        );
        assert!(err.has_error_code("EQ-3044402"));
        assert!(!err.has_error_code("EQ-3040000"));
        assert!(err.message_contains("not found"));
    }

    #[test]
    fn fabric_message_joins_errors() {
        let err = fabric_error(
            400,
            vec![
                FabricError {
                    error_code: "EQ-3142001".to_string(),
                    error_message: "Invalid PortUUID".to_string(),
                    ..Default::default()
                },
                FabricError {
                    error_code: "EQ-3142002".to_string(),
                    error_message: "Port is locked".to_string(),
                    details: Some("retry later".to_string()),
                    ..Default::default()
                },
            ],
        );
        assert_eq!(
            err.fabric_message(),
            "HTTP 400 EQ-3142001: Invalid PortUUID; EQ-3142002: Port is locked (retry later)"
        );
    }

    #[test]
    fn fabric_message_falls_back_to_display() {
        assert_eq!(
            ApiError::ServiceUnavailable.fabric_message(),
            "Service unavailable, retry later"
        );
    }
}
