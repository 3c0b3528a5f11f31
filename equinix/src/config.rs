//! Provider configuration: schema, environment fallbacks and client setup

use serde::{Deserialize, Serialize};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder, Validator, ValidatorRequest, ValidatorResponse};
use tfplug::typed::{Int64Value, StringValue};
use tfplug::types::Diagnostic;
use tfplug::validator::NumberRange;

use crate::api::{Client, FabricAuth, RetryConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.equinix.com";
pub const DEFAULT_STS_BASE_URL: &str = "https://sts.eqix.equinix.com";
pub const DEFAULT_TIMEOUT_SECONDS: i64 = 30;
pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const DEFAULT_MAX_RETRIES: i64 = 10;
pub const DEFAULT_MAX_RETRY_WAIT_SECONDS: i64 = 30;

pub const ENDPOINT_ENV_VAR: &str = "EQUINIX_API_ENDPOINT";
pub const CLIENT_ID_ENV_VAR: &str = "EQUINIX_API_CLIENTID";
pub const CLIENT_SECRET_ENV_VAR: &str = "EQUINIX_API_CLIENTSECRET";
pub const CLIENT_TOKEN_ENV_VAR: &str = "EQUINIX_API_TOKEN";
pub const CLIENT_TIMEOUT_ENV_VAR: &str = "EQUINIX_API_TIMEOUT";
pub const METAL_AUTH_TOKEN_ENV_VAR: &str = "METAL_AUTH_TOKEN";
pub const STS_AUTH_SCOPE_ENV_VAR: &str = "EQUINIX_STS_AUTH_SCOPE";
pub const STS_SOURCE_TOKEN_ENV_VAR: &str = "EQUINIX_STS_SOURCE_TOKEN";
pub const STS_ENDPOINT_ENV_VAR: &str = "EQUINIX_STS_ENDPOINT";

/// Provider block as written by the user
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfigModel {
    pub endpoint: StringValue,
    pub client_id: StringValue,
    pub client_secret: StringValue,
    pub token: StringValue,
    pub auth_token: StringValue,
    pub sts_auth_scope: StringValue,
    pub sts_source_token: StringValue,
    pub sts_endpoint: StringValue,
    pub request_timeout: Int64Value,
    pub response_max_page_size: Int64Value,
    pub max_retries: Int64Value,
    pub max_retry_wait_seconds: Int64Value,
}

/// Configuration after environment fallbacks and defaults
#[derive(Debug, Clone, PartialEq)]
pub struct EquinixConfig {
    pub endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub token: String,
    pub auth_token: String,
    pub sts_auth_scope: String,
    pub sts_source_token: String,
    pub sts_endpoint: String,
    pub request_timeout: u64,
    pub page_size: i64,
    pub max_retries: u32,
    pub max_retry_wait: u64,
}

impl EquinixConfig {
    /// Fills unset attributes from the environment, then from defaults.
    /// Unparsable integer variables fall back to the default with a warning.
    pub fn resolve(model: &ProviderConfigModel) -> (Self, Vec<Diagnostic>) {
        let mut diags = Vec::new();

        let config = Self {
            endpoint: string_value(&model.endpoint, ENDPOINT_ENV_VAR, DEFAULT_BASE_URL),
            client_id: string_value(&model.client_id, CLIENT_ID_ENV_VAR, ""),
            client_secret: string_value(&model.client_secret, CLIENT_SECRET_ENV_VAR, ""),
            token: string_value(&model.token, CLIENT_TOKEN_ENV_VAR, ""),
            auth_token: string_value(&model.auth_token, METAL_AUTH_TOKEN_ENV_VAR, ""),
            sts_auth_scope: string_value(&model.sts_auth_scope, STS_AUTH_SCOPE_ENV_VAR, ""),
            sts_source_token: string_value(&model.sts_source_token, STS_SOURCE_TOKEN_ENV_VAR, ""),
            sts_endpoint: string_value(&model.sts_endpoint, STS_ENDPOINT_ENV_VAR, DEFAULT_STS_BASE_URL),
            request_timeout: int_value(
                &model.request_timeout,
                Some(CLIENT_TIMEOUT_ENV_VAR),
                DEFAULT_TIMEOUT_SECONDS,
                &mut diags,
            )
            .max(1) as u64,
            page_size: int_value(&model.response_max_page_size, None, DEFAULT_PAGE_SIZE, &mut diags),
            max_retries: saturating_u32(int_value(
                &model.max_retries,
                None,
                DEFAULT_MAX_RETRIES,
                &mut diags,
            )),
            max_retry_wait: int_value(
                &model.max_retry_wait_seconds,
                None,
                DEFAULT_MAX_RETRY_WAIT_SECONDS,
                &mut diags,
            )
            .max(0) as u64,
        };

        (config, diags)
    }

    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diags = Vec::new();

        if let Err(e) = parse_endpoint(&self.endpoint) {
            diags.push(Diagnostic::error("Invalid endpoint", e));
        }

        if let FabricAuth::Sts { endpoint, .. } = self.fabric_auth() {
            if let Err(e) = parse_endpoint(&endpoint) {
                diags.push(Diagnostic::error("Invalid STS endpoint", e));
            }
        }

        if self.fabric_auth() == FabricAuth::None && self.auth_token.is_empty() {
            diags.push(Diagnostic::error(
                "Missing credentials",
                format!(
                    "Set client_id and client_secret ({}, {}), sts_source_token and sts_auth_scope ({}, {}), token ({}) or auth_token ({})",
                    CLIENT_ID_ENV_VAR,
                    CLIENT_SECRET_ENV_VAR,
                    STS_SOURCE_TOKEN_ENV_VAR,
                    STS_AUTH_SCOPE_ENV_VAR,
                    CLIENT_TOKEN_ENV_VAR,
                    METAL_AUTH_TOKEN_ENV_VAR
                ),
            ));
        }

        diags
    }

    /// A static token wins over STS, which wins over client credentials.
    pub fn fabric_auth(&self) -> FabricAuth {
        if !self.token.is_empty() {
            FabricAuth::Token(self.token.clone())
        } else if !self.sts_source_token.is_empty() && !self.sts_auth_scope.is_empty() {
            FabricAuth::Sts {
                source_token: self.sts_source_token.clone(),
                auth_scope: self.sts_auth_scope.clone(),
                endpoint: self.sts_endpoint.clone(),
            }
        } else if !self.client_id.is_empty() && !self.client_secret.is_empty() {
            FabricAuth::ClientCredentials {
                client_id: self.client_id.clone(),
                client_secret: self.client_secret.clone(),
            }
        } else {
            FabricAuth::None
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            max_backoff_ms: self.max_retry_wait.saturating_mul(1000),
            timeout_seconds: self.request_timeout,
            ..RetryConfig::default()
        }
    }

    pub fn build_client(&self) -> Result<Client, crate::api::ApiError> {
        let metal_token = (!self.auth_token.is_empty()).then(|| self.auth_token.clone());
        Client::with_config(
            &self.endpoint,
            self.fabric_auth(),
            metal_token,
            self.retry_config(),
        )
    }
}

fn string_value(value: &StringValue, env_var: &str, default: &str) -> String {
    if let Some(v) = value.get() {
        return v.clone();
    }
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn saturating_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn int_value(
    value: &Int64Value,
    env_var: Option<&str>,
    default: i64,
    diags: &mut Vec<Diagnostic>,
) -> i64 {
    if let Some(v) = value.get() {
        return *v;
    }
    let Some(key) = env_var else {
        return default;
    };
    match std::env::var(key) {
        Ok(raw) if !raw.is_empty() => raw.parse::<i64>().unwrap_or_else(|e| {
            diags.push(Diagnostic::warning(
                format!(
                    "Failed to parse the environment variable {} to an integer. Will use default value: {} instead",
                    key, default
                ),
                e.to_string(),
            ));
            default
        }),
        _ => default,
    }
}

fn parse_endpoint(endpoint: &str) -> Result<url::Url, String> {
    let parsed = url::Url::parse(endpoint).map_err(|e| format!("{}: {}", endpoint, e))?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(parsed),
        "http" | "https" => Err(format!("{}: missing host", endpoint)),
        other => Err(format!(
            "{}: scheme {} is not one of http, https",
            endpoint, other
        )),
    }
}

/// Rejects values that are not absolute http(s) URLs
pub struct UrlWithScheme;

impl UrlWithScheme {
    pub fn create() -> Box<dyn Validator> {
        Box::new(Self)
    }
}

impl Validator for UrlWithScheme {
    fn description(&self) -> String {
        "value must be a URL with http or https scheme".to_string()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Some(raw) = request.config_value.value.as_str() else {
            return ValidatorResponse::default();
        };
        match parse_endpoint(raw) {
            Ok(_) => ValidatorResponse::default(),
            Err(e) => ValidatorResponse {
                diagnostics: vec![Diagnostic::error("Invalid URL", e).with_attribute(request.path)],
            },
        }
    }
}

pub fn provider_schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("The Equinix provider manages Equinix Fabric and Equinix Metal resources")
        .attribute(
            AttributeBuilder::new("endpoint", AttributeType::String)
                .description(&format!(
                    "The Equinix API base URL to point out desired environment. This argument can also be specified with the `{}` shell environment variable. (Defaults to `{}`)",
                    ENDPOINT_ENV_VAR, DEFAULT_BASE_URL
                ))
                .optional()
                .validator(UrlWithScheme::create())
                .build(),
        )
        .attribute(
            AttributeBuilder::new("client_id", AttributeType::String)
                .description(&format!(
                    "API Consumer Key available under \"My Apps\" in developer portal. This argument can also be specified with the `{}` shell environment variable.",
                    CLIENT_ID_ENV_VAR
                ))
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("client_secret", AttributeType::String)
                .description(&format!(
                    "API Consumer secret available under \"My Apps\" in developer portal. This argument can also be specified with the `{}` shell environment variable.",
                    CLIENT_SECRET_ENV_VAR
                ))
                .optional()
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("token", AttributeType::String)
                .description(&format!(
                    "API tokens are generated from API Consumer clients using the OAuth2 API. This argument can also be specified with the `{}` shell environment variable.",
                    CLIENT_TOKEN_ENV_VAR
                ))
                .optional()
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("auth_token", AttributeType::String)
                .description(&format!(
                    "The Equinix Metal API auth key for API operations. This argument can also be specified with the `{}` shell environment variable.",
                    METAL_AUTH_TOKEN_ENV_VAR
                ))
                .optional()
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("sts_auth_scope", AttributeType::String)
                .description(&format!(
                    "The scope of the authentication token. Must be an access policy ERN or a string of the form roleassignments:<org_id> This argument can also be specified with the `{}` shell environment variable.",
                    STS_AUTH_SCOPE_ENV_VAR
                ))
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("sts_endpoint", AttributeType::String)
                .description(&format!(
                    "The STS API base URL to point out desired environment. This argument can also be specified with the `{}` shell environment variable. (Defaults to `{}`)",
                    STS_ENDPOINT_ENV_VAR, DEFAULT_STS_BASE_URL
                ))
                .optional()
                .validator(UrlWithScheme::create())
                .build(),
        )
        .attribute(
            AttributeBuilder::new("sts_source_token", AttributeType::String)
                .description(&format!(
                    "The source token to use for STS authentication. Must be an OIDC ID token issued by an OIDC provider trusted by Equinix STS. This argument can also be specified with the `{}` shell environment variable.",
                    STS_SOURCE_TOKEN_ENV_VAR
                ))
                .optional()
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("request_timeout", AttributeType::Number)
                .description(&format!(
                    "The duration of time, in seconds, that the Equinix Platform API Client should wait before canceling an API request. (Defaults to `{}`)",
                    DEFAULT_TIMEOUT_SECONDS
                ))
                .optional()
                .validator(NumberRange::create(Some(1.0), None))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("response_max_page_size", AttributeType::Number)
                .description("The maximum number of records in a single response for REST queries that produce paginated responses.")
                .optional()
                .validator(NumberRange::create(Some(100.0), None))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("max_retries", AttributeType::Number)
                .description("Maximum number of retries in case of network failure.")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("max_retry_wait_seconds", AttributeType::Number)
                .description("Maximum number of seconds to wait before retrying a request.")
                .optional()
                .build(),
        )
        .build()
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tfplug::typed::Value;
    use tfplug::types::{AttributePath, Diagnostics, DynamicValue};

    const ALL_VARS: [&str; 9] = [
        ENDPOINT_ENV_VAR,
        CLIENT_ID_ENV_VAR,
        CLIENT_SECRET_ENV_VAR,
        CLIENT_TOKEN_ENV_VAR,
        CLIENT_TIMEOUT_ENV_VAR,
        METAL_AUTH_TOKEN_ENV_VAR,
        STS_AUTH_SCOPE_ENV_VAR,
        STS_SOURCE_TOKEN_ENV_VAR,
        STS_ENDPOINT_ENV_VAR,
    ];

    fn clear_env() {
        for var in ALL_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_without_config_or_env() {
        clear_env();
        let (config, diags) = EquinixConfig::resolve(&ProviderConfigModel::default());

        assert!(diags.is_empty());
        assert_eq!(config.endpoint, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, 30);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.max_retry_wait, 30);
        assert_eq!(config.fabric_auth(), FabricAuth::None);

        let errors = config.validate();
        assert_eq!(errors[0].summary, "Missing credentials");
    }

    #[test]
    #[serial]
    fn environment_fills_unset_attributes() {
        clear_env();
        std::env::set_var(ENDPOINT_ENV_VAR, "https://uatapi.equinix.com");
        std::env::set_var(CLIENT_ID_ENV_VAR, "id");
        std::env::set_var(CLIENT_SECRET_ENV_VAR, "secret");
        std::env::set_var(CLIENT_TIMEOUT_ENV_VAR, "45");

        let model = ProviderConfigModel {
            client_id: "from-config".into(),
            ..Default::default()
        };
        let (config, diags) = EquinixConfig::resolve(&model);

        assert!(diags.is_empty());
        assert_eq!(config.endpoint, "https://uatapi.equinix.com");
        assert_eq!(config.request_timeout, 45);
        assert_eq!(
            config.fabric_auth(),
            FabricAuth::ClientCredentials {
                client_id: "from-config".to_string(),
                client_secret: "secret".to_string(),
            }
        );
        assert!(config.validate().is_empty());

        clear_env();
    }

    #[test]
    #[serial]
    fn bad_integer_env_var_warns_and_uses_default() {
        clear_env();
        std::env::set_var(CLIENT_TIMEOUT_ENV_VAR, "soon");
        std::env::set_var(METAL_AUTH_TOKEN_ENV_VAR, "metal");

        let (config, diags) = EquinixConfig::resolve(&ProviderConfigModel::default());

        assert_eq!(config.request_timeout, 30);
        assert_eq!(diags.warnings().len(), 1);
        assert!(diags[0].summary.contains(CLIENT_TIMEOUT_ENV_VAR));
        assert!(config.validate().is_empty());

        clear_env();
    }

    #[test]
    #[serial]
    fn token_wins_over_client_credentials() {
        clear_env();
        let model = ProviderConfigModel {
            client_id: "id".into(),
            client_secret: "secret".into(),
            token: "tok".into(),
            ..Default::default()
        };
        let (config, _) = EquinixConfig::resolve(&model);
        assert_eq!(config.fabric_auth(), FabricAuth::Token("tok".to_string()));
    }

    #[test]
    #[serial]
    fn invalid_endpoint_is_rejected() {
        clear_env();
        let model = ProviderConfigModel {
            endpoint: "ftp://api.equinix.com".into(),
            token: "tok".into(),
            ..Default::default()
        };
        let (config, _) = EquinixConfig::resolve(&model);
        let diags = config.validate();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Invalid endpoint");

        let schema = provider_schema();
        let mut raw = DynamicValue::object();
        raw.set_string(&AttributePath::new("endpoint"), "not a url")
            .unwrap();
        assert!(schema.validate(&raw).has_error());
    }

    #[test]
    fn retry_config_follows_settings() {
        let config = EquinixConfig {
            endpoint: DEFAULT_BASE_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            token: "t".to_string(),
            auth_token: String::new(),
            sts_auth_scope: String::new(),
            sts_source_token: String::new(),
            sts_endpoint: DEFAULT_STS_BASE_URL.to_string(),
            request_timeout: 12,
            page_size: 100,
            max_retries: 3,
            max_retry_wait: 5,
        };
        let retry = config.retry_config();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.max_backoff_ms, 5000);
        assert_eq!(retry.timeout_seconds, 12);
        assert!(config.build_client().is_ok());
    }

    #[test]
    #[serial]
    fn sts_settings_come_from_environment() {
        clear_env();
        std::env::set_var(STS_AUTH_SCOPE_ENV_VAR, "roleassignments:org-1");
        std::env::set_var(STS_SOURCE_TOKEN_ENV_VAR, "id-token");

        let model = ProviderConfigModel {
            client_id: "id".into(),
            client_secret: "secret".into(),
            ..Default::default()
        };
        let (config, diags) = EquinixConfig::resolve(&model);

        assert!(diags.is_empty());
        assert_eq!(
            config.fabric_auth(),
            FabricAuth::Sts {
                source_token: "id-token".to_string(),
                auth_scope: "roleassignments:org-1".to_string(),
                endpoint: DEFAULT_STS_BASE_URL.to_string(),
            }
        );
        assert!(config.validate().is_empty());

        std::env::set_var(STS_ENDPOINT_ENV_VAR, "sts.local");
        let (config, _) = EquinixConfig::resolve(&model);
        assert_eq!(config.validate()[0].summary, "Invalid STS endpoint");

        clear_env();
    }

    #[test]
    #[serial]
    fn sts_needs_both_scope_and_source_token() {
        clear_env();
        let model = ProviderConfigModel {
            sts_source_token: "id-token".into(),
            ..Default::default()
        };
        let (config, _) = EquinixConfig::resolve(&model);

        assert_eq!(config.fabric_auth(), FabricAuth::None);
        assert_eq!(config.validate()[0].summary, "Missing credentials");
    }

    #[test]
    #[serial]
    fn oversized_retry_settings_saturate() {
        clear_env();
        let model = ProviderConfigModel {
            token: "tok".into(),
            max_retries: Value::Known(i64::from(u32::MAX) + 5),
            max_retry_wait_seconds: Value::Known(i64::MAX),
            ..Default::default()
        };
        let (config, _) = EquinixConfig::resolve(&model);

        assert_eq!(config.max_retries, u32::MAX);
        assert_eq!(config.retry_config().max_backoff_ms, u64::MAX);

        let model = ProviderConfigModel {
            token: "tok".into(),
            max_retries: Value::Known(-3),
            ..Default::default()
        };
        let (config, _) = EquinixConfig::resolve(&model);
        assert_eq!(config.max_retries, 0);
    }
}
