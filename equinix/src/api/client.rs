use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::common::ApiErrorDetails;
use super::error::ApiError;

const FABRIC_AUTH_HEADER: &str = "Authorization";
const METAL_AUTH_HEADER: &str = "X-Auth-Token";
const TOKEN_PATH: &str = "/oauth2/v1/token";
const STS_TOKEN_PATH: &str = "/use/token";
const STS_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const STS_SUBJECT_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:id_token";
/// Tokens are refreshed this long before the server says they expire
const TOKEN_EXPIRY_SKEW: Duration = Duration::from_secs(10);

/// Equinix API client shared by the Fabric and Metal endpoints
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    fabric_auth: FabricAuth,
    metal_auth_token: Option<String>,
    retry_config: RetryConfig,
    access_token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn new(value: String, lifetime: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: lifetime.map(|l| Instant::now() + l.saturating_sub(TOKEN_EXPIRY_SKEW)),
        }
    }

    fn is_fresh(&self) -> bool {
        !matches!(self.expires_at, Some(at) if Instant::now() >= at)
    }
}

/// How Fabric requests are authorized
#[derive(Clone, Debug, PartialEq)]
pub enum FabricAuth {
    /// OAuth2 client credentials exchanged for a bearer token on first use
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
    /// OIDC ID token exchanged at the Equinix Security Token Service
    Sts {
        source_token: String,
        auth_scope: String,
        endpoint: String,
    },
    /// Pre-issued bearer token
    Token(String),
    None,
}

impl FabricAuth {
    /// Whether the bearer token is fetched at runtime and can be fetched again
    pub fn is_refreshable(&self) -> bool {
        matches!(self, FabricAuth::ClientCredentials { .. } | FabricAuth::Sts { .. })
    }
}

/// Which API family a request targets; decides the auth header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Service {
    Fabric,
    Metal,
}

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30000,
            timeout_seconds: 30,
        }
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Serialize)]
struct StsTokenRequest<'a> {
    grant_type: &'a str,
    scope: &'a str,
    subject_token_type: &'a str,
    subject_token: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Seconds; the OAuth2 endpoint sends a string, STS a number
    #[serde(default, alias = "expires_in")]
    token_timeout: Option<serde_json::Value>,
}

impl TokenResponse {
    fn lifetime(&self) -> Option<Duration> {
        let seconds = match self.token_timeout.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64()?,
            serde_json::Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        Some(Duration::from_secs(seconds))
    }
}

impl Client {
    /// Create a new API client with default retry configuration
    pub fn new(
        endpoint: &str,
        fabric_auth: FabricAuth,
        metal_auth_token: Option<String>,
    ) -> Result<Self, ApiError> {
        Self::with_config(
            endpoint,
            fabric_auth,
            metal_auth_token,
            RetryConfig::default(),
        )
    }

    /// Create a new API client with custom retry configuration
    pub fn with_config(
        endpoint: &str,
        fabric_auth: FabricAuth,
        metal_auth_token: Option<String>,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(retry_config.timeout_seconds))
            .user_agent(concat!("terraform-provider-equinix/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = endpoint.trim_end_matches('/').to_string();

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                fabric_auth,
                metal_auth_token,
                retry_config,
                access_token: Mutex::new(None),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Fabric API operations
    pub fn fabric(&self) -> crate::api::fabric::FabricApi<'_> {
        crate::api::fabric::FabricApi::new(self)
    }

    /// Metal API operations
    pub fn metal(&self) -> crate::api::metal::MetalApi<'_> {
        crate::api::metal::MetalApi::new(self)
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        service: Service,
        path: &str,
    ) -> Result<T, ApiError> {
        self.send::<T, ()>(service, Method::GET, path, None).await
    }

    /// Execute a POST request with retry logic
    pub async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        service: Service,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(service, Method::POST, path, Some(body)).await
    }

    /// Execute a PUT request with retry logic
    pub async fn put<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        service: Service,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(service, Method::PUT, path, Some(body)).await
    }

    /// Execute a PATCH request with retry logic
    pub async fn patch<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        service: Service,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(service, Method::PATCH, path, Some(body)).await
    }

    /// Execute a DELETE request with retry logic
    pub async fn delete<T: for<'de> Deserialize<'de>>(
        &self,
        service: Service,
        path: &str,
    ) -> Result<T, ApiError> {
        self.send::<T, ()>(service, Method::DELETE, path, None).await
    }

    async fn send<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        service: Service,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        match self.send_once(service, &method, path, body).await {
            Err(ApiError::AuthError(message))
                if service == Service::Fabric && self.inner.fabric_auth.is_refreshable() =>
            {
                tracing::debug!("Fabric token rejected ({}), requesting a new one", message);
                self.inner.access_token.lock().await.take();
                self.send_once(service, &method, path, body).await
            }
            result => result,
        }
    }

    async fn send_once<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        service: Service,
        method: &Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let (header_name, header_value) = self.auth_header(service).await?;
        let url = format!("{}{}", self.inner.base_url, path);

        self.execute_with_retry(
            || async {
                tracing::debug!("{} request to: {}", method, url);

                let mut request = self
                    .inner
                    .http_client
                    .request(method.clone(), &url)
                    .header(header_name, &header_value);
                if let Some(body) = body {
                    request = request.json(body);
                }
                request.send().await
            },
            path,
        )
        .await
    }

    async fn auth_header(&self, service: Service) -> Result<(&'static str, String), ApiError> {
        match service {
            Service::Metal => match &self.inner.metal_auth_token {
                Some(token) => Ok((METAL_AUTH_HEADER, token.clone())),
                None => Err(ApiError::ConfigError(
                    "Metal requests need an auth_token (METAL_AUTH_TOKEN)".to_string(),
                )),
            },
            Service::Fabric => {
                let token = self.fabric_token().await?;
                Ok((FABRIC_AUTH_HEADER, format!("Bearer {}", token)))
            }
        }
    }

    async fn fabric_token(&self) -> Result<String, ApiError> {
        if let FabricAuth::Token(token) = &self.inner.fabric_auth {
            return Ok(token.clone());
        }

        let mut cached = self.inner.access_token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let request = match &self.inner.fabric_auth {
            FabricAuth::ClientCredentials {
                client_id,
                client_secret,
            } => {
                let url = format!("{}{}", self.inner.base_url, TOKEN_PATH);
                tracing::debug!("Requesting OAuth2 token from: {}", url);
                self.inner.http_client.post(url).json(&TokenRequest {
                    grant_type: "client_credentials",
                    client_id,
                    client_secret,
                })
            }
            FabricAuth::Sts {
                source_token,
                auth_scope,
                endpoint,
            } => {
                let url = format!("{}{}", endpoint.trim_end_matches('/'), STS_TOKEN_PATH);
                tracing::debug!("Exchanging OIDC token at: {}", url);
                self.inner.http_client.post(url).form(&StsTokenRequest {
                    grant_type: STS_GRANT_TYPE,
                    scope: auth_scope,
                    subject_token_type: STS_SUBJECT_TOKEN_TYPE,
                    subject_token: source_token,
                })
            }
            FabricAuth::Token(_) | FabricAuth::None => {
                return Err(ApiError::ConfigError(
                    "Fabric requests need client_id and client_secret, sts_source_token and sts_auth_scope, or a token"
                        .to_string(),
                ))
            }
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::AuthError(format!(
                "token request failed with HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::ParseError(format!("Failed to parse token response: {}", e)))?;
        let lifetime = token.lifetime();
        tracing::debug!("Fabric token valid for {:?}", lifetime);
        *cached = Some(CachedToken::new(token.access_token.clone(), lifetime));
        Ok(token.access_token)
    }

    /// Execute request with retry logic
    async fn execute_with_retry<F, Fut, T>(&self, request_fn: F, path: &str) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
        T: for<'de> Deserialize<'de>,
    {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.inner.retry_config.max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    self.inner
                        .retry_config
                        .initial_backoff_ms
                        .saturating_mul(2_u64.saturating_pow(attempt - 1)),
                    self.inner.retry_config.max_backoff_ms,
                );
                tracing::debug!(
                    "Retrying request to {} after {}ms (attempt {})",
                    path,
                    backoff,
                    attempt
                );
                tokio::time::sleep(tokio::time::Duration::from_millis(backoff)).await;
            }

            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return self.parse_success_response(response).await;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        let text = response.text().await.unwrap_or_default();
                        return Err(ApiError::AuthError(text));
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return self.handle_error_response(response).await;
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error =
                            Some(ApiError::Timeout(self.inner.retry_config.timeout_seconds));
                    } else if e.is_connect() || e.is_request() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(ApiError::RequestError(e));
                    }
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    /// Parse successful response; empty bodies decode as JSON null
    async fn parse_success_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        let body = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str::<T>(body).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::ParseError(format!("Failed to parse response: {}", e))
        })
    }

    /// Handle error response
    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let details = ApiErrorDetails::from_body(&text).map(Box::new);

        Err(ApiError::ApiError {
            status,
            message: text,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn fast_retries() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.initial_backoff_ms, 1000);
        assert_eq!(config.max_backoff_ms, 30000);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[tokio::test]
    async fn test_static_token_is_sent_as_bearer() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/fabric/v4/ports/p-1")
            .match_header("authorization", "Bearer static-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"uuid":"p-1"}"#)
            .create_async()
            .await;

        let client = Client::new(
            &server.url(),
            FabricAuth::Token("static-token".to_string()),
            None,
        )
        .unwrap();
        let body: serde_json::Value = client
            .get(Service::Fabric, "/fabric/v4/ports/p-1")
            .await
            .unwrap();

        assert_eq!(body["uuid"], "p-1");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_credentials_fetch_token_once() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("POST", "/oauth2/v1/token")
            .match_body(Matcher::PartialJsonString(
                r#"{"grant_type":"client_credentials","client_id":"id","client_secret":"secret"}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"oauth-token","token_timeout":"3600"}"#)
            .expect(1)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/fabric/v4/ports/p-1")
            .match_header("authorization", "Bearer oauth-token")
            .with_status(200)
            .with_body(r#"{"uuid":"p-1"}"#)
            .expect(2)
            .create_async()
            .await;

        let client = Client::new(
            &server.url(),
            FabricAuth::ClientCredentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            },
            None,
        )
        .unwrap();

        for _ in 0..2 {
            let _: serde_json::Value = client
                .get(Service::Fabric, "/fabric/v4/ports/p-1")
                .await
                .unwrap();
        }

        token.assert_async().await;
        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_metal_uses_auth_token_header() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("DELETE", "/metal/v1/projects/proj-1")
            .match_header("x-auth-token", "metal-token")
            .with_status(204)
            .create_async()
            .await;

        let client = Client::new(&server.url(), FabricAuth::None, Some("metal-token".to_string()))
            .unwrap();
        let result: Result<(), ApiError> = client
            .delete(Service::Metal, "/metal/v1/projects/proj-1")
            .await;

        assert!(result.is_ok());
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_credentials_are_config_errors() {
        let client = Client::new("http://127.0.0.1:1", FabricAuth::None, None).unwrap();

        let fabric: Result<serde_json::Value, _> =
            client.get(Service::Fabric, "/fabric/v4/ports/p-1").await;
        assert!(matches!(fabric, Err(ApiError::ConfigError(_))));

        let metal: Result<serde_json::Value, _> =
            client.get(Service::Metal, "/metal/v1/projects").await;
        assert!(matches!(metal, Err(ApiError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/fabric/v4/ports/p-1")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = Client::with_config(
            &server.url(),
            FabricAuth::Token("t".to_string()),
            None,
            fast_retries(),
        )
        .unwrap();
        let result: Result<serde_json::Value, _> =
            client.get(Service::Fabric, "/fabric/v4/ports/p-1").await;

        assert!(matches!(result, Err(ApiError::ServiceUnavailable)));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_errors_carry_fabric_details() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/fabric/v4/ports/p-1")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"errorCode":"EQ-3142001","errorMessage":"Invalid PortUUID"}]"#)
            .expect(1)
            .create_async()
            .await;

        let client = Client::with_config(
            &server.url(),
            FabricAuth::Token("t".to_string()),
            None,
            fast_retries(),
        )
        .unwrap();
        let err = client
            .get::<serde_json::Value>(Service::Fabric, "/fabric/v4/ports/p-1")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(err.has_error_code("EQ-3142001"));
        assert!(err.message_contains("Invalid PortUUID"));
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/fabric/v4/ports/p-1")
            .with_status(401)
            .with_body("invalid token")
            .expect(1)
            .create_async()
            .await;

        let client = Client::with_config(
            &server.url(),
            FabricAuth::Token("t".to_string()),
            None,
            fast_retries(),
        )
        .unwrap();
        let err = client
            .get::<serde_json::Value>(Service::Fabric, "/fabric/v4/ports/p-1")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::AuthError(ref msg) if msg == "invalid token"));
        m.assert_async().await;
    }

    fn client_credentials(server: &Server) -> Client {
        Client::with_config(
            &server.url(),
            FabricAuth::ClientCredentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            },
            None,
            fast_retries(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_rejected_token_is_replaced_once() {
        let mut server = Server::new_async().await;
        let stale_token = server
            .mock("POST", "/oauth2/v1/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"stale","token_timeout":"3600"}"#)
            .expect(1)
            .create_async()
            .await;
        let fresh_token = server
            .mock("POST", "/oauth2/v1/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"fresh","token_timeout":"3600"}"#)
            .expect(1)
            .create_async()
            .await;
        let rejected = server
            .mock("GET", "/fabric/v4/ports/p-1")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .with_body("token expired")
            .expect(1)
            .create_async()
            .await;
        let accepted = server
            .mock("GET", "/fabric/v4/ports/p-1")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body(r#"{"uuid":"p-1"}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client_credentials(&server);
        for _ in 0..2 {
            let body: serde_json::Value = client
                .get(Service::Fabric, "/fabric/v4/ports/p-1")
                .await
                .unwrap();
            assert_eq!(body["uuid"], "p-1");
        }

        stale_token.assert_async().await;
        fresh_token.assert_async().await;
        rejected.assert_async().await;
        accepted.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_is_fetched_again() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("POST", "/oauth2/v1/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"short-lived","token_timeout":"10"}"#)
            .expect(2)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/fabric/v4/ports/p-1")
            .match_header("authorization", "Bearer short-lived")
            .with_status(200)
            .with_body(r#"{"uuid":"p-1"}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client_credentials(&server);
        for _ in 0..2 {
            let _: serde_json::Value = client
                .get(Service::Fabric, "/fabric/v4/ports/p-1")
                .await
                .unwrap();
        }

        token.assert_async().await;
        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_repeated_rejection_is_returned() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("POST", "/oauth2/v1/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"revoked","token_timeout":"3600"}"#)
            .expect(2)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/fabric/v4/ports/p-1")
            .with_status(401)
            .with_body("client disabled")
            .expect(2)
            .create_async()
            .await;

        let client = client_credentials(&server);
        let err = client
            .get::<serde_json::Value>(Service::Fabric, "/fabric/v4/ports/p-1")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::AuthError(ref msg) if msg == "client disabled"));
        token.assert_async().await;
        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_sts_exchanges_source_token() {
        let mut server = Server::new_async().await;
        let sts = server
            .mock("POST", "/sts/use/token")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "grant_type".to_string(),
                    "urn:ietf:params:oauth:grant-type:token-exchange".to_string(),
                ),
                Matcher::UrlEncoded("scope".to_string(), "roleassignments:org-1".to_string()),
                Matcher::UrlEncoded(
                    "subject_token_type".to_string(),
                    "urn:ietf:params:oauth:token-type:id_token".to_string(),
                ),
                Matcher::UrlEncoded("subject_token".to_string(), "oidc-id-token".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"sts-token","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/fabric/v4/ports/p-1")
            .match_header("authorization", "Bearer sts-token")
            .with_status(200)
            .with_body(r#"{"uuid":"p-1"}"#)
            .expect(2)
            .create_async()
            .await;

        let client = Client::new(
            &server.url(),
            FabricAuth::Sts {
                source_token: "oidc-id-token".to_string(),
                auth_scope: "roleassignments:org-1".to_string(),
                endpoint: format!("{}/sts/", server.url()),
            },
            None,
        )
        .unwrap();
        for _ in 0..2 {
            let _: serde_json::Value = client
                .get(Service::Fabric, "/fabric/v4/ports/p-1")
                .await
                .unwrap();
        }

        sts.assert_async().await;
        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_sts_exchange_is_auth_error() {
        let mut server = Server::new_async().await;
        let _sts = server
            .mock("POST", "/use/token")
            .with_status(400)
            .with_body("invalid subject token")
            .create_async()
            .await;

        let client = Client::with_config(
            &server.url(),
            FabricAuth::Sts {
                source_token: "bad".to_string(),
                auth_scope: "roleassignments:org-1".to_string(),
                endpoint: server.url(),
            },
            None,
            fast_retries(),
        )
        .unwrap();
        let err = client
            .get::<serde_json::Value>(Service::Fabric, "/fabric/v4/ports/p-1")
            .await
            .unwrap_err();

        assert!(
            matches!(err, ApiError::AuthError(ref msg) if msg.contains("HTTP 400") && msg.contains("invalid subject token"))
        );
    }

    #[test]
    fn test_token_lifetime_accepts_strings_and_numbers() {
        let oauth: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","token_timeout":"3600"}"#).unwrap();
        assert_eq!(oauth.lifetime(), Some(Duration::from_secs(3600)));

        let sts: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","expires_in":900}"#).unwrap();
        assert_eq!(sts.lifetime(), Some(Duration::from_secs(900)));

        let bare: TokenResponse = serde_json::from_str(r#"{"access_token":"a"}"#).unwrap();
        assert_eq!(bare.lifetime(), None);
    }
}
