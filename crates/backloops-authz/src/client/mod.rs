//! Policy engine client.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in transport.rs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::error::{AuthzError, AuthzResult};
use crate::types::{AuthzConfig, PolicyInput};

mod transport;

pub use transport::PolicyOutcome;

use transport::HttpBackend;

/// Route of the access decision document on the policy engine.
pub const ACCESS_ROUTE: &str = "/v1/data/backloops/access";

/// `User-Agent` sent with every policy query.
pub const AUTHZ_USER_AGENT: &str = concat!("backloops-authz/", env!("CARGO_PKG_VERSION"));

/// Something that can evaluate a policy input remotely.
///
/// Implementations return `Err` only for transport failures; any answer
/// from the engine, including a refusal or a garbled body, is an outcome.
#[async_trait]
pub trait PolicyEvaluator: Send + Sync {
    async fn evaluate(&self, input: &PolicyInput) -> AuthzResult<PolicyOutcome>;
}

/// OPA client posting policy inputs to the access route.
#[derive(Debug, Clone)]
pub struct OpaClient {
    http: HttpBackend,
}

impl OpaClient {
    pub fn new(config: &AuthzConfig) -> AuthzResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(AUTHZ_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| AuthzError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let endpoint = format!("{}{}", config.opa_host.trim_end_matches('/'), ACCESS_ROUTE);

        Ok(Self {
            http: HttpBackend { client, endpoint },
        })
    }

    pub fn from_env() -> AuthzResult<Self> {
        Self::new(&AuthzConfig::from_env())
    }

    /// Full URL the client posts to.
    pub fn endpoint(&self) -> &str {
        &self.http.endpoint
    }
}

#[async_trait]
impl PolicyEvaluator for OpaClient {
    async fn evaluate(&self, input: &PolicyInput) -> AuthzResult<PolicyOutcome> {
        debug!(endpoint = %self.http.endpoint, service = %input.request.service, "querying policy engine");
        self.http.post_query(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let config = AuthzConfig::default().with_opa_host("http://my-opa");
        let client = OpaClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "http://my-opa/v1/data/backloops/access");
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let config = AuthzConfig::default().with_opa_host("http://my-opa:8181/");
        let client = OpaClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://my-opa:8181/v1/data/backloops/access"
        );
    }

    #[test]
    fn test_empty_host_still_builds() {
        let client = OpaClient::new(&AuthzConfig::default()).unwrap();
        assert_eq!(client.endpoint(), ACCESS_ROUTE);
    }

    #[tokio::test]
    async fn test_empty_host_is_transport_error() {
        let client = OpaClient::new(&AuthzConfig::default()).unwrap();
        let result = client.evaluate(&PolicyInput::default()).await;
        assert!(matches!(result, Err(AuthzError::Transport { .. })));
    }
}
