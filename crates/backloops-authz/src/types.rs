//! Request, policy and configuration types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Caller-supplied data forwarded untouched to the policy engine.
pub type AdditionalData = serde_json::Map<String, serde_json::Value>;

/// Identity context attached to an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    /// Privileged service-to-service identity.
    #[serde(default)]
    pub is_server: bool,

    /// End-user identity. An absent id never matches a target.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl TokenData {
    /// Token for a privileged server identity.
    pub fn server() -> Self {
        Self {
            is_server: true,
            user_id: None,
        }
    }

    /// Token for an end user.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            is_server: false,
            user_id: Some(user_id.into()),
        }
    }
}

/// Inbound request as seen by the authorizer.
///
/// Every field is optional. Normalization substitutes an empty string or an
/// empty map for anything missing, so a default context is a valid input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Identity context. `None` always denies.
    #[serde(default)]
    pub token_data: Option<TokenData>,

    /// Header names (lowercase) to values. Default: empty map.
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,

    /// HTTP method. Default: `""`.
    #[serde(default)]
    pub method: Option<String>,

    /// Protocol version without the `HTTP/` prefix, e.g. `1.1`. Default: `""`.
    #[serde(default)]
    pub http_version: Option<String>,

    /// URL path component. Default: `""`.
    #[serde(default)]
    pub path: Option<String>,

    /// URL query component, without the leading `?`. Default: `""`.
    #[serde(default)]
    pub query: Option<String>,
}

impl RequestContext {
    /// Build a context from the head of an inbound HTTP request.
    ///
    /// Repeated headers are joined with `", "`. Token data is not part of
    /// the HTTP head and has to be attached with [`Self::with_token_data`].
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in &parts.headers {
            let value = String::from_utf8_lossy(value.as_bytes());
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.into_owned());
        }

        Self {
            token_data: None,
            headers: Some(headers),
            method: Some(parts.method.as_str().to_string()),
            http_version: Some(version_string(parts.version).to_string()),
            path: Some(parts.uri.path().to_string()),
            query: parts.uri.query().map(String::from),
        }
    }

    /// Attach identity context.
    pub fn with_token_data(mut self, token_data: TokenData) -> Self {
        self.token_data = Some(token_data);
        self
    }

    /// Add a header. Names are stored lowercase.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Set the protocol version (`1.1`, `2.0`, ...).
    pub fn with_http_version(mut self, version: impl Into<String>) -> Self {
        self.http_version = Some(version.into());
        self
    }

    /// Set the URL path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the URL query.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

fn version_string(version: http::Version) -> &'static str {
    match version {
        http::Version::HTTP_09 => "0.9",
        http::Version::HTTP_10 => "1.0",
        http::Version::HTTP_11 => "1.1",
        http::Version::HTTP_2 => "2.0",
        http::Version::HTTP_3 => "3.0",
        _ => "",
    }
}

/// Normalized request sent to the policy engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRequest {
    pub headers: BTreeMap<String, String>,
    pub method: String,
    /// `HTTP/<version>`.
    pub protocol: String,
    pub host: String,
    pub path: String,
    pub query: String,
    /// Name of the service asking.
    pub service: String,
}

/// Canonical policy input: normalized request plus caller data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyInput {
    pub request: PolicyRequest,
    pub data: AdditionalData,
}

/// The `result` member of a policy engine response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyResult {
    /// Expected to be a boolean; anything else is treated as malformed.
    #[serde(default)]
    pub authorized: Option<serde_json::Value>,
}

/// Authorizer configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthzConfig {
    /// Base URL of the policy engine.
    #[serde(default)]
    pub opa_host: String,

    /// Identity of this service, sent with every policy query.
    #[serde(default)]
    pub service_name: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            opa_host: String::new(),
            service_name: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl AuthzConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `OPA_HOST` | Policy engine base URL |
    /// | `SERVICE_NAME` | Service identity |
    /// | `OPA_TIMEOUT` | Request timeout in seconds (default: 10) |
    ///
    /// Missing values fall back to defaults; this never fails.
    pub fn from_env() -> Self {
        Self {
            opa_host: std::env::var("OPA_HOST").unwrap_or_default(),
            service_name: std::env::var("SERVICE_NAME").unwrap_or_default(),
            timeout_secs: std::env::var("OPA_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
        }
    }

    /// Set the policy engine base URL.
    pub fn with_opa_host(mut self, host: impl Into<String>) -> Self {
        self.opa_host = host.into();
        self
    }

    /// Set the service name.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
