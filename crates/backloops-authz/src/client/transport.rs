//! HTTP layer: status and body mapping into `PolicyOutcome`.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuthzError, AuthzResult};
use crate::types::{PolicyInput, PolicyResult};

/// What the policy engine answered, when it answered at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// 200 with a well-formed `result.authorized` boolean.
    Decided { authorized: bool },

    /// Any status other than 200.
    UnexpectedStatus { status: u16 },

    /// 200 with a body lacking a boolean `result.authorized`.
    Malformed { message: String },
}

/// Request body: `{ "input": <PolicyInput> }`.
#[derive(Debug, Serialize)]
pub(crate) struct PolicyQuery<'a> {
    pub input: &'a PolicyInput,
}

#[derive(Debug, Deserialize)]
struct PolicyResponse {
    #[serde(default)]
    result: Option<PolicyResult>,
}

/// HTTP backend holding the reqwest client and resolved endpoint.
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) endpoint: String,
}

impl HttpBackend {
    /// POST the query once. Transport failures are `Err`, everything the
    /// engine answers is an `Ok` outcome.
    pub(crate) async fn post_query(&self, input: &PolicyInput) -> AuthzResult<PolicyOutcome> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&PolicyQuery { input })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), endpoint = %self.endpoint, "policy engine status not OK");
            return Ok(PolicyOutcome::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| AuthzError::Transport {
            message: format!("failed to read policy response body: {}", e),
        })?;

        let outcome = parse_policy_body(&body);
        if let PolicyOutcome::Malformed { message } = &outcome {
            debug!(message = %message, "malformed policy response");
        }
        Ok(outcome)
    }
}

/// Map a 200 response body onto an outcome.
pub(crate) fn parse_policy_body(body: &str) -> PolicyOutcome {
    let response: PolicyResponse = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => {
            return PolicyOutcome::Malformed {
                message: format!("invalid JSON body: {}", e),
            }
        }
    };

    let Some(result) = response.result else {
        return PolicyOutcome::Malformed {
            message: "missing `result`".to_string(),
        };
    };

    match result.authorized {
        Some(serde_json::Value::Bool(authorized)) => PolicyOutcome::Decided { authorized },
        Some(other) => PolicyOutcome::Malformed {
            message: format!("non-boolean `authorized`: {}", other),
        },
        None => PolicyOutcome::Malformed {
            message: "missing `result.authorized`".to_string(),
        },
    }
}
