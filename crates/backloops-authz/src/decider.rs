//! Authorization decisions.
//!
//! Local checks run first and never suspend:
//!
//! 1. no token data: deny
//! 2. server token: allow
//! 3. exactly one target equal to the token's user id: allow
//!
//! Anything else is delegated to the policy engine. Transport failures,
//! non-200 answers and malformed bodies all deny.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::client::{OpaClient, PolicyEvaluator, PolicyOutcome};
use crate::error::AuthzResult;
use crate::normalize::build_policy_input;
use crate::types::{AdditionalData, AuthzConfig, RequestContext, TokenData};

/// Terminal state reached by a single authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No token data on the request.
    LocalDeny,
    /// Server token.
    ServerAllow,
    /// Single target equal to the caller.
    SelfAllow,
    /// Policy engine allowed.
    RemoteAllow,
    /// Policy engine refused, answered with a non-200 status, or sent a
    /// body without a boolean decision.
    RemoteDeny,
    /// Policy engine unreachable.
    RemoteErrorDeny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::ServerAllow | Self::SelfAllow | Self::RemoteAllow)
    }

    /// Whether the policy engine was consulted.
    pub fn is_remote(self) -> bool {
        matches!(
            self,
            Self::RemoteAllow | Self::RemoteDeny | Self::RemoteErrorDeny
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalDeny => "local-deny",
            Self::ServerAllow => "local-server-allow",
            Self::SelfAllow => "local-self-allow",
            Self::RemoteAllow => "remote-allow",
            Self::RemoteDeny => "remote-deny",
            Self::RemoteErrorDeny => "remote-error-deny",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers whether a request may act on behalf of a set of users.
///
/// Cheap to clone; holds no per-call state.
#[derive(Debug)]
pub struct Authorizer<E = OpaClient> {
    config: Arc<AuthzConfig>,
    evaluator: Arc<E>,
}

impl<E> Clone for Authorizer<E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            evaluator: Arc::clone(&self.evaluator),
        }
    }
}

impl Authorizer<OpaClient> {
    /// Authorizer backed by an [`OpaClient`] built from `config`.
    pub fn new(config: AuthzConfig) -> AuthzResult<Self> {
        let client = OpaClient::new(&config)?;
        Ok(Self::with_evaluator(config, client))
    }

    pub fn from_env() -> AuthzResult<Self> {
        Self::new(AuthzConfig::from_env())
    }
}

impl<E: PolicyEvaluator> Authorizer<E> {
    pub fn with_evaluator(config: AuthzConfig, evaluator: E) -> Self {
        Self {
            config: Arc::new(config),
            evaluator: Arc::new(evaluator),
        }
    }

    pub fn config(&self) -> &AuthzConfig {
        &self.config
    }

    /// Whether `ctx` may act on behalf of `target_user_ids`.
    ///
    /// Never fails: every error path answers `false`.
    pub async fn is_authorized<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        target_user_ids: &[S],
        data: &AdditionalData,
    ) -> bool {
        self.decide(ctx, target_user_ids, data).await.is_allowed()
    }

    /// Like [`Self::is_authorized`], reporting which rule decided.
    pub async fn decide<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        target_user_ids: &[S],
        data: &AdditionalData,
    ) -> Decision {
        let Some(token) = ctx.token_data.as_ref() else {
            debug!("no token data, denying");
            return Decision::LocalDeny;
        };

        if token.is_server {
            debug!("server token, allowing");
            return Decision::ServerAllow;
        }

        if is_sole_target(token, target_user_ids) {
            debug!("request for self, allowing");
            return Decision::SelfAllow;
        }

        let input = build_policy_input(ctx, data, &self.config);
        debug!(
            targets = target_user_ids.len(),
            "delegating to policy engine"
        );

        match self.evaluator.evaluate(&input).await {
            Ok(PolicyOutcome::Decided { authorized: true }) => Decision::RemoteAllow,
            Ok(PolicyOutcome::Decided { authorized: false }) => Decision::RemoteDeny,
            Ok(PolicyOutcome::UnexpectedStatus { status }) => {
                warn!(status, "policy engine status not OK, denying");
                Decision::RemoteDeny
            }
            Ok(PolicyOutcome::Malformed { message }) => {
                warn!(message = %message, "no usable policy result, denying");
                Decision::RemoteDeny
            }
            Err(e) => {
                error!(error = %e, "policy request failed, denying");
                Decision::RemoteErrorDeny
            }
        }
    }

    /// True iff the request carries a server token. Targets are ignored.
    pub fn server_authorized<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        _target_user_ids: &[S],
    ) -> bool {
        ctx.token_data.as_ref().is_some_and(|t| t.is_server)
    }

    /// True iff the request carries a server token, or a user token whose
    /// id is the one and only target.
    pub fn self_authorized<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        target_user_ids: &[S],
    ) -> bool {
        ctx.token_data
            .as_ref()
            .is_some_and(|t| t.is_server || is_sole_target(t, target_user_ids))
    }
}

/// Strict equality against a single-element target list. A list holding the
/// caller's id among others does not match.
fn is_sole_target<S: AsRef<str>>(token: &TokenData, target_user_ids: &[S]) -> bool {
    match (token.user_id.as_deref(), target_user_ids) {
        (Some(user_id), [only]) => only.as_ref() == user_id,
        _ => false,
    }
}
