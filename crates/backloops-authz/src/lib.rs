//! Authorization client for services acting on behalf of users.
//!
//! Answers one question: may this request act on behalf of these target
//! user ids? Cheap local checks short-circuit first:
//!
//! - no token data on the request: denied
//! - server token: allowed
//! - a single target equal to the token's user id: allowed
//!
//! Everything else is normalized into a canonical policy input and sent to
//! an OPA policy engine at `POST {OPA_HOST}/v1/data/backloops/access`. The
//! engine's `result.authorized` decides. Unreachable engines, non-200
//! answers and malformed bodies all deny.
//!
//! # Quick Start
//!
//! ```no_run
//! use backloops_authz::{AdditionalData, Authorizer, RequestContext, TokenData};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let authz = Authorizer::from_env()?;
//!
//! let ctx = RequestContext::default()
//!     .with_token_data(TokenData::user("1234"))
//!     .with_method("GET")
//!     .with_path("/v1/users/5678/data");
//!
//! if authz.is_authorized(&ctx, &["5678"], &AdditionalData::new()).await {
//!     println!("allowed");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `OPA_HOST` | Policy engine base URL (default: empty) |
//! | `SERVICE_NAME` | Service identity sent with each query (default: empty) |
//! | `OPA_TIMEOUT` | Request timeout in seconds (default: 10) |

pub mod client;
pub mod decider;
pub mod error;
pub mod normalize;
pub mod types;

// Re-export main types
pub use client::{OpaClient, PolicyEvaluator, PolicyOutcome, ACCESS_ROUTE, AUTHZ_USER_AGENT};
pub use decider::{Authorizer, Decision};
pub use error::{AuthzError, AuthzResult};
pub use normalize::{build_policy_input, normalize_request};
pub use types::{
    AdditionalData, AuthzConfig, PolicyInput, PolicyRequest, PolicyResult, RequestContext,
    TokenData,
};
