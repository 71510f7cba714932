//! Request normalization into the canonical policy input.
//!
//! Pure and total: missing request fields degrade to empty defaults.

use crate::types::{AdditionalData, AuthzConfig, PolicyInput, PolicyRequest, RequestContext};

/// Map a request context onto the `request` member of the policy input.
pub fn normalize_request(ctx: &RequestContext, service: &str) -> PolicyRequest {
    let headers = ctx.headers.clone().unwrap_or_default();
    let host = headers.get("host").cloned().unwrap_or_default();

    PolicyRequest {
        method: ctx.method.clone().unwrap_or_default(),
        protocol: format!("HTTP/{}", ctx.http_version.as_deref().unwrap_or("")),
        host,
        path: ctx.path.clone().unwrap_or_default(),
        query: ctx.query.clone().unwrap_or_default(),
        service: service.to_string(),
        headers,
    }
}

/// Build the policy input for a request and the caller's additional data.
pub fn build_policy_input(
    ctx: &RequestContext,
    data: &AdditionalData,
    config: &AuthzConfig,
) -> PolicyInput {
    PolicyInput {
        request: normalize_request(ctx, &config.service_name),
        data: data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> AuthzConfig {
        AuthzConfig::default().with_service_name("test-service")
    }

    fn full_request() -> RequestContext {
        RequestContext::default()
            .with_header("host", "http://test")
            .with_header("custom-header", "test")
            .with_method("TEST")
            .with_http_version("1.5")
            .with_path("/route/subroute")
            .with_query("var1=2&var2=2")
    }

    #[test]
    fn test_empty_request_defaults() {
        let request = normalize_request(&RequestContext::default(), "test-service");

        assert!(request.headers.is_empty());
        assert_eq!(request.method, "");
        assert_eq!(request.protocol, "HTTP/");
        assert_eq!(request.host, "");
        assert_eq!(request.path, "");
        assert_eq!(request.query, "");
        assert_eq!(request.service, "test-service");
    }

    #[test]
    fn test_full_request() {
        let request = normalize_request(&full_request(), "test-service");

        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.method, "TEST");
        assert_eq!(request.protocol, "HTTP/1.5");
        assert_eq!(request.host, "http://test");
        assert_eq!(request.path, "/route/subroute");
        assert_eq!(request.query, "var1=2&var2=2");
    }

    #[test]
    fn test_headers_without_host() {
        let ctx = RequestContext::default().with_header("accept", "application/json");
        let request = normalize_request(&ctx, "");

        assert_eq!(request.host, "");
        assert_eq!(request.service, "");
        assert_eq!(
            request.headers.get("accept").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_policy_input_wire_shape() {
        let mut data = AdditionalData::new();
        data.insert("test".to_string(), json!("test0"));

        let input = build_policy_input(&full_request(), &data, &config());

        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({
                "request": {
                    "headers": { "host": "http://test", "custom-header": "test" },
                    "method": "TEST",
                    "protocol": "HTTP/1.5",
                    "host": "http://test",
                    "path": "/route/subroute",
                    "query": "var1=2&var2=2",
                    "service": "test-service"
                },
                "data": { "test": "test0" }
            })
        );
    }

    #[test]
    fn test_deterministic_serialization() {
        let mut data = AdditionalData::new();
        data.insert("zeta".to_string(), json!(1));
        data.insert("alpha".to_string(), json!({ "b": 2, "a": 1 }));
        let ctx = full_request()
            .with_header("x-b", "2")
            .with_header("x-a", "1");

        let first = serde_json::to_vec(&build_policy_input(&ctx, &data, &config())).unwrap();
        let second = serde_json::to_vec(&build_policy_input(&ctx, &data, &config())).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_token_data_not_forwarded() {
        let ctx = full_request().with_token_data(crate::types::TokenData::user("1234"));
        let input = build_policy_input(&ctx, &AdditionalData::new(), &config());
        let wire = serde_json::to_string(&input).unwrap();

        assert!(!wire.contains("1234"));
    }
}
