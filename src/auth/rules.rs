use tracing::debug;

use super::token::{bearer_token, validate_token};
use super::RequestContext;
use crate::config;

pub fn allow() -> impl Fn(&RequestContext) -> bool + Send + Sync + 'static {
    |_| true
}

pub fn deny() -> impl Fn(&RequestContext) -> bool + Send + Sync + 'static {
    |_| false
}

/// Allow requests carrying a valid bearer token whose `roles` claim includes `role`
pub fn bearer_role(role: impl Into<String>) -> impl Fn(&RequestContext) -> bool + Send + Sync + 'static {
    let role = role.into();
    move |ctx: &RequestContext| {
        let secret = &config::config().security.jwt_secret;
        match bearer_token(&ctx.headers).and_then(|token| validate_token(token, secret)) {
            Ok(claims) if claims.has_role(&role) => true,
            Ok(claims) => {
                debug!("Token for '{}' lacks role '{}' for {} {}", claims.sub, role, ctx.capability, ctx.resource);
                false
            }
            Err(e) => {
                debug!("Bearer check failed for {} {}: {}", ctx.capability, ctx.resource, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::{generate_token, Claims};
    use crate::auth::Capability;
    use axum::http::{HeaderMap, HeaderValue, Method};
    use std::collections::HashMap;

    fn context(authorization: Option<&str>) -> RequestContext {
        let mut headers = HeaderMap::new();
        if let Some(value) = authorization {
            headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        }
        RequestContext {
            resource: "exception-management",
            method: Method::POST,
            capability: Capability::Post,
            key: None,
            query: HashMap::new(),
            headers,
        }
    }

    #[test]
    fn bearer_role_requires_matching_role() {
        let rule = bearer_role("writer");
        let writer = generate_token(&Claims::new("svc", vec!["writer".into()])).unwrap();
        let reader = generate_token(&Claims::new("svc", vec!["reader".into()])).unwrap();

        assert!(rule(&context(Some(&format!("Bearer {}", writer)))));
        assert!(!rule(&context(Some(&format!("Bearer {}", reader)))));
        assert!(!rule(&context(Some("Bearer not-a-token"))));
        assert!(!rule(&context(None)));
    }

    #[test]
    fn constant_rules() {
        assert!(allow()(&context(None)));
        assert!(!deny()(&context(None)));
    }
}
