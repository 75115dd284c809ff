//! Per-verb authorization for the data services.
//!
//! Each entity route holds one immutable [`AuthorizationConfiguration`], built at start-up.
//! The dispatcher evaluates exactly one of its five rules per request, before touching the store.

pub mod rules;
pub mod token;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderMap, Method};

pub use token::{bearer_token, generate_token, validate_token, AuthError, Claims};

/// The five independently gated operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Get,
    GetWithPredicate,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Get => "get",
            Capability::GetWithPredicate => "get-with-predicate",
            Capability::Post => "post",
            Capability::Put => "put",
            Capability::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// What a rule gets to see about the request being authorized
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub resource: &'static str,
    pub method: Method,
    pub capability: Capability,
    pub key: Option<String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
}

pub type AccessRule = Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct AuthorizationConfiguration {
    get: AccessRule,
    get_with_predicate: AccessRule,
    post: AccessRule,
    put: AccessRule,
    delete: AccessRule,
}

impl AuthorizationConfiguration {
    pub fn new<G, Q, P, U, D>(get: G, get_with_predicate: Q, post: P, put: U, delete: D) -> Self
    where
        G: Fn(&RequestContext) -> bool + Send + Sync + 'static,
        Q: Fn(&RequestContext) -> bool + Send + Sync + 'static,
        P: Fn(&RequestContext) -> bool + Send + Sync + 'static,
        U: Fn(&RequestContext) -> bool + Send + Sync + 'static,
        D: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            get_with_predicate: Arc::new(get_with_predicate),
            post: Arc::new(post),
            put: Arc::new(put),
            delete: Arc::new(delete),
        }
    }

    pub fn allow_all() -> Self {
        Self::new(rules::allow(), rules::allow(), rules::allow(), rules::allow(), rules::allow())
    }

    pub fn deny_all() -> Self {
        Self::new(rules::deny(), rules::deny(), rules::deny(), rules::deny(), rules::deny())
    }

    /// Both reads allowed, every write denied
    pub fn read_only() -> Self {
        Self::new(rules::allow(), rules::allow(), rules::deny(), rules::deny(), rules::deny())
    }

    pub fn rule(&self, capability: Capability) -> &AccessRule {
        match capability {
            Capability::Get => &self.get,
            Capability::GetWithPredicate => &self.get_with_predicate,
            Capability::Post => &self.post,
            Capability::Put => &self.put,
            Capability::Delete => &self.delete,
        }
    }

    pub fn is_authorized(&self, context: &RequestContext) -> bool {
        (self.rule(context.capability))(context)
    }
}

impl fmt::Debug for AuthorizationConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationConfiguration").finish_non_exhaustive()
    }
}
