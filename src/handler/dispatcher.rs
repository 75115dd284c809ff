use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::http::Method;
use futures::FutureExt;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::auth::{AuthorizationConfiguration, Capability, RequestContext};
use crate::config::CONFIG;
use crate::database::{DataServiceAccessor, DataServiceError, Selection};
use crate::entity::{Entity, FieldValue};
use crate::predicate::{Predicate, PredicateCompiler};

use super::outcome::RequestOutcome;
use super::request::DataServiceRequest;

const NO_KEY_PROVIDED: &str = "No Key Provided";
const DESERIALIZE_FAILED: &str = "Failed to deserialize Record";

/// Generic CRUD dispatcher for one entity type: authorizes, validates, calls the accessor
/// and maps the result to a [`RequestOutcome`].
pub struct RequestHandler<T: Entity> {
    accessor: Arc<dyn DataServiceAccessor<T>>,
    authorization: Arc<AuthorizationConfiguration>,
    compiler: PredicateCompiler,
}

/// Validated shape of a GET without key
struct CollectionQuery {
    predicate: Option<Predicate>,
    single: bool,
    limit: Option<usize>,
}

impl<T: Entity> RequestHandler<T> {
    pub fn new(accessor: Arc<dyn DataServiceAccessor<T>>, authorization: Arc<AuthorizationConfiguration>) -> Self {
        Self {
            accessor,
            authorization,
            compiler: PredicateCompiler::new(T::descriptor()),
        }
    }

    pub fn with_compiler(mut self, compiler: PredicateCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Handle one request. Never panics and never leaks internal error detail.
    pub async fn handle_request(&self, request: DataServiceRequest) -> RequestOutcome {
        let resource = T::descriptor().resource;
        let method = request.method.clone();
        info!("{} {}{}", method, resource, request.key.as_deref().map(|k| format!("/{}", k)).unwrap_or_default());

        match AssertUnwindSafe(self.dispatch(request)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<String>()
                    .map(String::as_str)
                    .or_else(|| panic.downcast_ref::<&str>().copied())
                    .unwrap_or("unknown panic");
                error!("Panic while handling {} {}: {}", method, resource, detail);
                RequestOutcome::InternalError
            }
        }
    }

    async fn dispatch(&self, request: DataServiceRequest) -> RequestOutcome {
        let capability = match request.method {
            Method::GET if request.key.is_some() => Capability::Get,
            Method::GET if self.is_predicate_read(&request) => Capability::GetWithPredicate,
            Method::GET => Capability::Get,
            Method::POST => Capability::Post,
            Method::PUT => Capability::Put,
            Method::DELETE => Capability::Delete,
            ref other => {
                warn!("Unsupported method {} for {}", other, T::descriptor().resource);
                return RequestOutcome::MethodNotAllowed(format!("Method {} is not supported", other));
            }
        };

        if !self.authorize(&request, capability) {
            return RequestOutcome::Unauthorized;
        }

        match capability {
            Capability::Get | Capability::GetWithPredicate => match request.key.as_deref() {
                Some(key) => self.get_by_key(key).await,
                None => self.get_collection(&request).await,
            },
            Capability::Post => self.post(&request).await,
            Capability::Put => match request.key.as_deref() {
                Some(key) => self.put(key, &request).await,
                None => RequestOutcome::bad_request(NO_KEY_PROVIDED),
            },
            Capability::Delete => match request.key.as_deref() {
                Some(key) => self.delete(key).await,
                None => RequestOutcome::bad_request(NO_KEY_PROVIDED),
            },
        }
    }

    /// A GET without key that filters: either a `query` expression or a field-equality param
    fn is_predicate_read(&self, request: &DataServiceRequest) -> bool {
        request.param("query").is_some()
            || request.filters().any(|(name, _)| T::descriptor().field(name).is_some())
    }

    fn authorize(&self, request: &DataServiceRequest, capability: Capability) -> bool {
        let context = RequestContext {
            resource: T::descriptor().resource,
            method: request.method.clone(),
            capability,
            key: request.key.clone(),
            query: request.query_map(),
            headers: request.headers.clone(),
        };

        let allowed = self.authorization.is_authorized(&context);
        if !allowed {
            warn!("Denied {} on {}", capability, context.resource);
        } else if CONFIG.security.enable_audit_logging {
            info!("Allowed {} on {}", capability, context.resource);
        }
        allowed
    }

    fn parse_key(&self, raw: &str) -> Result<FieldValue, RequestOutcome> {
        T::descriptor()
            .parse_key(raw)
            .map_err(|e| RequestOutcome::bad_request(format!("Invalid key: {}", e)))
    }

    async fn get_by_key(&self, raw_key: &str) -> RequestOutcome {
        let key = match self.parse_key(raw_key) {
            Ok(key) => key,
            Err(outcome) => return outcome,
        };
        match self.accessor.get_by_key(&key).await {
            Ok(Some(entity)) => RequestOutcome::entity(&entity),
            Ok(None) => RequestOutcome::not_found(format!("No record found with key {}", raw_key)),
            Err(e) => self.store_failure("read", e),
        }
    }

    async fn get_collection(&self, request: &DataServiceRequest) -> RequestOutcome {
        let query = match self.collection_query(request) {
            Ok(query) => query,
            Err(outcome) => return outcome,
        };
        let limit = CONFIG.predicate.effective_limit(query.limit);

        if query.predicate.is_none() && !query.single {
            return match self.accessor.get_all(limit).await {
                Ok(rows) => RequestOutcome::list(&rows),
                Err(e) => self.store_failure("read", e),
            };
        }

        let predicate = query.predicate.unwrap_or_else(Predicate::all);
        match self.accessor.get_by_predicate(&predicate, query.single, limit).await {
            Ok(Selection::One(Some(entity))) => RequestOutcome::entity(&entity),
            Ok(Selection::One(None)) => RequestOutcome::NoContent,
            Ok(Selection::Many(rows)) => RequestOutcome::list(&rows),
            Err(e) => self.store_failure("read", e),
        }
    }

    fn collection_query(&self, request: &DataServiceRequest) -> Result<CollectionQuery, RequestOutcome> {
        let single = match request.param("single") {
            None => false,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" | "" => false,
                _ => return Err(RequestOutcome::bad_request(format!("Invalid value for single: {}", raw))),
            },
        };

        let limit = match request.param("limit") {
            None => None,
            Some(raw) => Some(
                raw.trim()
                    .parse::<usize>()
                    .map_err(|_| RequestOutcome::bad_request(format!("Invalid value for limit: {}", raw)))?,
            ),
        };

        let mut predicate = match request.param("query") {
            Some(text) => Some(self.compiler.compile(text).map_err(|e| {
                warn!("Rejected predicate for {}: {}", T::descriptor().resource, e);
                RequestOutcome::bad_request(e.to_string())
            })?),
            None => None,
        };

        for (name, raw) in request.filters() {
            match self.compiler.field_equals(name, raw) {
                Ok(Some(condition)) => {
                    predicate = Some(match predicate {
                        Some(existing) => existing.and(condition),
                        None => condition,
                    });
                }
                Ok(None) => warn!("Ignoring unknown query parameter '{}' for {}", name, T::descriptor().resource),
                Err(e) => return Err(RequestOutcome::bad_request(e.to_string())),
            }
        }

        Ok(CollectionQuery { predicate, single, limit })
    }

    async fn post(&self, request: &DataServiceRequest) -> RequestOutcome {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(e) => return self.undeserializable(e),
        };

        match body {
            Value::Array(items) => {
                if items.is_empty() {
                    return RequestOutcome::bad_request("Request body contains no records");
                }
                let entities = match items
                    .into_iter()
                    .map(serde_json::from_value::<T>)
                    .collect::<Result<Vec<T>, _>>()
                {
                    Ok(entities) => entities,
                    Err(e) => return self.undeserializable(e),
                };
                match self.accessor.insert_many(entities).await {
                    Ok(stored) => RequestOutcome::list(&stored),
                    Err(e) => self.store_failure("insert", e),
                }
            }
            Value::Object(_) => {
                let entity = match serde_json::from_value::<T>(body) {
                    Ok(entity) => entity,
                    Err(e) => return self.undeserializable(e),
                };
                match self.accessor.insert(entity).await {
                    Ok(stored) => RequestOutcome::entity(&stored),
                    Err(e) => self.store_failure("insert", e),
                }
            }
            _ => RequestOutcome::bad_request("Request body must be a JSON object or an array of objects"),
        }
    }

    async fn put(&self, raw_key: &str, request: &DataServiceRequest) -> RequestOutcome {
        let key = match self.parse_key(raw_key) {
            Ok(key) => key,
            Err(outcome) => return outcome,
        };

        let mut body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(e) => return self.undeserializable(e),
        };
        // The path key is authoritative; the body may omit it or carry another value
        match body.as_object_mut() {
            Some(fields) => {
                fields.insert(T::descriptor().key.name.to_string(), key.to_json());
            }
            None => return RequestOutcome::bad_request("Request body must be a JSON object"),
        }
        let entity = match serde_json::from_value::<T>(body) {
            Ok(entity) => entity,
            Err(e) => return self.undeserializable(e),
        };

        match self.accessor.update(&key, entity).await {
            Ok(Some(updated)) => RequestOutcome::entity(&updated),
            Ok(None) => RequestOutcome::not_found(format!("No record found with key {}", raw_key)),
            Err(e) => self.store_failure("update", e),
        }
    }

    async fn delete(&self, raw_key: &str) -> RequestOutcome {
        let key = match self.parse_key(raw_key) {
            Ok(key) => key,
            Err(outcome) => return outcome,
        };
        match self.accessor.delete(&key).await {
            Ok(true) => RequestOutcome::Success,
            Ok(false) => RequestOutcome::not_found(format!("No record found with key {}", raw_key)),
            Err(e) => self.store_failure("delete", e),
        }
    }

    /// Body parse failures are logged in full; the caller only sees a fixed message
    fn undeserializable(&self, err: serde_json::Error) -> RequestOutcome {
        warn!("Rejected {} request body: {}", T::descriptor().resource, err);
        RequestOutcome::bad_request(DESERIALIZE_FAILED)
    }

    fn store_failure(&self, action: &str, err: DataServiceError) -> RequestOutcome {
        let resource = T::descriptor().resource;
        match err {
            DataServiceError::AmbiguousMatch => {
                warn!("Single {} read on {} matched more than one record", action, resource);
                RequestOutcome::bad_request("More than one record matched a single-record query")
            }
            err if err.is_client_error() => {
                warn!("Failed to {} {} record: {}", action, resource, err);
                RequestOutcome::bad_request(format!("Failed to {} record: it violates a data constraint", action))
            }
            other => {
                error!("Failed to {} {} record: {}", action, resource, other);
                RequestOutcome::InternalError
            }
        }
    }
}
