use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
    routing::any,
    Router,
};

use crate::auth::AuthorizationConfiguration;
use crate::database::DataServiceAccessor;
use crate::entity::Entity;

use super::dispatcher::RequestHandler;
use super::outcome::RequestOutcome;
use super::request::DataServiceRequest;

/// `/api/{resource}` and `/api/{resource}/:key` for entity `T`, every verb routed to one dispatcher
pub fn entity_routes<T: Entity>(
    accessor: Arc<dyn DataServiceAccessor<T>>,
    authorization: Arc<AuthorizationConfiguration>,
) -> Router {
    let handler = Arc::new(RequestHandler::new(accessor, authorization));
    let resource = T::descriptor().resource;

    Router::new()
        .route(&format!("/api/{}", resource), any(collection::<T>))
        .route(&format!("/api/{}/:key", resource), any(item::<T>))
        .with_state(handler)
}

async fn collection<T: Entity>(
    State(handler): State<Arc<RequestHandler<T>>>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> RequestOutcome {
    let request = DataServiceRequest::new(method)
        .with_raw_query(query.as_deref())
        .with_headers(headers)
        .with_body(body);
    handler.handle_request(request).await
}

async fn item<T: Entity>(
    State(handler): State<Arc<RequestHandler<T>>>,
    Path(key): Path<String>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> RequestOutcome {
    let request = DataServiceRequest::new(method)
        .with_key(key)
        .with_raw_query(query.as_deref())
        .with_headers(headers)
        .with_body(body);
    handler.handle_request(request).await
}
