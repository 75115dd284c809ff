use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

pub const UNAUTHORIZED_MESSAGE: &str = "Action was either Unauthorized or not enabled";
const INTERNAL_ERROR_MESSAGE: &str = "An error occurred while processing your request";

/// The single result type of the request dispatcher. Every variant maps to one status code;
/// only the success variants carry entity JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// One entity (200)
    Entity(Value),
    /// A non-empty list of entities (200)
    List(Value),
    /// Write acknowledged without an entity body (200)
    Success,
    NoContent,
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    MethodNotAllowed(String),
    InternalError,
}

impl RequestOutcome {
    pub fn entity<T: Serialize>(entity: &T) -> Self {
        match serde_json::to_value(entity) {
            Ok(value) => RequestOutcome::Entity(value),
            Err(e) => {
                tracing::error!("Failed to serialize response entity: {}", e);
                RequestOutcome::InternalError
            }
        }
    }

    /// List outcome; an empty list is `NoContent`
    pub fn list<T: Serialize>(entities: &[T]) -> Self {
        if entities.is_empty() {
            return RequestOutcome::NoContent;
        }
        match serde_json::to_value(entities) {
            Ok(value) => RequestOutcome::List(value),
            Err(e) => {
                tracing::error!("Failed to serialize response list: {}", e);
                RequestOutcome::InternalError
            }
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        RequestOutcome::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        RequestOutcome::NotFound(message.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            RequestOutcome::Entity(_) | RequestOutcome::List(_) | RequestOutcome::Success => 200,
            RequestOutcome::NoContent => 204,
            RequestOutcome::BadRequest(_) => 400,
            RequestOutcome::Unauthorized => 401,
            RequestOutcome::NotFound(_) => 404,
            RequestOutcome::MethodNotAllowed(_) => 405,
            RequestOutcome::InternalError => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> Option<&str> {
        match self {
            RequestOutcome::NotFound(msg) | RequestOutcome::BadRequest(msg) | RequestOutcome::MethodNotAllowed(msg) => {
                Some(msg)
            }
            RequestOutcome::Unauthorized => Some(UNAUTHORIZED_MESSAGE),
            RequestOutcome::InternalError => Some(INTERNAL_ERROR_MESSAGE),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            RequestOutcome::BadRequest(_) => Some("BAD_REQUEST"),
            RequestOutcome::Unauthorized => Some("UNAUTHORIZED"),
            RequestOutcome::NotFound(_) => Some("NOT_FOUND"),
            RequestOutcome::MethodNotAllowed(_) => Some("METHOD_NOT_ALLOWED"),
            RequestOutcome::InternalError => Some("INTERNAL_SERVER_ERROR"),
            _ => None,
        }
    }

    /// Response body; `None` for 204
    pub fn to_json(&self) -> Option<Value> {
        match self {
            RequestOutcome::Entity(value) | RequestOutcome::List(value) => Some(value.clone()),
            RequestOutcome::Success => Some(json!({ "success": true })),
            RequestOutcome::NoContent => None,
            _ => Some(json!({
                "error": true,
                "message": self.message(),
                "code": self.error_code()
            })),
        }
    }
}

impl IntoResponse for RequestOutcome {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self {
            RequestOutcome::NoContent => status.into_response(),
            RequestOutcome::Entity(value) | RequestOutcome::List(value) => (status, Json(value)).into_response(),
            other => match other.to_json() {
                Some(body) => (status, Json(body)).into_response(),
                None => status.into_response(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(RequestOutcome::Entity(json!({})).status_code(), 200);
        assert_eq!(RequestOutcome::Success.status_code(), 200);
        assert_eq!(RequestOutcome::NoContent.status_code(), 204);
        assert_eq!(RequestOutcome::bad_request("x").status_code(), 400);
        assert_eq!(RequestOutcome::Unauthorized.status_code(), 401);
        assert_eq!(RequestOutcome::not_found("x").status_code(), 404);
        assert_eq!(RequestOutcome::MethodNotAllowed("PATCH".into()).status_code(), 405);
        assert_eq!(RequestOutcome::InternalError.status_code(), 500);
    }

    #[test]
    fn empty_lists_are_no_content() {
        assert_eq!(RequestOutcome::list::<i32>(&[]), RequestOutcome::NoContent);
        assert_eq!(RequestOutcome::list(&[1, 2]), RequestOutcome::List(json!([1, 2])));
        assert_eq!(RequestOutcome::NoContent.to_json(), None);
    }

    #[test]
    fn error_bodies_use_generic_messages() {
        let body = RequestOutcome::InternalError.to_json().unwrap();
        assert_eq!(body["error"], json!(true));
        assert_eq!(body["code"], json!("INTERNAL_SERVER_ERROR"));
        assert_eq!(body["message"], json!(INTERNAL_ERROR_MESSAGE));

        let body = RequestOutcome::Unauthorized.to_json().unwrap();
        assert_eq!(body["message"], json!(UNAUTHORIZED_MESSAGE));
    }

    #[test]
    fn no_content_response_has_empty_body() {
        let response = RequestOutcome::NoContent.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get("content-type").is_none());
    }
}
