use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("JWT secret not configured")]
    SecretNotConfigured,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, roles: Vec<String>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self { sub: sub.into(), roles, exp, iat: now.timestamp() }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Sign `claims` with the configured secret
pub fn generate_token(claims: &Claims) -> Result<String, AuthError> {
    generate_token_with(claims, &config::config().security.jwt_secret)
}

pub fn generate_token_with(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::SecretNotConfigured);
    }
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Validate an HS256 token and return its claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::SecretNotConfigured);
    }
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
    Ok(token_data.claims)
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers.get(axum::http::header::AUTHORIZATION).ok_or(AuthError::MissingHeader)?;
    let value = header.to_str().map_err(|_| AuthError::MalformedHeader)?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn round_trips_claims() {
        let claims = Claims::new("operator", vec!["reader".into()]);
        let token = generate_token_with(&claims, SECRET).unwrap();
        let decoded = validate_token(&token, SECRET).unwrap();
        assert_eq!(decoded, claims);
        assert!(decoded.has_role("reader"));
        assert!(!decoded.has_role("writer"));
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let claims = Claims::new("operator", vec![]);
        let token = generate_token_with(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, "other"), Err(AuthError::InvalidToken(_))));

        let expired = Claims { exp: Utc::now().timestamp() - 3600, ..claims };
        let token = generate_token_with(&expired, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(AuthError::InvalidToken(_))));

        assert_eq!(generate_token_with(&expired, ""), Err(AuthError::SecretNotConfigured));
    }

    #[test]
    fn extracts_bearer_tokens() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), Err(AuthError::MissingHeader));

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), Err(AuthError::MalformedHeader));

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Ok("abc.def.ghi"));
    }
}
