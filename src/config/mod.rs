use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub predicate: PredicateConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; `None` when the service runs against the in-memory store
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredicateConfig {
    pub max_expression_length: usize,
    pub max_clauses: usize,
    /// Deepest `(` / `!` nesting the parser will follow
    pub max_nested_depth: usize,
    /// Rows returned by a list read when the caller gives no `limit`; `None` is unbounded
    pub default_limit: Option<usize>,
    pub max_limit: usize,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_audit_logging: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // API overrides
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Predicate overrides
        if let Ok(v) = env::var("PREDICATE_MAX_EXPRESSION_LENGTH") {
            self.predicate.max_expression_length = v.parse().unwrap_or(self.predicate.max_expression_length);
        }
        if let Ok(v) = env::var("PREDICATE_MAX_CLAUSES") {
            self.predicate.max_clauses = v.parse().unwrap_or(self.predicate.max_clauses);
        }
        if let Ok(v) = env::var("PREDICATE_MAX_NESTED_DEPTH") {
            self.predicate.max_nested_depth = v.parse().unwrap_or(self.predicate.max_nested_depth);
        }
        if let Ok(v) = env::var("PREDICATE_DEFAULT_LIMIT") {
            self.predicate.default_limit = v.parse().ok();
        }
        if let Ok(v) = env::var("PREDICATE_MAX_LIMIT") {
            self.predicate.max_limit = v.parse().unwrap_or(self.predicate.max_limit);
        }
        if let Ok(v) = env::var("PREDICATE_DEBUG_LOGGING") {
            self.predicate.debug_logging = v.parse().unwrap_or(self.predicate.debug_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                acquire_timeout_secs: 30,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 7071,
                max_request_size_bytes: 10 * 1024 * 1024,
                enable_request_logging: true,
            },
            predicate: PredicateConfig {
                max_expression_length: 2048,
                max_clauses: 32,
                max_nested_depth: 16,
                default_limit: None,
                max_limit: 10_000,
                debug_logging: true,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string()],
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7,
                enable_audit_logging: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                acquire_timeout_secs: 10,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 7071,
                max_request_size_bytes: 5 * 1024 * 1024,
                enable_request_logging: true,
            },
            predicate: PredicateConfig {
                max_expression_length: 1024,
                max_clauses: 16,
                max_nested_depth: 10,
                default_limit: Some(1000),
                max_limit: 5000,
                debug_logging: false,
            },
            security: SecurityConfig {
                cors_origins: vec![],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_audit_logging: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                acquire_timeout_secs: 5,
                enable_query_logging: false,
            },
            api: ApiConfig {
                port: 7071,
                max_request_size_bytes: 2 * 1024 * 1024,
                enable_request_logging: false,
            },
            predicate: PredicateConfig {
                max_expression_length: 512,
                max_clauses: 8,
                max_nested_depth: 6,
                default_limit: Some(500),
                max_limit: 1000,
                debug_logging: false,
            },
            security: SecurityConfig {
                cors_origins: vec![],
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_audit_logging: true,
            },
        }
    }
}

impl PredicateConfig {
    /// Effective row cap for a list read given the caller's `limit`
    pub fn effective_limit(&self, requested: Option<usize>) -> Option<usize> {
        match requested.or(self.default_limit) {
            Some(n) if n > self.max_limit => {
                if self.debug_logging {
                    tracing::warn!("Limit {} exceeds max {}, capping to max", n, self.max_limit);
                }
                Some(self.max_limit)
            }
            other => other,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
