use async_trait::async_trait;
use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::entity::{Entity, FieldValue};
use crate::predicate::Predicate;

/// Typed failure from an entity store. "Row not found" is not an error; it is reported
/// through `Option`/`bool` results so callers can answer 404 without inspecting errors.
#[derive(Debug, Error)]
pub enum DataServiceError {
    /// A store constraint rejected the write (duplicate key, missing required value)
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A single-row read matched more than one row
    #[error("Expected at most one matching row")]
    AmbiguousMatch,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Row could not be decoded: {0}")]
    Serialization(String),
}

impl DataServiceError {
    /// Whether the failure is attributable to the caller's input rather than the store
    pub fn is_client_error(&self) -> bool {
        matches!(self, DataServiceError::Constraint(_) | DataServiceError::AmbiguousMatch)
    }
}

impl From<sqlx::Error> for DataServiceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            // SQLSTATE class 23: integrity constraint violation
            sqlx::Error::Database(db) if db.code().map(|c| c.starts_with("23")).unwrap_or(false) => {
                DataServiceError::Constraint(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DataServiceError::Unavailable(err.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
                DataServiceError::Serialization(err.to_string())
            }
            _ => DataServiceError::Query(err.to_string()),
        }
    }
}

impl From<DatabaseError> for DataServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Sqlx(e) => e.into(),
            other => DataServiceError::Unavailable(other.to_string()),
        }
    }
}

/// Result of a predicate read: one optional row in single mode, otherwise a list
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<T> {
    One(Option<T>),
    Many(Vec<T>),
}

/// CRUD gateway for one entity type.
///
/// List reads are ordered by key ascending. Writes are atomic per call: `insert_many`
/// persists every row or none of them.
#[async_trait]
pub trait DataServiceAccessor<T: Entity>: Send + Sync {
    async fn get_by_key(&self, key: &FieldValue) -> Result<Option<T>, DataServiceError>;

    async fn get_all(&self, limit: Option<usize>) -> Result<Vec<T>, DataServiceError>;

    /// In single mode the predicate must match zero or one rows; more is `AmbiguousMatch`.
    async fn get_by_predicate(
        &self,
        predicate: &Predicate,
        single: bool,
        limit: Option<usize>,
    ) -> Result<Selection<T>, DataServiceError>;

    /// Returns the row as stored, with any generated key filled in.
    async fn insert(&self, entity: T) -> Result<T, DataServiceError>;

    async fn insert_many(&self, entities: Vec<T>) -> Result<Vec<T>, DataServiceError>;

    /// `None` when no row has `key`.
    async fn update(&self, key: &FieldValue, entity: T) -> Result<Option<T>, DataServiceError>;

    /// `false` when no row has `key`.
    async fn delete(&self, key: &FieldValue) -> Result<bool, DataServiceError>;
}
