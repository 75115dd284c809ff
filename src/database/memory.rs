use std::cmp::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::accessor::{DataServiceAccessor, DataServiceError, Selection};
use crate::entity::{Entity, FieldValue};
use crate::predicate::Predicate;

/// Process-local entity store with the same contract as the Postgres accessor: unique keys,
/// NOT NULL on non-nullable fields, identity assignment for generated integer keys, and
/// all-or-nothing bulk inserts.
pub struct InMemoryDataServiceAccessor<T> {
    rows: RwLock<Vec<T>>,
}

impl<T: Entity> Default for InMemoryDataServiceAccessor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> InMemoryDataServiceAccessor<T> {
    pub fn new() -> Self {
        Self { rows: RwLock::new(Vec::new()) }
    }

    /// Store pre-populated with `rows`, which are taken as already valid
    pub fn with_rows(rows: Vec<T>) -> Self {
        Self { rows: RwLock::new(rows) }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    fn sorted(mut rows: Vec<T>) -> Vec<T> {
        rows.sort_by(|a, b| a.key().compare(&b.key()).unwrap_or(Ordering::Equal));
        rows
    }

    fn next_identity(rows: &[T]) -> i64 {
        rows.iter()
            .filter_map(|row| match row.key() {
                FieldValue::Integer(i) => Some(i),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Validate `entity` against `rows` and assign its identity if needed.
    fn prepare(rows: &[T], mut entity: T) -> Result<T, DataServiceError> {
        let descriptor = T::descriptor();

        let unset = matches!(entity.key(), FieldValue::Null | FieldValue::Integer(0));
        if descriptor.key.generated && unset {
            entity
                .set_key(FieldValue::Integer(Self::next_identity(rows)))
                .map_err(|e| DataServiceError::Constraint(e.to_string()))?;
        }

        for (def, value) in entity.values() {
            if !def.nullable && value.is_null() {
                return Err(DataServiceError::Constraint(format!(
                    "null value in column \"{}\" violates not-null constraint",
                    def.column
                )));
            }
        }

        let key = entity.key();
        if rows.iter().any(|row| row.key() == key) {
            return Err(DataServiceError::Constraint(format!(
                "duplicate key value {} violates unique constraint on \"{}\"",
                key, descriptor.key.column
            )));
        }

        Ok(entity)
    }
}

#[async_trait]
impl<T: Entity> DataServiceAccessor<T> for InMemoryDataServiceAccessor<T> {
    async fn get_by_key(&self, key: &FieldValue) -> Result<Option<T>, DataServiceError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| &row.key() == key).cloned())
    }

    async fn get_all(&self, limit: Option<usize>) -> Result<Vec<T>, DataServiceError> {
        let rows = self.rows.read().await;
        let mut all = Self::sorted(rows.clone());
        if let Some(limit) = limit {
            all.truncate(limit);
        }
        Ok(all)
    }

    async fn get_by_predicate(
        &self,
        predicate: &Predicate,
        single: bool,
        limit: Option<usize>,
    ) -> Result<Selection<T>, DataServiceError> {
        let rows = self.rows.read().await;
        let mut matched = Self::sorted(rows.iter().filter(|row| predicate.matches(*row)).cloned().collect());

        if single {
            if matched.len() > 1 {
                return Err(DataServiceError::AmbiguousMatch);
            }
            return Ok(Selection::One(matched.pop()));
        }

        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        Ok(Selection::Many(matched))
    }

    async fn insert(&self, entity: T) -> Result<T, DataServiceError> {
        let mut rows = self.rows.write().await;
        let stored = Self::prepare(&rows, entity)?;
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn insert_many(&self, entities: Vec<T>) -> Result<Vec<T>, DataServiceError> {
        let mut rows = self.rows.write().await;

        // Validate against a scratch copy; the store is only touched once every row passes
        let mut staged = rows.clone();
        let mut stored = Vec::with_capacity(entities.len());
        for entity in entities {
            let row = Self::prepare(&staged, entity)?;
            staged.push(row.clone());
            stored.push(row);
        }

        *rows = staged;
        Ok(stored)
    }

    async fn update(&self, key: &FieldValue, entity: T) -> Result<Option<T>, DataServiceError> {
        let mut rows = self.rows.write().await;
        let Some(position) = rows.iter().position(|row| &row.key() == key) else {
            return Ok(None);
        };

        let mut replacement = entity;
        replacement
            .set_key(key.clone())
            .map_err(|e| DataServiceError::Constraint(e.to_string()))?;
        for (def, value) in replacement.values() {
            if !def.nullable && value.is_null() {
                return Err(DataServiceError::Constraint(format!(
                    "null value in column \"{}\" violates not-null constraint",
                    def.column
                )));
            }
        }

        rows[position] = replacement.clone();
        Ok(Some(replacement))
    }

    async fn delete(&self, key: &FieldValue) -> Result<bool, DataServiceError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| &row.key() != key);
        Ok(rows.len() < before)
    }
}
