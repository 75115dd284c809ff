use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::{Query, QueryAs},
    FromRow, PgPool, Postgres,
};
use tracing::debug;

use crate::config::CONFIG;
use crate::database::accessor::{DataServiceAccessor, DataServiceError, Selection};
use crate::entity::{Entity, EntityDescriptor, FieldDef, FieldKind, FieldValue};
use crate::predicate::{quote_column, quote_identifier, Predicate, PredicateWhere, SqlResult};

/// Postgres-backed accessor. Each call checks a connection out of the pool and returns it
/// when the statement (or transaction, for bulk inserts) completes.
pub struct PgDataServiceAccessor<T> {
    pool: PgPool,
    _phantom: PhantomData<T>,
}

impl<T> PgDataServiceAccessor<T>
where
    T: Entity + for<'r> FromRow<'r, PgRow>,
{
    pub fn new(pool: PgPool) -> Self {
        Self { pool, _phantom: PhantomData }
    }

    async fn fetch(&self, sql: SqlResult) -> Result<Vec<T>, DataServiceError> {
        log_sql(&sql);
        let mut q = sqlx::query_as::<_, T>(&sql.query);
        for value in sql.params {
            let kind = value.kind().unwrap_or(FieldKind::Text);
            q = bind_param_query_as(q, kind, value);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl<T> DataServiceAccessor<T> for PgDataServiceAccessor<T>
where
    T: Entity + for<'r> FromRow<'r, PgRow>,
{
    async fn get_by_key(&self, key: &FieldValue) -> Result<Option<T>, DataServiceError> {
        let sql = select_by_key_sql(T::descriptor(), key.clone());
        Ok(self.fetch(sql).await?.into_iter().next())
    }

    async fn get_all(&self, limit: Option<usize>) -> Result<Vec<T>, DataServiceError> {
        self.fetch(select_sql(T::descriptor(), &Predicate::all(), limit)).await
    }

    async fn get_by_predicate(
        &self,
        predicate: &Predicate,
        single: bool,
        limit: Option<usize>,
    ) -> Result<Selection<T>, DataServiceError> {
        if !single {
            return Ok(Selection::Many(self.fetch(select_sql(T::descriptor(), predicate, limit)).await?));
        }

        // Two rows are enough to tell "exactly one" from "ambiguous"
        let mut rows = self.fetch(select_sql(T::descriptor(), predicate, Some(2))).await?;
        if rows.len() > 1 {
            return Err(DataServiceError::AmbiguousMatch);
        }
        Ok(Selection::One(rows.pop()))
    }

    async fn insert(&self, entity: T) -> Result<T, DataServiceError> {
        let (sql, values) = insert_statement(&entity);
        debug!("Inserting one {} row", T::descriptor().resource);
        let q = bind_values(sqlx::query_as::<_, T>(&sql), values);
        Ok(q.fetch_one(&self.pool).await?)
    }

    async fn insert_many(&self, entities: Vec<T>) -> Result<Vec<T>, DataServiceError> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(entities.len());

        for entity in &entities {
            let (sql, values) = insert_statement(entity);
            let q = bind_values(sqlx::query_as::<_, T>(&sql), values);
            // Dropping `tx` on error rolls the whole batch back
            stored.push(q.fetch_one(&mut *tx).await?);
        }

        tx.commit().await?;
        debug!("Inserted {} {} rows", stored.len(), T::descriptor().resource);
        Ok(stored)
    }

    async fn update(&self, key: &FieldValue, entity: T) -> Result<Option<T>, DataServiceError> {
        let descriptor = T::descriptor();
        let mut values: Vec<(FieldKind, FieldValue)> = entity
            .values()
            .into_iter()
            .filter(|(def, _)| def.name != descriptor.key.name)
            .map(|(def, value)| (def.kind, value))
            .collect();
        let columns: Vec<&FieldDef> = descriptor.fields.iter().filter(|f| f.name != descriptor.key.name).collect();
        values.push((descriptor.key.kind, key.clone()));

        let sql = update_sql(descriptor, &columns);
        let q = bind_values(sqlx::query_as::<_, T>(&sql), values);
        Ok(q.fetch_optional(&self.pool).await?)
    }

    async fn delete(&self, key: &FieldValue) -> Result<bool, DataServiceError> {
        let descriptor = T::descriptor();
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            quote_identifier(descriptor.table),
            quote_column(descriptor.key)
        );
        let q = bind_param_query(sqlx::query(&sql), descriptor.key.kind, key.clone());
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

fn column_list(descriptor: &EntityDescriptor) -> String {
    descriptor.fields.iter().map(quote_column).collect::<Vec<_>>().join(", ")
}

fn select_sql(descriptor: &EntityDescriptor, predicate: &Predicate, limit: Option<usize>) -> SqlResult {
    let where_result = PredicateWhere::generate(predicate, 0);
    let limit_clause = limit.map(|l| format!(" LIMIT {}", l)).unwrap_or_default();
    let query = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {} ASC{}",
        column_list(descriptor),
        quote_identifier(descriptor.table),
        where_result.query,
        quote_column(descriptor.key),
        limit_clause
    );
    SqlResult { query, params: where_result.params }
}

fn select_by_key_sql(descriptor: &EntityDescriptor, key: FieldValue) -> SqlResult {
    let query = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        column_list(descriptor),
        quote_identifier(descriptor.table),
        quote_column(descriptor.key)
    );
    SqlResult { query, params: vec![key] }
}

/// Columns to write for `entity`. A generated key left unset (null or zero) is omitted so
/// the identity column assigns it.
fn insert_columns<T: Entity>(entity: &T) -> Vec<(&'static FieldDef, FieldValue)> {
    entity
        .values()
        .into_iter()
        .filter(|(def, value)| {
            !(def.generated && matches!(value, FieldValue::Null | FieldValue::Integer(0)))
        })
        .collect()
}

fn insert_statement<T: Entity>(entity: &T) -> (String, Vec<(FieldKind, FieldValue)>) {
    let columns = insert_columns(entity);
    let defs: Vec<&FieldDef> = columns.iter().map(|(def, _)| *def).collect();
    let sql = insert_sql(T::descriptor(), &defs);
    (sql, columns.into_iter().map(|(def, value)| (def.kind, value)).collect())
}

fn insert_sql(descriptor: &EntityDescriptor, columns: &[&FieldDef]) -> String {
    let names: Vec<String> = columns.iter().map(|def| quote_column(def)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quote_identifier(descriptor.table),
        names.join(", "),
        placeholders.join(", "),
        column_list(descriptor)
    )
}

/// Key placeholder comes last, after one placeholder per column
fn update_sql(descriptor: &EntityDescriptor, columns: &[&FieldDef]) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, def)| format!("{} = ${}", quote_column(def), i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        quote_identifier(descriptor.table),
        assignments.join(", "),
        quote_column(descriptor.key),
        columns.len() + 1,
        column_list(descriptor)
    )
}

fn log_sql(sql: &SqlResult) {
    if CONFIG.database.enable_query_logging {
        debug!("SQL: {} ({} params)", sql.query, sql.params.len());
    }
}

fn bind_values<'q, O>(
    mut q: QueryAs<'q, Postgres, O, PgArguments>,
    values: Vec<(FieldKind, FieldValue)>,
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    for (kind, value) in values {
        q = bind_param_query_as(q, kind, value);
    }
    q
}

// Nulls are bound with the column's type so Postgres can infer the parameter
fn bind_param_query_as<'q, O>(
    q: QueryAs<'q, Postgres, O, PgArguments>,
    kind: FieldKind,
    value: FieldValue,
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match value {
        FieldValue::Integer(i) => q.bind(i),
        FieldValue::Text(s) => q.bind(s),
        FieldValue::Boolean(b) => q.bind(b),
        FieldValue::Timestamp(t) => q.bind(t),
        FieldValue::Date(d) => q.bind(d),
        FieldValue::Uuid(u) => q.bind(u),
        FieldValue::Null => match kind {
            FieldKind::Integer => q.bind(None::<i64>),
            FieldKind::Text => q.bind(None::<String>),
            FieldKind::Boolean => q.bind(None::<bool>),
            FieldKind::Timestamp => q.bind(None::<chrono::NaiveDateTime>),
            FieldKind::Date => q.bind(None::<chrono::NaiveDate>),
            FieldKind::Uuid => q.bind(None::<uuid::Uuid>),
        },
    }
}

fn bind_param_query<'q>(
    q: Query<'q, Postgres, PgArguments>,
    kind: FieldKind,
    value: FieldValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        FieldValue::Integer(i) => q.bind(i),
        FieldValue::Text(s) => q.bind(s),
        FieldValue::Boolean(b) => q.bind(b),
        FieldValue::Timestamp(t) => q.bind(t),
        FieldValue::Date(d) => q.bind(d),
        FieldValue::Uuid(u) => q.bind(u),
        FieldValue::Null => match kind {
            FieldKind::Integer => q.bind(None::<i64>),
            FieldKind::Text => q.bind(None::<String>),
            FieldKind::Boolean => q.bind(None::<bool>),
            FieldKind::Timestamp => q.bind(None::<chrono::NaiveDateTime>),
            FieldKind::Date => q.bind(None::<chrono::NaiveDate>),
            FieldKind::Uuid => q.bind(None::<uuid::Uuid>),
        },
    }
}
