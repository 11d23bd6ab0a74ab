//! Postgres-backed repository: generic CRUD for one configured table using
//! the safe SQL builder.

use crate::case::{camelize, singularize};
use crate::config::{validate_table, TableConfig};
use crate::error::ConfigError;
use crate::failure::{FieldErrors, Failure};
use crate::params::Params;
use crate::repository::Repository;
use crate::service::validation::RecordValidator;
use crate::sql::{delete, insert, select_all, select_by_id, update, QueryBuf};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgDatabaseError;
use sqlx::PgPool;

const UNIQUE_VIOLATION: &str = "23505";
const NOT_NULL_VIOLATION: &str = "23502";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// Rows of one table as JSON objects.
pub struct PgRepository {
    pool: PgPool,
    table: TableConfig,
    model: String,
    validator: RecordValidator,
}

impl PgRepository {
    pub fn new(pool: PgPool, table: TableConfig) -> Result<Self, ConfigError> {
        validate_table(&table)?;
        let validator = RecordValidator::new(&table)?;
        let model = table.model.clone().unwrap_or_else(|| singularize(&table.name));
        Ok(PgRepository {
            pool,
            table,
            model,
            validator,
        })
    }

    pub fn table(&self) -> &TableConfig {
        &self.table
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn not_found(&self, id: &Value) -> Failure {
        let id = match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Failure::not_found(format!(
            "Couldn't find {} with '{}'={}",
            camelize(&self.model),
            self.table.primary_key,
            id
        ))
    }

    fn id_of(&self, record: &Value) -> Result<Value, Failure> {
        record
            .get(&self.table.primary_key)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| Failure::internal(format!("{} has no {}", self.model, self.table.primary_key)))
    }

    /// Configured columns only.
    fn attributes(&self, attrs: Params) -> Map<String, Value> {
        attrs
            .into_map()
            .into_iter()
            .filter(|(k, _)| self.table.column(k).is_some())
            .collect()
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, sqlx::Error> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<sqlx::Postgres, Value>(&q.sql);
        for p in &q.params {
            query = query.bind(p.as_deref());
        }
        query.fetch_optional(&self.pool).await
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, sqlx::Error> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<sqlx::Postgres, Value>(&q.sql);
        for p in &q.params {
            query = query.bind(p.as_deref());
        }
        query.fetch_all(&self.pool).await
    }
}

fn as_object_mut(record: &mut Value) -> Result<&mut Map<String, Value>, Failure> {
    record
        .as_object_mut()
        .ok_or_else(|| Failure::internal("record is not a JSON object"))
}

#[async_trait]
impl Repository for PgRepository {
    type Record = Value;

    fn model_name(&self) -> String {
        self.model.clone()
    }

    async fn all(&self) -> Result<Vec<Value>, Failure> {
        Ok(self.fetch_all(&select_all(&self.table)).await?)
    }

    async fn find(&self, id: &str) -> Result<Value, Failure> {
        let id = Value::String(id.to_string());
        match self.fetch_optional(&select_by_id(&self.table, &id)).await {
            Ok(Some(row)) => Ok(row),
            Ok(None) => Err(self.not_found(&id)),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(INVALID_TEXT_REPRESENTATION) => {
                Err(self.not_found(&id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn build(&self, attrs: Params) -> Result<Value, Failure> {
        Ok(Value::Object(self.attributes(attrs)))
    }

    /// Insert an unsaved record; the stored row replaces it.
    async fn save(&self, record: &mut Value) -> Result<(), Failure> {
        let attrs = as_object_mut(record)?;
        self.validator.validate(attrs)?;
        let row = self
            .fetch_optional(&insert(&self.table, attrs))
            .await?
            .ok_or_else(|| Failure::database("insert returned no row"))?;
        *record = row;
        Ok(())
    }

    async fn update(&self, record: &mut Value, attrs: Params) -> Result<(), Failure> {
        let id = self.id_of(record)?;
        let changes = self.attributes(attrs);
        let current = as_object_mut(record)?;
        let mut merged = current.clone();
        merged.extend(changes.clone());
        self.validator.validate(&merged)?;
        let row = self
            .fetch_optional(&update(&self.table, &id, &changes))
            .await?
            .ok_or_else(|| self.not_found(&id))?;
        *record = row;
        Ok(())
    }

    async fn destroy(&self, record: &mut Value) -> Result<(), Failure> {
        let id = self.id_of(record)?;
        let row = self
            .fetch_optional(&delete(&self.table, &id))
            .await?
            .ok_or_else(|| self.not_found(&id))?;
        *record = row;
        Ok(())
    }
}

/// First column named in a Postgres key detail, e.g. `Key (email)=(a@b.c) already exists.`
fn key_column(detail: &str) -> Option<&str> {
    let rest = detail.strip_prefix("Key (")?;
    let cols = rest.split(")=(").next()?;
    cols.split(", ").next().filter(|c| !c.is_empty())
}

fn field_failure(field: &str, message: &str) -> Failure {
    Failure::validation(FieldErrors::new().with(field, message))
}

impl From<sqlx::Error> for Failure {
    fn from(e: sqlx::Error) -> Self {
        let failure = match &e {
            sqlx::Error::RowNotFound => Failure::not_found("record not found"),
            sqlx::Error::Database(db) => {
                let pg = db.try_downcast_ref::<PgDatabaseError>();
                let detail_column = pg.and_then(|p| p.detail()).and_then(key_column);
                match db.code().as_deref() {
                    Some(UNIQUE_VIOLATION) => {
                        field_failure(detail_column.unwrap_or("base"), "has already been taken")
                    }
                    Some(FOREIGN_KEY_VIOLATION) => field_failure(detail_column.unwrap_or("base"), "must exist"),
                    Some(NOT_NULL_VIOLATION) => {
                        field_failure(pg.and_then(|p| p.column()).unwrap_or("base"), "can't be blank")
                    }
                    Some(INVALID_TEXT_REPRESENTATION) => Failure::malformed(db.message().to_string()),
                    _ => Failure::database(db.message().to_string()),
                }
            }
            sqlx::Error::PoolTimedOut => Failure::timeout("timed out acquiring a database connection"),
            other => Failure::database(other.to_string()),
        };
        tracing::debug!(error = %e, category = %failure.category(), "database error");
        failure.with_source(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{RECORD_DATABASE, RECORD_NOT_FOUND, TIMEOUT};

    #[test]
    fn key_column_from_detail() {
        assert_eq!(key_column("Key (email)=(a@b.c) already exists."), Some("email"));
        assert_eq!(key_column("Key (org_id, slug)=(1, x) already exists."), Some("org_id"));
        assert_eq!(key_column("Failing row contains (1, null)."), None);
    }

    #[test]
    fn non_database_errors_map_to_categories() {
        assert_eq!(Failure::from(sqlx::Error::RowNotFound).category().name(), RECORD_NOT_FOUND);
        assert_eq!(Failure::from(sqlx::Error::PoolTimedOut).category().name(), TIMEOUT);
        assert_eq!(Failure::from(sqlx::Error::PoolClosed).category().name(), RECORD_DATABASE);
    }
}
