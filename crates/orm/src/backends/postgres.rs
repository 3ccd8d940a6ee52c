//! PostgreSQL Backend Implementation
//!
//! Executes the relationship layer's queries against a PostgreSQL pool via
//! sqlx and hydrates rows into dynamic [`Instance`] values. Transactions are
//! owned by the surrounding connection layer; the handle in
//! [`QueryContext`] is passed through untouched.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, Pool, Postgres, Row};

use super::core::Backend;
use crate::error::{ModelError, ModelResult};
use crate::model::{EntityType, Instance, SaveOptions};
use crate::query::{format_value, QueryContext, SelectQuery};

/// PostgreSQL database backend
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: Pool<Postgres>,
}

impl PostgresBackend {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn table_ref(entity: &EntityType) -> String {
        let mut query = SelectQuery::new(&entity.table);
        query.schema = entity.schema.clone();
        query.schema_delimiter = entity.schema_delimiter.clone();
        query.table_ref()
    }
}

#[async_trait]
impl Backend for PostgresBackend {
    async fn find_one(
        &self,
        query: &SelectQuery,
        ctx: &QueryContext,
    ) -> ModelResult<Option<Instance>> {
        let mut query = query.clone();
        query.limit = Some(1);
        let sql = query.to_sql();
        if ctx.logging {
            tracing::debug!(sql = %sql, "executing find_one");
        }
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
        row.map(|row| row_to_instance(&query.table, &row)).transpose()
    }

    async fn find_all(
        &self,
        query: &SelectQuery,
        ctx: &QueryContext,
    ) -> ModelResult<Vec<Instance>> {
        let sql = query.to_sql();
        if ctx.logging {
            tracing::debug!(sql = %sql, "executing find_all");
        }
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row_to_instance(&query.table, row))
            .collect()
    }

    async fn find_by_pk(
        &self,
        query: &SelectQuery,
        pk_field: &str,
        value: &Value,
        ctx: &QueryContext,
    ) -> ModelResult<Option<Instance>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = {} LIMIT 1",
            query.table_ref(),
            pk_field,
            format_value(value)
        );
        if ctx.logging {
            tracing::debug!(sql = %sql, "executing find_by_pk");
        }
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
        row.map(|row| row_to_instance(&query.table, &row)).transpose()
    }

    async fn save(
        &self,
        entity: &EntityType,
        instance: &Instance,
        options: &SaveOptions,
    ) -> ModelResult<()> {
        let fields: Vec<String> = match &options.fields {
            Some(fields) => fields.clone(),
            None => instance.values().keys().cloned().collect(),
        };

        let mut assignments = Vec::with_capacity(fields.len());
        for name in &fields {
            let value = instance.get_or_null(name);
            if value.is_null() && !options.allow_null_fields.contains(name) {
                let nullable = entity.attribute(name).map(|a| a.allow_null).unwrap_or(true);
                if !nullable {
                    return Err(ModelError::Validation(format!(
                        "attribute '{}' on '{}' may not be null",
                        name, entity.name
                    )));
                }
            }
            assignments.push(format!("{} = {}", entity.field_of(name), format_value(&value)));
        }
        if assignments.is_empty() {
            return Ok(());
        }

        let pk_value = instance.get_or_null(&entity.primary_key);
        if pk_value.is_null() {
            return Err(ModelError::MissingPrimaryKey);
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            Self::table_ref(entity),
            assignments.join(", "),
            entity.primary_key_field(),
            format_value(&pk_value)
        );
        if options.use_hooks {
            tracing::debug!(
                entity = %entity.name,
                association = options.association,
                "running save hooks"
            );
        }
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert(
        &self,
        entity: &EntityType,
        values: &HashMap<String, Value>,
        ctx: &QueryContext,
    ) -> ModelResult<Instance> {
        let mut columns = Vec::with_capacity(values.len());
        let mut rendered = Vec::with_capacity(values.len());
        for (name, value) in values {
            columns.push(entity.field_of(name));
            rendered.push(format_value(value));
        }

        let sql = if columns.is_empty() {
            format!(
                "INSERT INTO {} DEFAULT VALUES RETURNING *",
                Self::table_ref(entity)
            )
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
                Self::table_ref(entity),
                columns.join(", "),
                rendered.join(", ")
            )
        };
        if ctx.logging {
            tracing::debug!(sql = %sql, "executing insert");
        }
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        row_to_instance(&entity.name, &row)
    }
}

/// Hydrate a database row into a dynamic instance.
fn row_to_instance(entity: &str, row: &PgRow) -> ModelResult<Instance> {
    let mut values = HashMap::new();
    for column in row.columns() {
        values.insert(column.name().to_string(), pg_value(row, column.ordinal())?);
    }
    Ok(Instance::from_values(entity, values))
}

/// Decode a column into a JSON value, probing the common Postgres types.
fn pg_value(row: &PgRow, index: usize) -> ModelResult<Value> {
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return Ok(v.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return Ok(v.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return Ok(v.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return Ok(v.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(index) {
        return Ok(v
            .map(|u| Value::String(u.to_string()))
            .unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(index) {
        return Ok(v
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return Ok(v.map(Value::String).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<Value>, _>(index) {
        return Ok(v.unwrap_or(Value::Null));
    }
    Err(ModelError::Serialization(format!(
        "unsupported column type at index {}",
        index
    )))
}
