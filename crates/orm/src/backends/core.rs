//! Core Backend Trait
//!
//! Abstracts the query execution and persistence engine behind the
//! interface the relationship layer consumes: single-row lookup, filtered
//! multi-row lookup, direct primary-key lookup, field-restricted save, and
//! insert-returning.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ModelResult;
use crate::model::{EntityType, Instance, SaveOptions};
use crate::query::{QueryContext, SelectQuery};

/// Query execution and persistence interface
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a select and return the first matching row, if any.
    async fn find_one(
        &self,
        query: &SelectQuery,
        ctx: &QueryContext,
    ) -> ModelResult<Option<Instance>>;

    /// Execute a select and return all matching rows.
    async fn find_all(&self, query: &SelectQuery, ctx: &QueryContext)
        -> ModelResult<Vec<Instance>>;

    /// Direct primary-key lookup, bypassing generic filter construction.
    ///
    /// `query` carries only the table/schema target; `pk_field` and `value`
    /// identify the row.
    async fn find_by_pk(
        &self,
        query: &SelectQuery,
        pk_field: &str,
        value: &Value,
        ctx: &QueryContext,
    ) -> ModelResult<Option<Instance>>;

    /// Persist an instance, honouring the field subset in `options`.
    async fn save(
        &self,
        entity: &EntityType,
        instance: &Instance,
        options: &SaveOptions,
    ) -> ModelResult<()>;

    /// Insert a new row and return the created instance.
    async fn insert(
        &self,
        entity: &EntityType,
        values: &HashMap<String, Value>,
        ctx: &QueryContext,
    ) -> ModelResult<Instance>;
}
