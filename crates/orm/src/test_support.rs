//! In-memory backend for exercising traversal operations in tests.
//!
//! Records every backend call so tests can assert on query counts and on
//! the exact shape of narrow saves.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::backends::Backend;
use crate::error::{ModelError, ModelResult};
use crate::model::{EntityType, Instance, SaveOptions};
use crate::query::{Condition, QueryContext, QueryOperator, SelectQuery};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FindOne {
        table: String,
    },
    FindAll {
        table: String,
    },
    FindByPk {
        table: String,
        field: String,
        value: Value,
    },
    Save {
        entity: String,
        fields: Vec<String>,
        association: bool,
        use_hooks: bool,
    },
    Insert {
        table: String,
    },
}

#[derive(Default)]
pub struct MockBackend {
    rows: Mutex<HashMap<String, Vec<Instance>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: &str, rows: Vec<Instance>) {
        self.rows.lock().unwrap().insert(table.to_string(), rows);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of read queries issued so far.
    pub fn read_query_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    Call::FindOne { .. } | Call::FindAll { .. } | Call::FindByPk { .. }
                )
            })
            .count()
    }

    pub fn stored(&self, table: &str) -> Vec<Instance> {
        self.rows
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn matching(&self, query: &SelectQuery) -> Vec<Instance> {
        let rows = self.rows.lock().unwrap();
        let mut matched: Vec<Instance> = rows
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.conditions.iter().all(|c| matches(row, c)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if let Some(limit) = query.limit {
            matched.truncate(limit as usize);
        }
        matched
    }
}

fn matches(row: &Instance, condition: &Condition) -> bool {
    let actual = row.get_or_null(&condition.column);
    match condition.operator {
        QueryOperator::Equal => {
            !actual.is_null() && condition.value.as_ref() == Some(&actual)
        }
        QueryOperator::In => !actual.is_null() && condition.values.contains(&actual),
        QueryOperator::IsNull => actual.is_null(),
        _ => false,
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn find_one(
        &self,
        query: &SelectQuery,
        _ctx: &QueryContext,
    ) -> ModelResult<Option<Instance>> {
        self.record(Call::FindOne {
            table: query.table.clone(),
        });
        Ok(self.matching(query).into_iter().next())
    }

    async fn find_all(
        &self,
        query: &SelectQuery,
        _ctx: &QueryContext,
    ) -> ModelResult<Vec<Instance>> {
        self.record(Call::FindAll {
            table: query.table.clone(),
        });
        Ok(self.matching(query))
    }

    async fn find_by_pk(
        &self,
        query: &SelectQuery,
        pk_field: &str,
        value: &Value,
        _ctx: &QueryContext,
    ) -> ModelResult<Option<Instance>> {
        self.record(Call::FindByPk {
            table: query.table.clone(),
            field: pk_field.to_string(),
            value: value.clone(),
        });
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .get(&query.table)
            .and_then(|rows| rows.iter().find(|row| &row.get_or_null(pk_field) == value))
            .cloned())
    }

    async fn save(
        &self,
        entity: &EntityType,
        instance: &Instance,
        options: &SaveOptions,
    ) -> ModelResult<()> {
        let fields = match &options.fields {
            Some(fields) => fields.clone(),
            None => instance.values().keys().cloned().collect(),
        };
        self.record(Call::Save {
            entity: entity.name.clone(),
            fields: fields.clone(),
            association: options.association,
            use_hooks: options.use_hooks,
        });

        let pk_value = instance.get_or_null(&entity.primary_key);
        if pk_value.is_null() {
            return Err(ModelError::MissingPrimaryKey);
        }
        let mut rows = self.rows.lock().unwrap();
        if let Some(rows) = rows.get_mut(&entity.table) {
            for row in rows.iter_mut() {
                if row.get_or_null(&entity.primary_key) == pk_value {
                    for field in &fields {
                        row.set(field, instance.get_or_null(field));
                    }
                }
            }
        }
        Ok(())
    }

    async fn insert(
        &self,
        entity: &EntityType,
        values: &HashMap<String, Value>,
        _ctx: &QueryContext,
    ) -> ModelResult<Instance> {
        self.record(Call::Insert {
            table: entity.table.clone(),
        });
        let mut instance = Instance::from_values(&entity.name, values.clone());
        let mut rows = self.rows.lock().unwrap();
        let table = rows.entry(entity.table.clone()).or_default();
        if instance.get_or_null(&entity.primary_key).is_null() {
            instance.set(&entity.primary_key, Value::from(table.len() as i64 + 1));
        }
        table.push(instance.clone());
        Ok(instance)
    }
}
