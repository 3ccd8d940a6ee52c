//! Live Instances - Dynamic rows with attribute access and persistence

use std::collections::HashMap;

use serde_json::Value;

use crate::backends::Backend;
use crate::error::ModelResult;
use crate::model::entity::EntityType;

/// Options controlling a single save call.
///
/// A narrow save lists the exact fields to persist; `None` means all
/// attributes currently set on the instance.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Restrict the persisted field set to these attribute names
    pub fields: Option<Vec<String>>,
    /// Attribute names for which an explicit NULL is permitted
    pub allow_null_fields: Vec<String>,
    /// Marks the save as association-driven for downstream hooks
    pub association: bool,
    /// Whether persistence hooks run for this save
    pub use_hooks: bool,
    pub transaction: Option<uuid::Uuid>,
}

/// A live row of an entity: attribute values addressed by name
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub entity: String,
    values: HashMap<String, Value>,
}

impl Instance {
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            values: HashMap::new(),
        }
    }

    pub fn from_values(entity: &str, values: HashMap<String, Value>) -> Self {
        Self {
            entity: entity.to_string(),
            values,
        }
    }

    pub fn with_value(mut self, name: &str, value: Value) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Attribute value, with absent treated as SQL NULL.
    pub fn get_or_null(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// Persist this instance through the backend.
    pub async fn save(
        &self,
        entity: &EntityType,
        backend: &dyn Backend,
        options: &SaveOptions,
    ) -> ModelResult<()> {
        backend.save(entity, self, options).await
    }
}
