//! Entity Schemas - Attribute registries, scopes, and accessor tables
//!
//! An [`EntityType`] is a runtime schema: a named mapping from attribute
//! name to [`Attribute`], a primary key, named scopes, and the method table
//! of relationship accessors bound at schema-finalization time. The
//! relationship layer only reads target schemas and appends to source
//! schemas via [`EntityType::propose_attribute`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{ModelResult, RelationshipError};
use crate::query::Condition;
use crate::relationships::accessors::{AccessorBinding, AccessorNames};
use crate::relationships::constraints::ForeignKeyReference;

/// Storage types an attribute can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    Integer,
    BigInt,
    Text,
    Boolean,
    Uuid,
    DateTime,
    Json,
}

/// A single attribute definition within an entity schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub attr_type: AttributeType,
    pub allow_null: bool,
    /// Underlying column name; defaults to the attribute name on refresh
    pub field: Option<String>,
    pub primary_key: bool,
    pub unique: bool,
    /// Referential constraint metadata, filled in for injected foreign keys
    pub references: Option<ForeignKeyReference>,
}

impl Attribute {
    pub fn new(attr_type: AttributeType) -> Self {
        Self {
            attr_type,
            allow_null: true,
            field: None,
            primary_key: false,
            unique: false,
            references: None,
        }
    }

    pub fn primary(attr_type: AttributeType) -> Self {
        Self {
            allow_null: false,
            primary_key: true,
            ..Self::new(attr_type)
        }
    }

    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A named, predefined query filter for an entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    pub conditions: Vec<Condition>,
    pub limit: Option<i64>,
}

impl Scope {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A runtime entity schema
#[derive(Debug, Clone)]
pub struct EntityType {
    pub name: String,
    pub table: String,
    pub schema: Option<String>,
    pub schema_delimiter: Option<String>,
    /// Drives default foreign-key naming for associations declared on this
    /// entity as source
    pub underscored: bool,
    pub primary_key: String,
    attributes: HashMap<String, Attribute>,
    /// Derived cache: attribute name -> storage field. Rebuilt by
    /// [`EntityType::refresh_attributes`].
    field_map: HashMap<String, String>,
    pub default_scope: Option<Scope>,
    scopes: HashMap<String, Scope>,
    accessors: HashMap<String, AccessorBinding>,
    /// Aliases of associations already declared on this entity
    associations: HashSet<String>,
}

impl EntityType {
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            schema: None,
            schema_delimiter: None,
            underscored: false,
            primary_key: "id".to_string(),
            attributes: HashMap::new(),
            field_map: HashMap::new(),
            default_scope: None,
            scopes: HashMap::new(),
            accessors: HashMap::new(),
            associations: HashSet::new(),
        }
    }

    pub fn underscored(mut self) -> Self {
        self.underscored = true;
        self
    }

    pub fn with_attribute(mut self, name: &str, attribute: Attribute) -> Self {
        if attribute.primary_key {
            self.primary_key = name.to_string();
        }
        self.attributes.insert(name.to_string(), attribute);
        self.refresh_attributes();
        self
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    pub fn with_default_scope(mut self, scope: Scope) -> Self {
        self.default_scope = Some(scope);
        self
    }

    pub fn with_scope(mut self, name: &str, scope: Scope) -> Self {
        self.scopes.insert(name.to_string(), scope);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &String> {
        self.attributes.keys()
    }

    pub fn named_scope(&self, name: &str) -> Option<&Scope> {
        self.scopes.get(name)
    }

    /// Storage field for an attribute, falling back to the attribute name.
    pub fn field_of(&self, attribute: &str) -> String {
        self.field_map
            .get(attribute)
            .cloned()
            .unwrap_or_else(|| attribute.to_string())
    }

    /// Storage field of the primary-key attribute.
    pub fn primary_key_field(&self) -> String {
        self.field_of(&self.primary_key)
    }

    /// Propose a new attribute under default-merge semantics.
    ///
    /// An attribute name already present keeps its existing definition
    /// untouched; only previously-absent names are added. Returns whether
    /// the proposal was accepted.
    pub fn propose_attribute(&mut self, name: &str, attribute: Attribute) -> bool {
        if self.attributes.contains_key(name) {
            return false;
        }
        self.attributes.insert(name.to_string(), attribute);
        true
    }

    /// Recompute derived schema caches after the attribute registry changed.
    pub fn refresh_attributes(&mut self) {
        self.field_map = self
            .attributes
            .iter()
            .map(|(name, attr)| {
                let field = attr.field.clone().unwrap_or_else(|| name.clone());
                (name.clone(), field)
            })
            .collect();
    }

    /// Verify that an association's alias and accessor names do not clash
    /// with existing attributes or previously declared associations.
    pub fn assert_no_naming_collision(
        &self,
        alias: &str,
        accessors: &AccessorNames,
    ) -> ModelResult<()> {
        if self.associations.contains(alias) {
            return Err(RelationshipError::NamingCollision(format!(
                "association '{}' is already declared on entity '{}'",
                alias, self.name
            ))
            .into());
        }
        if self.attributes.contains_key(alias) {
            return Err(RelationshipError::NamingCollision(format!(
                "alias '{}' clashes with an attribute on entity '{}'",
                alias, self.name
            ))
            .into());
        }
        for name in accessors.all() {
            if self.attributes.contains_key(name) || self.accessors.contains_key(name) {
                return Err(RelationshipError::NamingCollision(format!(
                    "accessor '{}' clashes with an existing name on entity '{}'",
                    name, self.name
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Register an accessor binding; re-registration replaces.
    pub fn register_accessor(&mut self, name: &str, binding: AccessorBinding) {
        self.accessors.insert(name.to_string(), binding);
    }

    pub fn record_association(&mut self, alias: &str) {
        self.associations.insert(alias.to_string());
    }

    pub fn accessor(&self, name: &str) -> Option<&AccessorBinding> {
        self.accessors.get(name)
    }

    pub fn accessor_count(&self) -> usize {
        self.accessors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author_entity() -> EntityType {
        EntityType::new("Author", "authors")
            .with_attribute("id", Attribute::primary(AttributeType::Integer))
            .with_attribute("name", Attribute::new(AttributeType::Text))
    }

    #[test]
    fn test_primary_key_tracking() {
        let entity = author_entity();
        assert_eq!(entity.primary_key, "id");
        assert!(entity.attribute("id").unwrap().primary_key);
    }

    #[test]
    fn test_propose_attribute_default_merge() {
        let mut entity = author_entity();

        assert!(entity.propose_attribute("rating", Attribute::new(AttributeType::Integer)));
        // An explicit definition is never overwritten
        assert!(!entity.propose_attribute("name", Attribute::new(AttributeType::Integer)));
        assert_eq!(
            entity.attribute("name").unwrap().attr_type,
            AttributeType::Text
        );
    }

    #[test]
    fn test_refresh_rebuilds_field_map() {
        let mut entity = author_entity();
        entity.propose_attribute(
            "penName",
            Attribute::new(AttributeType::Text).with_field("pen_name"),
        );
        entity.refresh_attributes();

        assert_eq!(entity.field_of("penName"), "pen_name");
        assert_eq!(entity.field_of("name"), "name");
        // Unknown attributes fall back to the given name
        assert_eq!(entity.field_of("missing"), "missing");
    }

    #[test]
    fn test_collision_with_attribute() {
        let entity = author_entity();
        let accessors = AccessorNames::for_alias("name");
        let result = entity.assert_no_naming_collision("name", &accessors);
        assert!(result.is_err());
    }
}
