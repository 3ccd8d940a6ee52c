//! Key Descriptor Resolver - Normalizes foreign-key/target-key configuration
//!
//! User-supplied key configuration arrives as explicit tagged unions
//! ([`ForeignKeySpec`], [`TargetKeySpec`]) and is resolved into parallel
//! ordered sequences of equal length, plus the derived fast-path and
//! storage-field metadata. Pure derivation, no side effects.

use serde::{Deserialize, Serialize};

use crate::error::{ModelResult, RelationshipError};
use crate::model::{AttributeType, EntityType};
use crate::naming;

/// A normalized foreign-key descriptor living on the source entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    pub name: String,
    /// Overrides the injected attribute's storage type
    pub type_override: Option<AttributeType>,
    pub allow_null: Option<bool>,
    pub field: Option<String>,
    pub unique: bool,
}

impl KeyDescriptor {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_override: None,
            allow_null: None,
            field: None,
            unique: false,
        }
    }

    pub fn with_type(mut self, attr_type: AttributeType) -> Self {
        self.type_override = Some(attr_type);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.allow_null = Some(false);
        self
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

/// Foreign-key configuration supplied at declaration time
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ForeignKeySpec {
    /// Derive the name from the alias and the target's primary key
    #[default]
    Default,
    Name(String),
    Descriptor(KeyDescriptor),
    Composite(Vec<KeyDescriptor>),
}

/// Target-key configuration supplied at declaration time
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TargetKeySpec {
    /// The target's primary-key attribute
    #[default]
    Default,
    Name(String),
    Composite(Vec<String>),
}

/// Resolved, positionally-paired key sequences
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedKeys {
    pub foreign_keys: Vec<KeyDescriptor>,
    pub target_keys: Vec<String>,
    /// Storage field per foreign key, for keys already present on the source
    pub identifier_fields: Vec<String>,
    /// Set when exactly one key pair exists and it references the target's
    /// primary key; enables the direct-lookup fast path
    pub single_primary_target_key: Option<String>,
}

/// Resolve the declared key configuration against the two entity schemas.
pub fn resolve_keys(
    source: &EntityType,
    target: &EntityType,
    alias: &str,
    foreign_key: &ForeignKeySpec,
    target_key: &TargetKeySpec,
) -> ModelResult<ResolvedKeys> {
    let (foreign_keys, target_keys) = match (foreign_key, target_key) {
        (ForeignKeySpec::Composite(fks), TargetKeySpec::Composite(tks)) => {
            if fks.len() != tks.len() {
                return Err(RelationshipError::InvalidConfiguration(format!(
                    "composite key arity mismatch: {} foreign keys vs {} target keys",
                    fks.len(),
                    tks.len()
                ))
                .into());
            }
            (fks.clone(), tks.clone())
        }
        (ForeignKeySpec::Composite(_), _) | (_, TargetKeySpec::Composite(_)) => {
            return Err(RelationshipError::InvalidConfiguration(
                "composite key arity mismatch: foreignKey and targetKey must both be composite"
                    .to_string(),
            )
            .into());
        }
        (fk, tk) => {
            let target_key = match tk {
                TargetKeySpec::Name(name) => name.clone(),
                _ => target.primary_key.clone(),
            };
            let descriptor = match fk {
                ForeignKeySpec::Name(name) => KeyDescriptor::named(name),
                ForeignKeySpec::Descriptor(descriptor) => descriptor.clone(),
                _ => KeyDescriptor::named(&naming::default_foreign_key(
                    alias,
                    &target_key,
                    source.underscored,
                )),
            };
            (vec![descriptor], vec![target_key])
        }
    };

    let identifier_fields = foreign_keys
        .iter()
        .map(|key| match source.attribute(&key.name) {
            Some(_) => source.field_of(&key.name),
            None => key.name.clone(),
        })
        .collect();

    let single_primary_target_key = if target_keys.len() == 1
        && target_keys[0] == target.primary_key
    {
        Some(foreign_keys[0].name.clone())
    } else {
        None
    };

    Ok(ResolvedKeys {
        foreign_keys,
        target_keys,
        identifier_fields,
        single_primary_target_key,
    })
}
