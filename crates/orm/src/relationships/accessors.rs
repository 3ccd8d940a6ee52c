//! Accessor Generator - Named operation bindings on source entities
//!
//! Each declared relationship contributes `get<Name>` / `set<Name>` /
//! `create<Name>` entries to its source entity's method table. The table is
//! an explicit mapping populated at schema-finalization time; registration
//! is idempotent (same name replaces).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::model::{EntityType, Instance};
use crate::naming;
use crate::relationships::belongs_to::{
    BelongsTo, CreateOptions, GetOptions, Reference, SetOptions,
};

/// Which traversal operation an accessor dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    Get,
    Set,
    Create,
}

/// The three accessor names derived from an alias
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorNames {
    pub get: String,
    pub set: String,
    pub create: String,
}

impl AccessorNames {
    pub fn for_alias(alias: &str) -> Self {
        let name = naming::upper_first(alias);
        Self {
            get: format!("get{}", name),
            set: format!("set{}", name),
            create: format!("create{}", name),
        }
    }

    pub fn all(&self) -> [&String; 3] {
        [&self.get, &self.set, &self.create]
    }
}

/// A registered accessor: operation kind plus the relationship it binds
#[derive(Debug, Clone)]
pub struct AccessorBinding {
    pub kind: AccessorKind,
    pub relation: Arc<BelongsTo>,
}

/// Arguments for one accessor invocation.
///
/// The variant must match the [`AccessorKind`] of the accessor being
/// invoked; dispatch rejects mismatches.
#[derive(Debug)]
pub enum AccessorInvocation<'a> {
    Get(&'a GetOptions),
    Set(Reference<'a>, &'a SetOptions),
    Create(HashMap<String, Value>, &'a CreateOptions),
}

/// What an accessor invocation produced
#[derive(Debug)]
pub enum AccessorOutcome {
    Fetched(Option<Instance>),
    Assigned,
    Created(Instance),
}

/// Register the relationship's accessors on the source entity.
pub fn mixin(relation: &Arc<BelongsTo>, source: &mut EntityType) {
    let names = relation.accessor_names();
    source.register_accessor(
        &names.get,
        AccessorBinding {
            kind: AccessorKind::Get,
            relation: Arc::clone(relation),
        },
    );
    source.register_accessor(
        &names.set,
        AccessorBinding {
            kind: AccessorKind::Set,
            relation: Arc::clone(relation),
        },
    );
    source.register_accessor(
        &names.create,
        AccessorBinding {
            kind: AccessorKind::Create,
            relation: Arc::clone(relation),
        },
    );
    source.record_association(relation.as_name());
}
