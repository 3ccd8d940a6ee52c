//! Model Registry - Runtime ownership of entity schemas and declared associations
//!
//! Entities are registered once, then relationships are declared against
//! them. Declaration runs the full lifecycle in order: construction (key
//! resolution) -> attribute injection into the source schema -> accessor
//! registration. Thread-safe for concurrent reads after definition time.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::backends::Backend;
use crate::error::{ModelError, ModelResult, RelationshipError};
use crate::model::{EntityType, Instance};
use crate::relationships::accessors::{
    self, AccessorInvocation, AccessorKind, AccessorOutcome,
};
use crate::relationships::belongs_to::{BelongsTo, BelongsToOptions};

/// Thread-safe registry of entity schemas and their associations
#[derive(Debug, Default)]
pub struct ModelRegistry {
    entities: DashMap<String, EntityType>,
    /// source entity -> alias -> relationship
    associations: DashMap<String, HashMap<String, Arc<BelongsTo>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity schema, finalizing its derived caches.
    pub fn define(&self, mut entity: EntityType) {
        entity.refresh_attributes();
        self.entities.insert(entity.name.clone(), entity);
    }

    /// Snapshot of an entity schema by name.
    pub fn entity(&self, name: &str) -> ModelResult<EntityType> {
        self.entities
            .get(name)
            .map(|entry| entry.clone())
            .ok_or_else(|| ModelError::Schema(format!("unknown entity '{}'", name)))
    }

    /// Declare a belongs-to association from `source` to `target`.
    pub fn belongs_to(
        &self,
        source: &str,
        target: &str,
        options: BelongsToOptions,
    ) -> ModelResult<Arc<BelongsTo>> {
        let target_entity = self.entity(target)?;
        let mut source_entry = self
            .entities
            .get_mut(source)
            .ok_or_else(|| ModelError::Schema(format!("unknown entity '{}'", source)))?;

        let relation = Arc::new(BelongsTo::new(&source_entry, &target_entity, options)?);
        relation.inject_attributes(&mut source_entry, &target_entity)?;
        accessors::mixin(&relation, &mut source_entry);
        drop(source_entry);

        tracing::debug!(
            source = source,
            target = target,
            alias = relation.as_name(),
            "declared belongs-to association"
        );
        self.associations
            .entry(source.to_string())
            .or_default()
            .insert(relation.as_name().to_string(), Arc::clone(&relation));
        Ok(relation)
    }

    /// Invoke a registered accessor on a source instance.
    ///
    /// Resolves the accessor name on the entity's method table and
    /// dispatches to the traversal operation it binds; the invocation
    /// arguments must match the accessor's kind.
    pub async fn invoke(
        &self,
        entity: &str,
        accessor: &str,
        backend: &dyn Backend,
        instance: &mut Instance,
        invocation: AccessorInvocation<'_>,
    ) -> ModelResult<AccessorOutcome> {
        let schema = self.entity(entity)?;
        let binding = schema.accessor(accessor).ok_or_else(|| {
            RelationshipError::NotFound(format!(
                "no accessor '{}' registered on entity '{}'",
                accessor, entity
            ))
        })?;
        let relation = Arc::clone(&binding.relation);

        match (binding.kind, invocation) {
            (AccessorKind::Get, AccessorInvocation::Get(options)) => Ok(
                AccessorOutcome::Fetched(relation.get(self, backend, instance, options).await?),
            ),
            (AccessorKind::Set, AccessorInvocation::Set(reference, options)) => {
                relation
                    .set(self, backend, instance, reference, options)
                    .await?;
                Ok(AccessorOutcome::Assigned)
            }
            (AccessorKind::Create, AccessorInvocation::Create(values, options)) => {
                Ok(AccessorOutcome::Created(
                    relation
                        .create(self, backend, instance, values, options)
                        .await?,
                ))
            }
            (kind, _) => Err(RelationshipError::InvalidConfiguration(format!(
                "accessor '{}' dispatches to {:?} and does not accept these arguments",
                accessor, kind
            ))
            .into()),
        }
    }

    /// Look up a declared association by source entity and alias.
    pub fn association(&self, source: &str, alias: &str) -> Option<Arc<BelongsTo>> {
        self.associations
            .get(source)?
            .get(alias)
            .map(Arc::clone)
    }

    /// Aliases of every association declared on an entity.
    pub fn associations_for(&self, source: &str) -> Vec<String> {
        self.associations
            .get(source)
            .map(|entry| entry.keys().cloned().collect())
            .unwrap_or_default()
    }
}
