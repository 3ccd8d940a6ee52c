//! BelongsTo Relationship - Single-owned-reference association
//!
//! The source entity owns a reference to one target row via positionally
//! paired foreign-key/target-key sequences. Declaring the relationship
//! resolves keys and names, injects the foreign-key attributes into the
//! source schema, and registers accessors; at runtime the traversal
//! operations translate into lookups against the target's query interface.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::backends::Backend;
use crate::error::{ModelResult, RelationshipError};
use crate::model::{Attribute, AttributeType, EntityType, Instance, SaveOptions, Scope};
use crate::query::{render_key, Condition, QueryContext, Scoping, SelectQuery};
use crate::registry::ModelRegistry;
use crate::relationships::accessors::AccessorNames;
use crate::relationships::constraints::{add_foreign_key_constraints, ReferentialAction};
use crate::relationships::keys::{
    resolve_keys, ForeignKeySpec, KeyDescriptor, TargetKeySpec,
};
use crate::relationships::RelationKind;

/// Declaration-time configuration for a belongs-to relationship
#[derive(Debug, Clone, Default)]
pub struct BelongsToOptions {
    /// Alias used for default naming and accessor derivation
    pub as_name: Option<String>,
    pub foreign_key: ForeignKeySpec,
    pub target_key: TargetKeySpec,
    /// Overrides the injected attribute's storage type
    pub key_type: Option<AttributeType>,
    /// Persistence hook invocation policy; `None` means the crate default
    /// (hooks enabled)
    pub use_hooks: Option<bool>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

/// Per-call options for the get traversal
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// `None` applies the target's default scope
    pub scope: Option<Scoping>,
    pub schema: Option<String>,
    pub schema_delimiter: Option<String>,
    /// Extra filter, AND-conjoined with the key-pair conditions
    pub where_conditions: Vec<Condition>,
    /// Row limit forwarded to the backend; the single-row lookup applies
    /// its own and ignores this
    pub limit: Option<i64>,
    pub transaction: Option<uuid::Uuid>,
    pub logging: bool,
}

/// Per-call options for the set traversal
#[derive(Debug, Clone)]
pub struct SetOptions {
    /// When false, stop after the in-memory assignment
    pub save: bool,
    /// Per-call hook override; `None` falls back to the declaration policy
    pub use_hooks: Option<bool>,
    pub transaction: Option<uuid::Uuid>,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            save: true,
            use_hooks: None,
            transaction: None,
        }
    }
}

/// Per-call options for the create traversal
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub transaction: Option<uuid::Uuid>,
    pub logging: bool,
}

/// The associated value handed to the set traversal.
///
/// Disambiguated by the call site, never by runtime type inspection:
/// a target-instance reference, or raw key value(s). `Key(Value::Null)`
/// dissociates.
#[derive(Debug)]
pub enum Reference<'a> {
    Record(&'a Instance),
    Key(Value),
    CompositeKey(Vec<Value>),
}

/// A declared single-owned-reference association
#[derive(Debug)]
pub struct BelongsTo {
    kind: RelationKind,
    source: String,
    target: String,
    as_name: String,
    explicit_alias: bool,
    foreign_keys: Vec<KeyDescriptor>,
    target_keys: Vec<String>,
    identifier_fields: Vec<String>,
    single_primary_target_key: Option<String>,
    accessors: AccessorNames,
    key_type: Option<AttributeType>,
    use_hooks: bool,
    on_delete: Option<ReferentialAction>,
    on_update: Option<ReferentialAction>,
}

impl BelongsTo {
    /// Construct the relationship, resolving keys and accessor names.
    ///
    /// Fails on composite arity mismatch before any schema mutation.
    pub fn new(
        source: &EntityType,
        target: &EntityType,
        options: BelongsToOptions,
    ) -> ModelResult<Self> {
        let explicit_alias = options.as_name.is_some();
        let as_name = options.as_name.unwrap_or_else(|| target.name.clone());
        let resolved = resolve_keys(
            source,
            target,
            &as_name,
            &options.foreign_key,
            &options.target_key,
        )?;
        let accessors = AccessorNames::for_alias(&as_name);

        Ok(Self {
            kind: RelationKind::BelongsTo,
            source: source.name.clone(),
            target: target.name.clone(),
            as_name,
            explicit_alias,
            foreign_keys: resolved.foreign_keys,
            target_keys: resolved.target_keys,
            identifier_fields: resolved.identifier_fields,
            single_primary_target_key: resolved.single_primary_target_key,
            accessors,
            key_type: options.key_type,
            use_hooks: options.use_hooks.unwrap_or(true),
            on_delete: options.on_delete,
            on_update: options.on_update,
        })
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn as_name(&self) -> &str {
        &self.as_name
    }

    pub fn is_aliased(&self) -> bool {
        self.explicit_alias
    }

    pub fn foreign_keys(&self) -> &[KeyDescriptor] {
        &self.foreign_keys
    }

    pub fn target_keys(&self) -> &[String] {
        &self.target_keys
    }

    pub fn identifier_fields(&self) -> &[String] {
        &self.identifier_fields
    }

    pub fn single_primary_target_key(&self) -> Option<&str> {
        self.single_primary_target_key.as_deref()
    }

    pub fn accessor_names(&self) -> &AccessorNames {
        &self.accessors
    }

    /// Materialize the foreign-key attributes on the source schema.
    ///
    /// All candidates are built (and validated against the target) before
    /// any merge, so a missing target key leaves the source untouched.
    /// Merging follows default semantics: explicitly defined attributes win.
    pub fn inject_attributes(
        &self,
        source: &mut EntityType,
        target: &EntityType,
    ) -> ModelResult<()> {
        let mut candidates = Vec::with_capacity(self.foreign_keys.len());
        for (foreign_key, target_key) in self.foreign_keys.iter().zip(&self.target_keys) {
            let target_attr = target.attribute(target_key).ok_or_else(|| {
                RelationshipError::MissingTargetKey(format!(
                    "'{}' is not an attribute of entity '{}'",
                    target_key, target.name
                ))
            })?;

            let attr_type = foreign_key
                .type_override
                .or(self.key_type)
                .unwrap_or(target_attr.attr_type);
            let allow_null = foreign_key.allow_null.unwrap_or(true);
            let references = add_foreign_key_constraints(
                target,
                &target.field_of(target_key),
                allow_null,
                self.on_delete,
                self.on_update,
            );

            let mut attribute = Attribute::new(attr_type);
            attribute.allow_null = allow_null;
            attribute.field = foreign_key.field.clone();
            attribute.unique = foreign_key.unique;
            attribute.references = Some(references);
            candidates.push((foreign_key.name.clone(), attribute));
        }

        for (name, attribute) in candidates {
            if !source.propose_attribute(&name, attribute) {
                tracing::debug!(
                    entity = %source.name,
                    attribute = %name,
                    "keeping user-defined attribute over injected foreign key"
                );
            }
        }

        source.refresh_attributes();
        source.assert_no_naming_collision(&self.as_name, &self.accessors)?;
        Ok(())
    }

    /// Fetch the referenced target row for one source instance.
    pub async fn get(
        &self,
        registry: &ModelRegistry,
        backend: &dyn Backend,
        instance: &Instance,
        options: &GetOptions,
    ) -> ModelResult<Option<Instance>> {
        let target = registry.entity(&self.target)?;
        let scope = self.resolve_scope(&target, &options.scope)?;
        let ctx = QueryContext {
            transaction: options.transaction,
            logging: options.logging,
        };

        let values: Vec<Value> = self
            .foreign_keys
            .iter()
            .map(|key| instance.get_or_null(&key.name))
            .collect();
        if values.iter().any(Value::is_null) {
            return Ok(None);
        }

        // Direct primary-key lookup when the single key pair references the
        // target's primary key and no extra filtering applies.
        if let Some(foreign_key) = &self.single_primary_target_key {
            if options.where_conditions.is_empty() && scope.conditions.is_empty() {
                let query = self.base_query(&target, options);
                let value = instance.get_or_null(foreign_key);
                return backend
                    .find_by_pk(&query, &target.primary_key_field(), &value, &ctx)
                    .await;
            }
        }

        let mut query = self.base_query(&target, options);
        query.conditions.extend(scope.conditions);
        for (target_key, value) in self.target_keys.iter().zip(values) {
            query
                .conditions
                .push(Condition::eq(&target.field_of(target_key), value));
        }
        query
            .conditions
            .extend(options.where_conditions.iter().cloned());
        // A singular relationship must not inherit a row limit from scope
        // defaults; the single-row lookup applies its own.
        query.limit = None;

        backend.find_one(&query, &ctx).await
    }

    /// Fetch the referenced target rows for many source instances at once.
    ///
    /// Issues exactly one query regardless of batch size and returns a map
    /// from each instance's rendered foreign-key tuple to the matching
    /// target row, `None` where nothing matched.
    pub async fn get_batch(
        &self,
        registry: &ModelRegistry,
        backend: &dyn Backend,
        instances: &[Instance],
        options: &GetOptions,
    ) -> ModelResult<HashMap<String, Option<Instance>>> {
        let target = registry.entity(&self.target)?;
        let scope = self.resolve_scope(&target, &options.scope)?;
        let ctx = QueryContext {
            transaction: options.transaction,
            logging: options.logging,
        };

        // Distinct value list per key column, preserving first-seen order.
        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); self.foreign_keys.len()];
        let mut seen: Vec<HashSet<String>> = vec![HashSet::new(); self.foreign_keys.len()];
        for instance in instances {
            let tuple: Vec<Value> = self
                .foreign_keys
                .iter()
                .map(|key| instance.get_or_null(&key.name))
                .collect();
            if tuple.iter().any(Value::is_null) {
                continue;
            }
            for (i, value) in tuple.into_iter().enumerate() {
                if seen[i].insert(render_key(std::slice::from_ref(&value))) {
                    columns[i].push(value);
                }
            }
        }

        let mut query = self.base_query(&target, options);
        query.conditions.extend(scope.conditions);
        for (target_key, values) in self.target_keys.iter().zip(columns) {
            query
                .conditions
                .push(Condition::is_in(&target.field_of(target_key), values));
        }
        query
            .conditions
            .extend(options.where_conditions.iter().cloned());
        query.limit = options.limit;

        tracing::debug!(
            relation = %self.as_name,
            batch = instances.len(),
            "batch loading referenced rows"
        );
        let rows = backend.find_all(&query, &ctx).await?;

        let mut by_target_key: HashMap<String, Instance> = HashMap::new();
        for row in rows {
            let tuple: Vec<Value> = self
                .target_keys
                .iter()
                .map(|key| row.get_or_null(&target.field_of(key)))
                .collect();
            by_target_key.insert(render_key(&tuple), row);
        }

        let mut result: HashMap<String, Option<Instance>> = HashMap::new();
        for instance in instances {
            let tuple: Vec<Value> = self
                .foreign_keys
                .iter()
                .map(|key| instance.get_or_null(&key.name))
                .collect();
            let key = render_key(&tuple);
            if tuple.iter().any(Value::is_null) {
                result.entry(key).or_insert(None);
            } else {
                let matched = by_target_key.get(&key).cloned();
                result.insert(key, matched);
            }
        }
        Ok(result)
    }

    /// Assign the referenced row (or raw key values) onto the source
    /// instance's foreign-key attributes, persisting narrowly unless
    /// `options.save` is false.
    pub async fn set(
        &self,
        registry: &ModelRegistry,
        backend: &dyn Backend,
        instance: &mut Instance,
        reference: Reference<'_>,
        options: &SetOptions,
    ) -> ModelResult<()> {
        let values: Vec<Value> = match reference {
            // Hydrated rows are keyed by storage field name, so the target-key
            // values are read through the target's field map.
            Reference::Record(record) => {
                let target = registry.entity(&self.target)?;
                self.target_keys
                    .iter()
                    .map(|key| record.get_or_null(&target.field_of(key)))
                    .collect()
            }
            Reference::Key(value) => {
                if self.foreign_keys.len() != 1 {
                    return Err(RelationshipError::InvalidConfiguration(format!(
                        "association '{}' uses {} key pairs; a composite key value is required",
                        self.as_name,
                        self.foreign_keys.len()
                    ))
                    .into());
                }
                vec![value]
            }
            Reference::CompositeKey(values) => {
                if values.len() != self.foreign_keys.len() {
                    return Err(RelationshipError::InvalidConfiguration(format!(
                        "association '{}' expects {} key values, got {}",
                        self.as_name,
                        self.foreign_keys.len(),
                        values.len()
                    ))
                    .into());
                }
                values
            }
        };

        for (foreign_key, value) in self.foreign_keys.iter().zip(values) {
            instance.set(&foreign_key.name, value);
        }

        if !options.save {
            return Ok(());
        }

        let source = registry.entity(&self.source)?;
        let fields: Vec<String> = self
            .foreign_keys
            .iter()
            .map(|key| key.name.clone())
            .collect();
        let save_options = SaveOptions {
            fields: Some(fields.clone()),
            allow_null_fields: fields,
            association: true,
            use_hooks: options.use_hooks.unwrap_or(self.use_hooks),
            transaction: options.transaction,
        };
        tracing::debug!(
            relation = %self.as_name,
            entity = %source.name,
            "persisting foreign-key assignment"
        );
        instance.save(&source, backend, &save_options).await
    }

    /// Create a new target row and link it to the source instance.
    ///
    /// The link assignment runs strictly after the insert completed; a
    /// failure in either step propagates unmodified.
    pub async fn create(
        &self,
        registry: &ModelRegistry,
        backend: &dyn Backend,
        instance: &mut Instance,
        values: HashMap<String, Value>,
        options: &CreateOptions,
    ) -> ModelResult<Instance> {
        let target = registry.entity(&self.target)?;
        let ctx = QueryContext {
            transaction: options.transaction,
            logging: options.logging,
        };
        let created = backend.insert(&target, &values, &ctx).await?;
        self.set(
            registry,
            backend,
            instance,
            Reference::Record(&created),
            &SetOptions {
                save: true,
                use_hooks: None,
                transaction: options.transaction,
            },
        )
        .await?;
        Ok(created)
    }

    fn base_query(&self, target: &EntityType, options: &GetOptions) -> SelectQuery {
        let mut query = SelectQuery::new(&target.table);
        query.schema = options.schema.clone().or_else(|| target.schema.clone());
        query.schema_delimiter = options
            .schema_delimiter
            .clone()
            .or_else(|| target.schema_delimiter.clone());
        query
    }

    fn resolve_scope(&self, target: &EntityType, scoping: &Option<Scoping>) -> ModelResult<Scope> {
        match scoping {
            None => Ok(target.default_scope.clone().unwrap_or_default()),
            Some(Scoping::Unscoped) => Ok(Scope::default()),
            Some(Scoping::Named(name)) => target.named_scope(name).cloned().ok_or_else(|| {
                RelationshipError::InvalidConfiguration(format!(
                    "unknown scope '{}' on entity '{}'",
                    name, target.name
                ))
                .into()
            }),
        }
    }
}
