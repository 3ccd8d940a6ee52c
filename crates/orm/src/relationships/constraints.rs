//! Referential Constraint Metadata - Foreign-key references and actions
//!
//! Builds the `references` metadata carried by injected foreign-key
//! attributes. Emission of the actual DDL constraint is owned by the
//! migration layer.

use serde::{Deserialize, Serialize};

use crate::model::EntityType;

/// Referential actions for ON DELETE / ON UPDATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferentialAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub fn to_sql(self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// Constraint metadata attached to an injected foreign-key attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyReference {
    /// Referenced table
    pub table: String,
    /// Referenced storage field
    pub field: String,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

/// Build the referential metadata for one foreign-key attribute.
///
/// Defaults are explicit crate policy: `ON DELETE SET NULL` for nullable
/// keys and `NO ACTION` otherwise, `ON UPDATE CASCADE`.
pub fn add_foreign_key_constraints(
    target: &EntityType,
    target_field: &str,
    allow_null: bool,
    on_delete: Option<ReferentialAction>,
    on_update: Option<ReferentialAction>,
) -> ForeignKeyReference {
    let on_delete = on_delete.unwrap_or(if allow_null {
        ReferentialAction::SetNull
    } else {
        ReferentialAction::NoAction
    });
    ForeignKeyReference {
        table: target.table.clone(),
        field: target_field.to_string(),
        on_delete,
        on_update: on_update.unwrap_or(ReferentialAction::Cascade),
    }
}
