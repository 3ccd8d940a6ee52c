//! Relationships Module - Single-owned-reference associations between entities
//!
//! A relationship is declared once (construction resolves keys and names),
//! injects its foreign-key attributes into the source schema during entity
//! finalization, registers accessors, and at runtime translates traversal
//! into queries against the target entity.

pub mod accessors;
pub mod belongs_to;
pub mod constraints;
pub mod keys;

pub use accessors::*;
pub use belongs_to::*;
pub use constraints::*;
pub use keys::*;

/// Closed set of relationship kinds.
///
/// Only the single-owned-reference kind is implemented; the variant set is
/// the dispatch point the sibling kinds plug into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    BelongsTo,
}
