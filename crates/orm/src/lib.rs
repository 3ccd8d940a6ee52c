//! # lattice-orm: Dynamic Model and Relationship Layer
//!
//! Runtime entity schemas with declared associations. The core of the crate
//! is the belongs-to relationship: foreign-key derivation and injection,
//! generated accessors, and traversal operations (get / set / create) with
//! batch loading that issues a single query per batch.
//!
//! Query execution is abstracted behind the [`backends::Backend`] trait;
//! a PostgreSQL implementation over sqlx is provided.

pub mod backends;
pub mod error;
pub mod model;
pub mod naming;
pub mod query;
pub mod registry;
pub mod relationships;

#[cfg(test)]
pub(crate) mod test_support;


// Re-export core traits and types
pub use backends::{Backend, PostgresBackend};
pub use error::*;
pub use model::*;
pub use query::*;
pub use registry::*;
pub use relationships::*;
