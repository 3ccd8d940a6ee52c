//! Database Backend Abstractions
//!
//! The relationship layer never executes SQL itself; it hands fully-resolved
//! [`SelectQuery`](crate::query::SelectQuery) values and save/insert requests
//! to a [`Backend`]. The PostgreSQL implementation is backed by sqlx.

pub mod core;
pub mod postgres;

pub use core::Backend;
pub use postgres::PostgresBackend;
