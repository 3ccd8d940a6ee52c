//! Dynamic Model System - Runtime entity schemas and live instances

pub mod entity;
pub mod instance;

pub use entity::*;
pub use instance::*;
