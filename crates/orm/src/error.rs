//! Error types for the ORM system
//!
//! Provides error handling for schema definition, relationship
//! configuration, and backend operations.

use std::fmt;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for ORM operations
#[derive(Debug, Clone)]
pub enum ModelError {
    /// Database connection or query error
    Database(String),
    /// Model validation failed
    Validation(String),
    /// Primary key is missing or invalid
    MissingPrimaryKey,
    /// Relationship configuration or traversal failed
    Relationship(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// Schema error (unknown entity, attribute, or scope)
    Schema(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "Database error: {}", msg),
            ModelError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ModelError::MissingPrimaryKey => write!(f, "Primary key is missing or invalid"),
            ModelError::Relationship(msg) => write!(f, "Relationship error: {}", msg),
            ModelError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ModelError::Schema(msg) => write!(f, "Schema error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

// Convert from anyhow errors
impl From<anyhow::Error> for ModelError {
    fn from(err: anyhow::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

/// Error types for relationship operations
#[derive(Debug, Clone)]
pub enum RelationshipError {
    /// Invalid relationship configuration (arity mismatch, bad scope name)
    InvalidConfiguration(String),
    /// Requested target key does not exist on the target entity
    MissingTargetKey(String),
    /// Alias or accessor name clashes with an attribute or another association
    NamingCollision(String),
    /// No accessor or association registered under the requested name
    NotFound(String),
}

impl fmt::Display for RelationshipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipError::InvalidConfiguration(msg) => {
                write!(f, "Invalid relationship configuration: {}", msg)
            }
            RelationshipError::MissingTargetKey(msg) => write!(f, "Missing target key: {}", msg),
            RelationshipError::NamingCollision(msg) => write!(f, "Naming collision: {}", msg),
            RelationshipError::NotFound(msg) => write!(f, "Relationship not found: {}", msg),
        }
    }
}

impl std::error::Error for RelationshipError {}

impl From<RelationshipError> for ModelError {
    fn from(err: RelationshipError) -> Self {
        ModelError::Relationship(err.to_string())
    }
}
