//! Query Types - Filter conditions, select queries, and SQL rendering
//!
//! Relationship traversal compiles down to [`SelectQuery`] values which a
//! backend executes. Conditions are always AND-conjoined; that is the only
//! shape the relationship layer produces.

use std::fmt;

use serde_json::Value;

/// Query operator types
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOperator::Equal => write!(f, "="),
            QueryOperator::NotEqual => write!(f, "!="),
            QueryOperator::GreaterThan => write!(f, ">"),
            QueryOperator::GreaterThanOrEqual => write!(f, ">="),
            QueryOperator::LessThan => write!(f, "<"),
            QueryOperator::LessThanOrEqual => write!(f, "<="),
            QueryOperator::In => write!(f, "IN"),
            QueryOperator::NotIn => write!(f, "NOT IN"),
            QueryOperator::IsNull => write!(f, "IS NULL"),
            QueryOperator::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// A single filter condition against one column
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: QueryOperator,
    pub value: Option<Value>,
    /// Value list for IN / NOT IN
    pub values: Vec<Value>,
}

impl Condition {
    /// Equality condition (`column = value`)
    pub fn eq(column: &str, value: Value) -> Self {
        Self {
            column: column.to_string(),
            operator: QueryOperator::Equal,
            value: Some(value),
            values: Vec::new(),
        }
    }

    /// Membership condition (`column IN (values...)`)
    pub fn is_in(column: &str, values: Vec<Value>) -> Self {
        Self {
            column: column.to_string(),
            operator: QueryOperator::In,
            value: None,
            values,
        }
    }

}

/// Scope selection for a traversal call.
///
/// Absent (`None` at the option level) means the target's default scope;
/// `Unscoped` strips every scope; `Named` applies a named scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Scoping {
    Unscoped,
    Named(String),
}

/// Execution context forwarded to the backend with every call.
///
/// The transaction handle identifies a transaction the backend's connection
/// layer opened earlier; this layer only passes it through.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub transaction: Option<uuid::Uuid>,
    pub logging: bool,
}

/// A fully-resolved single-table select
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: String,
    pub schema: Option<String>,
    pub schema_delimiter: Option<String>,
    pub conditions: Vec<Condition>,
    pub limit: Option<i64>,
}

impl SelectQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            schema: None,
            schema_delimiter: None,
            conditions: Vec::new(),
            limit: None,
        }
    }

    /// Fully-qualified table reference, honouring the schema delimiter.
    pub fn table_ref(&self) -> String {
        match &self.schema {
            Some(schema) if !schema.is_empty() => {
                let delimiter = self.schema_delimiter.as_deref().unwrap_or(".");
                format!("{}{}{}", schema, delimiter, self.table)
            }
            _ => self.table.clone(),
        }
    }

    /// Convert the query to SQL string
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", self.table_ref());

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            let conditions = build_conditions(&self.conditions);
            sql.push_str(&conditions.join(" AND "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql
    }

    /// Get parameter values in condition order (for prepared statements)
    pub fn bindings(&self) -> Vec<Value> {
        let mut bindings = Vec::new();
        for condition in &self.conditions {
            if let Some(value) = &condition.value {
                bindings.push(value.clone());
            }
            bindings.extend(condition.values.clone());
        }
        bindings
    }
}

/// Build WHERE condition strings
fn build_conditions(conditions: &[Condition]) -> Vec<String> {
    conditions
        .iter()
        .map(|condition| match &condition.operator {
            QueryOperator::IsNull | QueryOperator::IsNotNull => {
                format!("{} {}", condition.column, condition.operator)
            }
            QueryOperator::In | QueryOperator::NotIn => {
                if condition.values.is_empty() {
                    // IN over an empty list matches nothing
                    format!("{} {} (NULL)", condition.column, condition.operator)
                } else {
                    let values: Vec<String> =
                        condition.values.iter().map(format_value).collect();
                    format!(
                        "{} {} ({})",
                        condition.column,
                        condition.operator,
                        values.join(", ")
                    )
                }
            }
            _ => {
                if let Some(value) = &condition.value {
                    format!(
                        "{} {} {}",
                        condition.column,
                        condition.operator,
                        format_value(value)
                    )
                } else {
                    format!("{} IS NULL", condition.column)
                }
            }
        })
        .collect()
}

/// Format a value for SQL
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")), // Escape single quotes
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "NULL".to_string(),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

/// Render a key tuple as the map key used by batch loading.
///
/// JSON-array rendering keeps the encoding injective: composite string
/// parts containing separators, and the string `"null"` versus SQL NULL,
/// stay distinct.
pub(crate) fn render_key(values: &[Value]) -> String {
    Value::Array(values.to_vec()).to_string()
}
