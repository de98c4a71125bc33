//! Database-side schema types
//!
//! These mirror what a database adapter can tell us about a table. They are
//! read-only snapshot values: nothing in ModelDoctor ever mutates a table.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::ModelError;

/// Declared column type category
///
/// Backend-specific types are folded into the categories detectors care
/// about. Anything unrecognized becomes `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Bounded character type (varchar, char)
    String,

    /// Unbounded text type
    Text,

    Integer,
    #[serde(rename = "bigint")]
    BigInt,
    Float,
    Decimal,
    Boolean,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Json,
    Binary,
    Uuid,

    /// Anything we do not classify
    #[serde(other)]
    Other,
}

impl ColumnType {
    /// Whether values of this type are character strings
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Text)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Json => "json",
            Self::Binary => "binary",
            Self::Uuid => "uuid",
            Self::Other => "other",
        };
        write!(f, "{}", name)
    }
}

fn default_true() -> bool {
    true
}

/// A column of a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Declared type category
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Declared length limit, e.g. 64 for `varchar(64)`
    #[serde(default)]
    pub limit: Option<u32>,

    /// Whether NULL is allowed
    #[serde(default = "default_true")]
    pub null: bool,
}

impl Column {
    /// Create a nullable column without a length limit
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            limit: None,
            null: true,
        }
    }

    /// Set the declared length limit
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Mark the column NOT NULL
    pub fn not_null(mut self) -> Self {
        self.null = false;
        self
    }
}

/// An index on a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,

    /// Indexed columns in key order
    pub columns: Vec<String>,

    #[serde(default)]
    pub unique: bool,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A single-column foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,

    /// Referencing column on the owning table
    pub column: String,

    /// Referenced table
    pub to_table: String,

    /// Referenced column
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl ForeignKey {
    /// A foreign key referencing `to_table.id`
    pub fn new(
        name: impl Into<String>,
        column: impl Into<String>,
        to_table: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            to_table: to_table.into(),
            primary_key: default_primary_key(),
        }
    }
}

/// A check constraint as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConstraint {
    /// Predicate text in the backend's SQL dialect, e.g. `length(email) <= 64`
    pub expression: String,

    /// Whether the backend enforces the constraint for existing rows
    #[serde(default = "default_true")]
    pub validated: bool,
}

impl CheckConstraint {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            validated: true,
        }
    }

    /// Mark the constraint as added `NOT VALID`
    pub fn not_validated(mut self) -> Self {
        self.validated = false;
        self
    }
}

/// A table and everything the adapters know about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,

    /// Primary key column name, if the table has a single-column key
    #[serde(default)]
    pub primary_key: Option<String>,

    /// Columns in declaration order
    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default)]
    pub indexes: Vec<Index>,

    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,

    #[serde(default)]
    pub check_constraints: Vec<CheckConstraint>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            check_constraints: Vec::new(),
        }
    }

    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    pub fn with_check_constraint(mut self, constraint: CheckConstraint) -> Self {
        self.check_constraints.push(constraint);
        self
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

fn default_adapter() -> String {
    "PostgreSQL".to_string()
}

/// A dumped database schema (schema.json)
///
/// This is the offline counterpart of a live connection: the adapter name is
/// kept so dialect-specific behaviour still applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Adapter identity, e.g. "PostgreSQL", "Mysql2", "SQLite"
    #[serde(default = "default_adapter")]
    pub adapter: String,

    /// Whether the adapter can list check constraints natively
    #[serde(default = "default_true")]
    pub supports_check_constraints: bool,

    /// Tables in catalog order
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl SchemaSnapshot {
    /// Load a snapshot from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ModelError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_json(&contents)
    }

    /// Parse a snapshot from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::ParseError(e.to_string()))
    }

    /// Find a table by name
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_type_textual() {
        assert!(ColumnType::String.is_textual());
        assert!(ColumnType::Text.is_textual());
        assert!(!ColumnType::Integer.is_textual());
        assert!(!ColumnType::Other.is_textual());
    }

    #[test]
    fn snapshot_from_json() {
        let snapshot = SchemaSnapshot::from_json(
            r#"{
                "adapter": "Mysql2",
                "supports_check_constraints": false,
                "tables": [{
                    "name": "users",
                    "primary_key": "id",
                    "columns": [
                        {"name": "id", "type": "bigint", "null": false},
                        {"name": "email", "type": "string", "limit": 64},
                        {"name": "location", "type": "geometry"}
                    ],
                    "check_constraints": [{"expression": "length(email) <= 64"}]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.adapter, "Mysql2");
        assert!(!snapshot.supports_check_constraints);

        let users = snapshot.find_table("users").unwrap();
        let email = users.find_column("email").unwrap();
        assert_eq!(email.column_type, ColumnType::String);
        assert_eq!(email.limit, Some(64));
        assert!(email.null);
        assert_eq!(users.find_column("location").unwrap().column_type, ColumnType::Other);
        assert!(users.check_constraints[0].validated);
    }

    #[test]
    fn snapshot_defaults() {
        let snapshot = SchemaSnapshot::from_json(r#"{"tables": []}"#).unwrap();
        assert_eq!(snapshot.adapter, "PostgreSQL");
        assert!(snapshot.supports_check_constraints);
    }

    #[test]
    fn table_builder() {
        let table = Table::new("users")
            .with_primary_key("id")
            .with_column(Column::new("id", ColumnType::BigInt).not_null())
            .with_column(Column::new("email", ColumnType::String).with_limit(64))
            .with_index(Index::new("index_users_on_email", vec!["email".to_string()]).unique())
            .with_check_constraint(CheckConstraint::new("length(email) <= 64").not_validated());

        assert_eq!(table.primary_key.as_deref(), Some("id"));
        assert!(!table.find_column("id").unwrap().null);
        assert!(table.indexes[0].unique);
        assert!(!table.check_constraints[0].validated);
        assert!(table.find_column("missing").is_none());
    }
}
