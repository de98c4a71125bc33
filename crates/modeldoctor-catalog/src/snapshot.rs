//! Snapshot schema provider
//!
//! This provider answers from a [`SchemaSnapshot`] held in memory instead of a
//! live connection. It's useful for:
//! - Inspecting a schema dumped to `schema.json`
//! - Unit testing detectors without a database
//! - Simulating other adapters and failing queries
//!
//! ## Usage
//!
//! ```rust,ignore
//! use modeldoctor_catalog::SnapshotProvider;
//! use modeldoctor_core::{Column, ColumnType, Table};
//!
//! let provider = SnapshotProvider::new()
//!     .with_table(Table::new("users").with_column(
//!         Column::new("email", ColumnType::String).with_limit(64),
//!     ));
//!
//! let columns = provider.columns("users")?;
//! ```

use crate::adapter::{FetchError, SchemaMetadataProvider};
use modeldoctor_core::{CheckConstraint, Column, ForeignKey, Index, SchemaSnapshot, Table};
use std::collections::HashMap;

/// In-memory schema provider
#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    snapshot: SchemaSnapshot,

    /// Errors to return for specific tables
    errors: HashMap<String, FetchError>,
}

impl SnapshotProvider {
    /// Create an empty PostgreSQL-flavoured provider with native check
    /// constraint support
    pub fn new() -> Self {
        Self::from_snapshot(SchemaSnapshot {
            adapter: "PostgreSQL".to_string(),
            supports_check_constraints: true,
            tables: Vec::new(),
        })
    }

    /// Serve a loaded snapshot
    pub fn from_snapshot(snapshot: SchemaSnapshot) -> Self {
        Self {
            snapshot,
            errors: HashMap::new(),
        }
    }

    /// Add a table
    pub fn with_table(mut self, table: Table) -> Self {
        self.snapshot.tables.push(table);
        self
    }

    /// Pretend to be a different adapter
    pub fn with_adapter(mut self, adapter: impl Into<String>) -> Self {
        self.snapshot.adapter = adapter.into();
        self
    }

    /// Disable native check constraint listing
    pub fn without_check_constraint_support(mut self) -> Self {
        self.snapshot.supports_check_constraints = false;
        self
    }

    /// Fail every query about `table` with `error`
    pub fn with_error(mut self, table: impl Into<String>, error: FetchError) -> Self {
        self.errors.insert(table.into(), error);
        self
    }

    /// The underlying snapshot
    pub fn snapshot(&self) -> &SchemaSnapshot {
        &self.snapshot
    }

    fn table(&self, name: &str) -> Result<&Table, FetchError> {
        if let Some(error) = self.errors.get(name) {
            return Err(error.clone());
        }

        self.snapshot
            .find_table(name)
            .ok_or_else(|| FetchError::TableNotFound(name.to_string()))
    }
}

impl Default for SnapshotProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaMetadataProvider for SnapshotProvider {
    fn adapter_name(&self) -> &str {
        &self.snapshot.adapter
    }

    fn tables(&self) -> Result<Vec<String>, FetchError> {
        Ok(self.snapshot.tables.iter().map(|t| t.name.clone()).collect())
    }

    fn primary_key(&self, table: &str) -> Result<Option<String>, FetchError> {
        Ok(self.table(table)?.primary_key.clone())
    }

    fn columns(&self, table: &str) -> Result<Vec<Column>, FetchError> {
        Ok(self.table(table)?.columns.clone())
    }

    fn indexes(&self, table: &str) -> Result<Vec<Index>, FetchError> {
        Ok(self.table(table)?.indexes.clone())
    }

    fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>, FetchError> {
        Ok(self.table(table)?.foreign_keys.clone())
    }

    fn supports_check_constraints(&self) -> bool {
        self.snapshot.supports_check_constraints
    }

    fn check_constraints(&self, table: &str) -> Result<Vec<CheckConstraint>, FetchError> {
        if !self.snapshot.supports_check_constraints {
            return Err(FetchError::Unsupported {
                adapter: self.snapshot.adapter.clone(),
                feature: "listing check constraints",
            });
        }

        Ok(self.table(table)?.check_constraints.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modeldoctor_core::ColumnType;

    fn users() -> Table {
        Table::new("users")
            .with_primary_key("id")
            .with_column(Column::new("id", ColumnType::BigInt).not_null())
            .with_column(Column::new("email", ColumnType::String).with_limit(64))
            .with_check_constraint(CheckConstraint::new("length(email) <= 64"))
    }

    #[test]
    fn test_snapshot_provider_basic() {
        let provider = SnapshotProvider::new().with_table(users());

        assert_eq!(provider.adapter_name(), "PostgreSQL");
        assert_eq!(provider.tables().unwrap(), vec!["users"]);
        assert_eq!(provider.primary_key("users").unwrap().as_deref(), Some("id"));
        assert_eq!(provider.columns("users").unwrap().len(), 2);
        assert_eq!(provider.check_constraints("users").unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot_provider_missing_table() {
        let provider = SnapshotProvider::new();
        assert!(matches!(
            provider.columns("ghosts"),
            Err(FetchError::TableNotFound(name)) if name == "ghosts"
        ));
    }

    #[test]
    fn test_snapshot_provider_without_check_constraints() {
        let provider = SnapshotProvider::new()
            .with_adapter("Mysql2")
            .without_check_constraint_support()
            .with_table(users());

        assert!(!provider.supports_check_constraints());
        assert!(!provider.is_postgresql());
        assert!(matches!(
            provider.check_constraints("users"),
            Err(FetchError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_snapshot_provider_injected_error() {
        let provider = SnapshotProvider::new()
            .with_table(users())
            .with_error("users", FetchError::ConnectionError("server closed the connection".to_string()));

        assert!(matches!(provider.indexes("users"), Err(FetchError::ConnectionError(_))));
        assert!(provider.tables().is_ok());
    }
}
