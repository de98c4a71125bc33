//! Schema metadata provider trait
//!
//! A provider answers structural questions about one database. Providers are
//! queried synchronously, once per inspection run, through
//! [`CachingSchemaInspector`](crate::CachingSchemaInspector).

use modeldoctor_core::{CheckConstraint, Column, ForeignKey, Index};

/// Adapter names of PostgreSQL-family backends
pub const POSTGRESQL_ADAPTERS: &[&str] = &["PostgreSQL", "PostGIS"];

/// Errors that can occur when querying a provider
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Connection failed: {0}")]
    ConnectionError(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not supported by the {adapter} adapter: {feature}")]
    Unsupported {
        adapter: String,
        feature: &'static str,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A connection-like source of schema metadata
pub trait SchemaMetadataProvider {
    /// Adapter identity, e.g. "PostgreSQL", "Mysql2", "SQLite"
    fn adapter_name(&self) -> &str;

    /// All table names in catalog order
    fn tables(&self) -> Result<Vec<String>, FetchError>;

    /// Primary key column name of `table`, if it has a single-column key
    fn primary_key(&self, table: &str) -> Result<Option<String>, FetchError>;

    /// Columns of `table` in declaration order
    ///
    /// Implementations are expected to cache this themselves.
    fn columns(&self, table: &str) -> Result<Vec<Column>, FetchError>;

    fn indexes(&self, table: &str) -> Result<Vec<Index>, FetchError>;

    fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>, FetchError>;

    /// Whether [`check_constraints`](Self::check_constraints) is available
    fn supports_check_constraints(&self) -> bool {
        false
    }

    /// Check constraints of `table` together with their validity flag
    fn check_constraints(&self, _table: &str) -> Result<Vec<CheckConstraint>, FetchError> {
        Err(FetchError::Unsupported {
            adapter: self.adapter_name().to_string(),
            feature: "listing check constraints",
        })
    }

    /// Run a raw catalog query and return the first column of every row
    fn select_values(&self, _sql: &str) -> Result<Vec<String>, FetchError> {
        Err(FetchError::Unsupported {
            adapter: self.adapter_name().to_string(),
            feature: "raw catalog queries",
        })
    }

    /// Quote `value` as an SQL string literal
    fn quote(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Quote `name` as an SQL identifier
    fn quote_column_name(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Whether this is a PostgreSQL-family backend
    fn is_postgresql(&self) -> bool {
        POSTGRESQL_ADAPTERS.contains(&self.adapter_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare(&'static str);

    impl SchemaMetadataProvider for Bare {
        fn adapter_name(&self) -> &str {
            self.0
        }

        fn tables(&self) -> Result<Vec<String>, FetchError> {
            Ok(Vec::new())
        }

        fn primary_key(&self, _table: &str) -> Result<Option<String>, FetchError> {
            Ok(None)
        }

        fn columns(&self, table: &str) -> Result<Vec<Column>, FetchError> {
            Err(FetchError::TableNotFound(table.to_string()))
        }

        fn indexes(&self, _table: &str) -> Result<Vec<Index>, FetchError> {
            Ok(Vec::new())
        }

        fn foreign_keys(&self, _table: &str) -> Result<Vec<ForeignKey>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_postgresql_family() {
        assert!(Bare("PostgreSQL").is_postgresql());
        assert!(Bare("PostGIS").is_postgresql());
        assert!(!Bare("Mysql2").is_postgresql());
        assert!(!Bare("postgresql").is_postgresql());
    }

    #[test]
    fn test_quoting() {
        let provider = Bare("PostgreSQL");
        assert_eq!(provider.quote("users"), "'users'");
        assert_eq!(provider.quote("o'brien"), "'o''brien'");
        assert_eq!(provider.quote_column_name("email"), "\"email\"");
    }

    #[test]
    fn test_optional_capabilities_default_to_unsupported() {
        let provider = Bare("SQLite");
        assert!(!provider.supports_check_constraints());
        assert!(matches!(
            provider.check_constraints("users"),
            Err(FetchError::Unsupported { .. })
        ));
        assert!(matches!(
            provider.select_values("SELECT 1"),
            Err(FetchError::Unsupported { .. })
        ));
    }
}
