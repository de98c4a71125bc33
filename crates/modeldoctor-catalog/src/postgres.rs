//! PostgreSQL schema provider
//!
//! Queries the system catalogs of a live PostgreSQL database. The provider is
//! synchronous: it owns a current-thread tokio runtime and blocks on each
//! query, so an inspection run stays a single sequential pass.
//!
//! Column and primary key lookups are cached here, per table. Index, foreign
//! key and check constraint lookups are cached one level up, by
//! [`CachingSchemaInspector`](crate::CachingSchemaInspector).
//!
//! Check constraints are not listed natively; the inspector falls back to a
//! raw `pg_constraint` query through [`SchemaMetadataProvider::select_values`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! let provider = PostgresProvider::connect(
//!     "host=localhost port=5432 dbname=app_development user=postgres"
//! )?;
//! let inspector = CachingSchemaInspector::new(&provider);
//! ```

use modeldoctor_core::ColumnType;

#[cfg(feature = "postgres")]
pub use driver::PostgresProvider;

/// Map a PostgreSQL `data_type` to a column type category
pub fn map_postgres_type(pg_type: &str) -> ColumnType {
    let base_type = pg_type
        .split('(')
        .next()
        .unwrap_or(pg_type)
        .trim()
        .to_lowercase();

    match base_type.as_str() {
        "character varying" | "varchar" => ColumnType::String,
        "character" | "char" | "bpchar" => ColumnType::String,
        "text" | "citext" => ColumnType::Text,

        "smallint" | "int2" | "integer" | "int" | "int4" => ColumnType::Integer,
        "bigint" | "int8" => ColumnType::BigInt,

        "real" | "float4" | "double precision" | "float8" => ColumnType::Float,
        "numeric" | "decimal" | "money" => ColumnType::Decimal,

        "boolean" | "bool" => ColumnType::Boolean,

        "date" => ColumnType::Date,
        "timestamp without time zone" | "timestamp" => ColumnType::DateTime,
        "timestamp with time zone" | "timestamptz" => ColumnType::DateTime,

        "json" | "jsonb" => ColumnType::Json,
        "bytea" => ColumnType::Binary,
        "uuid" => ColumnType::Uuid,

        _ => ColumnType::Other,
    }
}

#[cfg(feature = "postgres")]
mod driver {
    use crate::adapter::{FetchError, SchemaMetadataProvider};
    use modeldoctor_core::{Column, ForeignKey, Index};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tokio::runtime::Runtime;
    use tokio_postgres::{Client, NoTls, Row};

    const TABLES_SQL: &str = r#"
        SELECT c.relname::text
        FROM pg_catalog.pg_class c
        JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relkind IN ('r', 'p')
          AND n.nspname = ANY (current_schemas(false))
        ORDER BY c.relname
    "#;

    const COLUMNS_SQL: &str = r#"
        SELECT
            column_name::text,
            data_type::text,
            character_maximum_length::int4,
            is_nullable::text
        FROM information_schema.columns
        WHERE table_schema = ANY (current_schemas(false))
          AND table_name = $1
        ORDER BY ordinal_position
    "#;

    const PRIMARY_KEY_SQL: &str = r#"
        SELECT a.attname::text
        FROM pg_catalog.pg_index i
        JOIN pg_catalog.pg_attribute a
          ON a.attrelid = i.indrelid AND a.attnum = ANY (i.indkey)
        WHERE i.indrelid = $1::text::regclass
          AND i.indisprimary
    "#;

    const INDEXES_SQL: &str = r#"
        SELECT
            i.relname::text,
            ix.indisunique,
            array_agg(a.attname::text ORDER BY array_position(ix.indkey::int2[], a.attnum))
        FROM pg_catalog.pg_index ix
        JOIN pg_catalog.pg_class t ON t.oid = ix.indrelid
        JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
        JOIN pg_catalog.pg_attribute a
          ON a.attrelid = t.oid AND a.attnum = ANY (ix.indkey)
        WHERE ix.indrelid = $1::text::regclass
          AND NOT ix.indisprimary
        GROUP BY i.relname, ix.indisunique
        ORDER BY i.relname
    "#;

    const FOREIGN_KEYS_SQL: &str = r#"
        SELECT
            c.conname::text,
            a1.attname::text,
            t2.relname::text,
            a2.attname::text
        FROM pg_catalog.pg_constraint c
        JOIN pg_catalog.pg_class t2 ON t2.oid = c.confrelid
        JOIN pg_catalog.pg_attribute a1
          ON a1.attrelid = c.conrelid AND a1.attnum = c.conkey[1]
        JOIN pg_catalog.pg_attribute a2
          ON a2.attrelid = c.confrelid AND a2.attnum = c.confkey[1]
        WHERE c.contype = 'f'
          AND c.conrelid = $1::text::regclass
        ORDER BY c.conname
    "#;

    /// Live PostgreSQL provider
    pub struct PostgresProvider {
        runtime: Runtime,
        client: Client,
        columns: RefCell<HashMap<String, Vec<Column>>>,
        primary_keys: RefCell<HashMap<String, Option<String>>>,
    }

    impl PostgresProvider {
        /// Connect using a PostgreSQL connection string or URL
        ///
        /// Supports both `host=localhost dbname=app user=postgres` and
        /// `postgres://postgres@localhost/app`.
        pub fn connect(conn_str: &str) -> Result<Self, FetchError> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| FetchError::ConfigError(format!("Failed to start runtime: {}", e)))?;

            let (client, connection) = runtime
                .block_on(tokio_postgres::connect(conn_str, NoTls))
                .map_err(|e| FetchError::ConnectionError(format!("Failed to connect: {}", e)))?;

            // Driven whenever the runtime blocks on a query
            runtime.spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(error = %e, "PostgreSQL connection error");
                }
            });

            Ok(Self {
                runtime,
                client,
                columns: RefCell::new(HashMap::new()),
                primary_keys: RefCell::new(HashMap::new()),
            })
        }

        fn query(&self, sql: &str, table: Option<&str>) -> Result<Vec<Row>, FetchError> {
            let result = match table {
                Some(table) => self.runtime.block_on(self.client.query(sql, &[&table])),
                None => self.runtime.block_on(self.client.query(sql, &[])),
            };

            result.map_err(|e| {
                let err_str = e.to_string();
                match table {
                    Some(table) if err_str.contains("does not exist") => {
                        FetchError::TableNotFound(table.to_string())
                    }
                    _ => FetchError::QueryError(err_str),
                }
            })
        }
    }

    fn get<'a, T>(row: &'a Row, idx: usize) -> Result<T, FetchError>
    where
        T: tokio_postgres::types::FromSql<'a>,
    {
        row.try_get(idx)
            .map_err(|e| FetchError::InvalidResponse(format!("column {}: {}", idx, e)))
    }

    impl SchemaMetadataProvider for PostgresProvider {
        fn adapter_name(&self) -> &str {
            "PostgreSQL"
        }

        fn tables(&self) -> Result<Vec<String>, FetchError> {
            self.query(TABLES_SQL, None)?
                .iter()
                .map(|row| get(row, 0))
                .collect()
        }

        fn primary_key(&self, table: &str) -> Result<Option<String>, FetchError> {
            if let Some(cached) = self.primary_keys.borrow().get(table) {
                return Ok(cached.clone());
            }

            let rows = self.query(PRIMARY_KEY_SQL, Some(table))?;
            // Composite keys have no single primary key column
            let primary_key = match rows.as_slice() {
                [row] => Some(get::<String>(row, 0)?),
                _ => None,
            };

            self.primary_keys
                .borrow_mut()
                .insert(table.to_string(), primary_key.clone());
            Ok(primary_key)
        }

        fn columns(&self, table: &str) -> Result<Vec<Column>, FetchError> {
            if let Some(cached) = self.columns.borrow().get(table) {
                return Ok(cached.clone());
            }

            let mut columns = Vec::new();
            for row in self.query(COLUMNS_SQL, Some(table))? {
                let name: String = get(&row, 0)?;
                let data_type: String = get(&row, 1)?;
                let limit: Option<i32> = get(&row, 2)?;
                let is_nullable: String = get(&row, 3)?;

                columns.push(Column {
                    name,
                    column_type: super::map_postgres_type(&data_type),
                    limit: limit.and_then(|l| u32::try_from(l).ok()),
                    null: is_nullable.eq_ignore_ascii_case("YES"),
                });
            }

            if columns.is_empty() {
                return Err(FetchError::TableNotFound(table.to_string()));
            }

            self.columns
                .borrow_mut()
                .insert(table.to_string(), columns.clone());
            Ok(columns)
        }

        fn indexes(&self, table: &str) -> Result<Vec<Index>, FetchError> {
            self.query(INDEXES_SQL, Some(table))?
                .iter()
                .map(|row| -> Result<Index, FetchError> {
                    Ok(Index {
                        name: get(row, 0)?,
                        unique: get(row, 1)?,
                        columns: get(row, 2)?,
                    })
                })
                .collect()
        }

        fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>, FetchError> {
            self.query(FOREIGN_KEYS_SQL, Some(table))?
                .iter()
                .map(|row| -> Result<ForeignKey, FetchError> {
                    Ok(ForeignKey {
                        name: get(row, 0)?,
                        column: get(row, 1)?,
                        to_table: get(row, 2)?,
                        primary_key: get(row, 3)?,
                    })
                })
                .collect()
        }

        fn select_values(&self, sql: &str) -> Result<Vec<String>, FetchError> {
            let rows = self.query(sql, None)?;
            let mut values = Vec::with_capacity(rows.len());
            for row in &rows {
                if let Some(value) = get::<Option<String>>(row, 0)? {
                    values.push(value);
                }
            }
            Ok(values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_type_mapping() {
        assert_eq!(map_postgres_type("character varying"), ColumnType::String);
        assert_eq!(map_postgres_type("varchar(64)"), ColumnType::String);
        assert_eq!(map_postgres_type("character"), ColumnType::String);
        assert_eq!(map_postgres_type("bpchar"), ColumnType::String);
        assert_eq!(map_postgres_type("text"), ColumnType::Text);
        assert_eq!(map_postgres_type("citext"), ColumnType::Text);
    }

    #[test]
    fn test_basic_type_mapping() {
        assert_eq!(map_postgres_type("integer"), ColumnType::Integer);
        assert_eq!(map_postgres_type("bigint"), ColumnType::BigInt);
        assert_eq!(map_postgres_type("double precision"), ColumnType::Float);
        assert_eq!(map_postgres_type("numeric(10,2)"), ColumnType::Decimal);
        assert_eq!(map_postgres_type("boolean"), ColumnType::Boolean);
        assert_eq!(map_postgres_type("timestamp with time zone"), ColumnType::DateTime);
        assert_eq!(map_postgres_type("jsonb"), ColumnType::Json);
        assert_eq!(map_postgres_type("uuid"), ColumnType::Uuid);
    }

    #[test]
    fn test_unknown_type_mapping() {
        assert_eq!(map_postgres_type("USER-DEFINED"), ColumnType::Other);
        assert_eq!(map_postgres_type("ARRAY"), ColumnType::Other);
        assert_eq!(map_postgres_type("tsvector"), ColumnType::Other);
    }
}
