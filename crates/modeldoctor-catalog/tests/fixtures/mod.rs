//! Test fixtures for schema provider integration tests
//!
//! Reusable table definitions plus a provider that counts how often it is
//! asked each question, so caching can be observed from the outside.

use modeldoctor_catalog::{FetchError, SchemaMetadataProvider, SnapshotProvider};
use modeldoctor_core::{CheckConstraint, Column, ColumnType, ForeignKey, Index, Table};
use std::cell::{Cell, RefCell};

/// A typical users table
///
/// - Primary key (id)
/// - Length-limited contact columns (email, name)
/// - One validated and one unvalidated check constraint
pub fn users_table() -> Table {
    Table::new("users")
        .with_primary_key("id")
        .with_column(Column::new("id", ColumnType::BigInt).not_null())
        .with_column(Column::new("email", ColumnType::String).with_limit(64).not_null())
        .with_column(Column::new("name", ColumnType::String))
        .with_column(Column::new("bio", ColumnType::Text))
        .with_index(Index::new("index_users_on_email", vec!["email".to_string()]).unique())
        .with_check_constraint(CheckConstraint::new("char_length((name)::text) <= 32"))
        .with_check_constraint(CheckConstraint::new("char_length(bio) <= 1000").not_validated())
}

/// An orders table referencing users
pub fn orders_table() -> Table {
    Table::new("orders")
        .with_primary_key("id")
        .with_column(Column::new("id", ColumnType::BigInt).not_null())
        .with_column(Column::new("user_id", ColumnType::BigInt))
        .with_column(Column::new("status", ColumnType::String).with_limit(16))
        .with_foreign_key(ForeignKey::new("fk_orders_users", "user_id", "users"))
}

/// A provider serving [`users_table`] and [`orders_table`]
pub fn shop_provider() -> SnapshotProvider {
    SnapshotProvider::new()
        .with_table(users_table())
        .with_table(orders_table())
}

/// Wraps a provider and counts calls per question
///
/// Raw catalog queries are answered with canned definitions and recorded
/// verbatim.
pub struct CountingProvider {
    pub inner: SnapshotProvider,
    pub tables_calls: Cell<usize>,
    pub indexes_calls: Cell<usize>,
    pub foreign_keys_calls: Cell<usize>,
    pub check_constraints_calls: Cell<usize>,
    pub raw_queries: RefCell<Vec<String>>,
    pub raw_results: Vec<String>,
}

impl CountingProvider {
    pub fn new(inner: SnapshotProvider) -> Self {
        Self {
            inner,
            tables_calls: Cell::new(0),
            indexes_calls: Cell::new(0),
            foreign_keys_calls: Cell::new(0),
            check_constraints_calls: Cell::new(0),
            raw_queries: RefCell::new(Vec::new()),
            raw_results: Vec::new(),
        }
    }

    /// Answer raw catalog queries with `definitions`
    pub fn with_raw_results(mut self, definitions: Vec<&str>) -> Self {
        self.raw_results = definitions.into_iter().map(String::from).collect();
        self
    }
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

impl SchemaMetadataProvider for CountingProvider {
    fn adapter_name(&self) -> &str {
        self.inner.adapter_name()
    }

    fn tables(&self) -> Result<Vec<String>, FetchError> {
        bump(&self.tables_calls);
        self.inner.tables()
    }

    fn primary_key(&self, table: &str) -> Result<Option<String>, FetchError> {
        self.inner.primary_key(table)
    }

    fn columns(&self, table: &str) -> Result<Vec<Column>, FetchError> {
        self.inner.columns(table)
    }

    fn indexes(&self, table: &str) -> Result<Vec<Index>, FetchError> {
        bump(&self.indexes_calls);
        self.inner.indexes(table)
    }

    fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>, FetchError> {
        bump(&self.foreign_keys_calls);
        self.inner.foreign_keys(table)
    }

    fn supports_check_constraints(&self) -> bool {
        self.inner.supports_check_constraints()
    }

    fn check_constraints(&self, table: &str) -> Result<Vec<CheckConstraint>, FetchError> {
        bump(&self.check_constraints_calls);
        self.inner.check_constraints(table)
    }

    fn select_values(&self, sql: &str) -> Result<Vec<String>, FetchError> {
        bump(&self.check_constraints_calls);
        self.raw_queries.borrow_mut().push(sql.to_string());
        Ok(self.raw_results.clone())
    }
}
