//! Per-run memoizing view over a schema provider
//!
//! Detectors ask the same questions about the same tables over and over.
//! [`CachingSchemaInspector`] answers each per-table question about indexes,
//! foreign keys and check constraints at most once per run. The schema is
//! assumed not to change while a run is in progress.

use crate::adapter::{FetchError, SchemaMetadataProvider};
use modeldoctor_core::{Column, ForeignKey, Index};
use regex::Regex;
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Memoizing schema inspector, one per inspection run
pub struct CachingSchemaInspector<'p> {
    provider: &'p dyn SchemaMetadataProvider,
    tables: OnceCell<Vec<String>>,
    indexes: RefCell<HashMap<String, Vec<Index>>>,
    foreign_keys: RefCell<HashMap<String, Vec<ForeignKey>>>,
    check_constraints: RefCell<HashMap<String, Vec<String>>>,
}

impl<'p> CachingSchemaInspector<'p> {
    pub fn new(provider: &'p dyn SchemaMetadataProvider) -> Self {
        Self {
            provider,
            tables: OnceCell::new(),
            indexes: RefCell::new(HashMap::new()),
            foreign_keys: RefCell::new(HashMap::new()),
            check_constraints: RefCell::new(HashMap::new()),
        }
    }

    /// The wrapped provider
    pub fn provider(&self) -> &'p dyn SchemaMetadataProvider {
        self.provider
    }

    /// All table names, fetched on first use
    pub fn tables(&self) -> Result<&[String], FetchError> {
        if let Some(tables) = self.tables.get() {
            return Ok(tables.as_slice());
        }

        let tables = self.provider.tables()?;
        tracing::debug!(count = tables.len(), "cached table list");
        Ok(self.tables.get_or_init(|| tables).as_slice())
    }

    /// Whether `table` exists
    pub fn table_exists(&self, table: &str) -> Result<bool, FetchError> {
        Ok(self.tables()?.iter().any(|t| t == table))
    }

    /// Primary key column name, straight from the provider
    pub fn primary_key(&self, table: &str) -> Result<Option<String>, FetchError> {
        self.provider.primary_key(table)
    }

    /// Columns, straight from the provider
    pub fn columns(&self, table: &str) -> Result<Vec<Column>, FetchError> {
        self.provider.columns(table)
    }

    pub fn indexes(&self, table: &str) -> Result<Vec<Index>, FetchError> {
        memoize(&self.indexes, table, || self.provider.indexes(table))
    }

    pub fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>, FetchError> {
        memoize(&self.foreign_keys, table, || self.provider.foreign_keys(table))
    }

    /// Expressions of the validated check constraints on `table`
    ///
    /// An empty result from an adapter without check constraint support
    /// means "unknown", not "there are none".
    pub fn check_constraints(&self, table: &str) -> Result<Vec<String>, FetchError> {
        memoize(&self.check_constraints, table, || self.fetch_check_constraints(table))
    }

    fn fetch_check_constraints(&self, table: &str) -> Result<Vec<String>, FetchError> {
        if self.provider.supports_check_constraints() {
            let constraints = self.provider.check_constraints(table)?;
            return Ok(constraints
                .into_iter()
                .filter(|c| c.validated)
                .map(|c| c.expression)
                .collect());
        }

        if self.provider.is_postgresql() {
            let sql = format!(
                "SELECT pg_get_constraintdef(oid, true) \
                 FROM pg_constraint \
                 WHERE contype = 'c' \
                   AND convalidated \
                   AND conrelid = {}::regclass",
                self.provider.quote(table)
            );
            return match self.provider.select_values(&sql) {
                Ok(definitions) => Ok(definitions
                    .iter()
                    .filter_map(|definition| check_predicate(definition))
                    .collect()),
                Err(FetchError::Unsupported { adapter, feature }) => {
                    tracing::warn!(
                        adapter = %adapter,
                        feature,
                        table,
                        "check constraints are not available"
                    );
                    Ok(Vec::new())
                }
                Err(error) => Err(error),
            };
        }

        tracing::warn!(
            adapter = self.provider.adapter_name(),
            table,
            "check constraints are not supported by this adapter"
        );
        Ok(Vec::new())
    }
}

fn memoize<T: Clone>(
    cache: &RefCell<HashMap<String, Vec<T>>>,
    table: &str,
    fetch: impl FnOnce() -> Result<Vec<T>, FetchError>,
) -> Result<Vec<T>, FetchError> {
    if let Some(cached) = cache.borrow().get(table) {
        return Ok(cached.clone());
    }

    let fetched = fetch()?;
    tracing::debug!(table, count = fetched.len(), "cached table metadata");
    cache.borrow_mut().insert(table.to_string(), fetched.clone());
    Ok(fetched)
}

/// Extract the predicate from a `CHECK (...)` definition
///
/// `CHECK ((char_length(name) <= 64))` yields `(char_length(name) <= 64)`.
pub fn check_predicate(definition: &str) -> Option<String> {
    static CHECK_RE: OnceLock<Regex> = OnceLock::new();
    let re = CHECK_RE
        .get_or_init(|| Regex::new(r"(?s)CHECK \((.+)\)").expect("invalid built-in CHECK regex"));

    re.captures(definition)
        .and_then(|captures| captures.get(1))
        .map(|predicate| predicate.as_str().to_string())
}
