//! Schema metadata providers and the per-run caching inspector
//!
//! A [`SchemaMetadataProvider`] answers structural questions about one
//! database: tables, columns, indexes, foreign keys and check constraints.
//! Detectors never talk to a provider directly; they go through a
//! [`CachingSchemaInspector`], which memoizes per-table lookups for the
//! duration of a run and normalizes check constraint retrieval across
//! backends.
//!
//! ## Features
//!
//! - `postgres` - live PostgreSQL support via [`PostgresProvider`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use modeldoctor_catalog::{CachingSchemaInspector, SnapshotProvider};
//! use modeldoctor_core::SchemaSnapshot;
//!
//! let snapshot = SchemaSnapshot::from_file("schema.json".as_ref())?;
//! let provider = SnapshotProvider::from_snapshot(snapshot);
//! let inspector = CachingSchemaInspector::new(&provider);
//! let constraints = inspector.check_constraints("users")?;
//! ```

pub mod adapter;
pub mod inspector;
pub mod postgres;
pub mod snapshot;

pub use adapter::{FetchError, SchemaMetadataProvider, POSTGRESQL_ADAPTERS};
pub use inspector::{check_predicate, CachingSchemaInspector};
pub use snapshot::SnapshotProvider;

#[cfg(feature = "postgres")]
pub use postgres::PostgresProvider;
