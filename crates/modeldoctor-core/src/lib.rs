//! ModelDoctor Core
//!
//! Shared domain model: the database-side schema snapshot, the
//! application-side models and validators, detector configuration and the
//! run report. Everything here is plain data; querying and detection live in
//! `modeldoctor-catalog` and `modeldoctor-engine`.

pub mod schema;
pub mod model;
pub mod config;
pub mod report;

pub use schema::{CheckConstraint, Column, ColumnType, ForeignKey, Index, SchemaSnapshot, Table};
pub use model::{Model, ModelError, ModelRegistry, ValidationMetadataProvider, Validator, ValidatorKind, ValidatorOptions, ValueSet};
pub use config::{Config, ConfigError, ConfigSchema, OptionSpec, OptionValue};
pub use report::{Finding, Report, ReportSummary, ReportVersion};
