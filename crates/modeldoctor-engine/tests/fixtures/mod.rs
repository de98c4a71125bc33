//! Shared helpers for detector integration tests

use modeldoctor_catalog::{CachingSchemaInspector, SnapshotProvider};
use modeldoctor_core::{Column, ColumnType, Config, Model, ModelRegistry, Table};
use modeldoctor_engine::{DetectorRegistry, Runner};

/// Output and overall result of one run
pub struct Outcome {
    pub success: bool,
    pub output: String,
}

/// Run every built-in detector over `tables` and `models`
pub fn inspect(tables: Vec<Table>, models: Vec<Model>, config: Config) -> Outcome {
    let provider = tables
        .into_iter()
        .fold(SnapshotProvider::new(), |provider, table| provider.with_table(table));
    inspect_with(&provider, models, config)
}

/// Run every built-in detector against `provider`
pub fn inspect_with(provider: &SnapshotProvider, models: Vec<Model>, config: Config) -> Outcome {
    let registry = DetectorRegistry::builtin();
    let config = config.prepare(&registry.schemas()).expect("invalid test config");
    let inspector = CachingSchemaInspector::new(provider);
    let models = ModelRegistry::new(models);

    let mut out: Vec<u8> = Vec::new();
    let report = Runner::new(&registry, &config)
        .run(&inspector, &models, &mut out)
        .expect("run failed");

    Outcome {
        success: report.is_success(),
        output: String::from_utf8(out).expect("output is not UTF-8"),
    }
}

pub fn string(name: &str) -> Column {
    Column::new(name, ColumnType::String)
}

pub fn users(columns: Vec<Column>) -> Table {
    columns.into_iter().fold(
        Table::new("users")
            .with_primary_key("id")
            .with_column(Column::new("id", ColumnType::BigInt).not_null()),
        |table, column| table.with_column(column),
    )
}

pub fn user_model() -> Model {
    Model::new("User", "users")
}
