//! Detector framework
//!
//! A [`Detector`] inspects the schema and the application's models and
//! records typed problems. Everything around that is shared: option
//! resolution, the `enabled` switch, rendering each problem to one output
//! line and turning the outcome into a pass/fail result. That part lives in
//! the blanket [`Check`] implementation, which is also the object-safe face
//! the registry and runner work with.

use crate::error::DetectorError;
use crate::resolver::ConfigResolver;
use heck::ToSnakeCase;
use modeldoctor_catalog::CachingSchemaInspector;
use modeldoctor_core::config::ENABLED;
use modeldoctor_core::{
    Column, Config, ConfigSchema, ForeignKey, Index, Model, OptionSpec, ValidationMetadataProvider,
};
use regex::{Regex, RegexBuilder};
use std::io::Write;

/// A consistency rule
pub trait Detector {
    /// Detector-specific problem record
    type Problem;

    /// One-line summary shown by `modeldoctor list`
    fn description(&self) -> &'static str;

    /// Options besides `enabled`
    fn options(&self) -> Vec<OptionSpec> {
        Vec::new()
    }

    /// Inspect and record problems through `ctx`
    fn detect(&self, ctx: &mut DetectorContext<'_, Self::Problem>) -> Result<(), DetectorError>;

    /// Render one problem as a single line of text
    fn message(&self, problem: &Self::Problem) -> String;

    /// Config key, derived from the type name: `IncorrectLengthValidation`
    /// becomes `incorrect_length_validation`
    fn identifier(&self) -> String {
        identifier_of::<Self>()
    }

    /// Every recognized option, `enabled` included
    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(self.options())
    }
}

fn identifier_of<T: ?Sized>() -> String {
    let path = std::any::type_name::<T>();
    let path = path.split('<').next().unwrap_or(path);
    let name = path.rsplit("::").next().unwrap_or(path);
    name.to_snake_case()
}

/// Static metadata of a detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorInfo {
    pub identifier: String,
    pub description: &'static str,
    pub schema: ConfigSchema,
}

/// Object-safe view of a [`Detector`]
pub trait Check {
    fn info(&self) -> DetectorInfo;

    /// Run the detector and render every problem it found, in discovery
    /// order
    ///
    /// A disabled detector yields no messages.
    fn inspect(
        &self,
        config: &Config,
        inspector: &CachingSchemaInspector<'_>,
        models: &dyn ValidationMetadataProvider,
    ) -> Result<Vec<String>, DetectorError>;

    /// Run the detector, writing one line per problem to `out`
    ///
    /// Returns `Ok(true)` when no problem was found or the detector is
    /// disabled.
    fn run(
        &self,
        config: &Config,
        inspector: &CachingSchemaInspector<'_>,
        models: &dyn ValidationMetadataProvider,
        out: &mut dyn Write,
    ) -> Result<bool, DetectorError> {
        let messages = self.inspect(config, inspector, models)?;
        for message in &messages {
            writeln!(out, "{}", message)?;
        }
        Ok(messages.is_empty())
    }
}

impl<D: Detector> Check for D {
    fn info(&self) -> DetectorInfo {
        DetectorInfo {
            identifier: self.identifier(),
            description: self.description(),
            schema: self.config_schema(),
        }
    }

    fn inspect(
        &self,
        config: &Config,
        inspector: &CachingSchemaInspector<'_>,
        models: &dyn ValidationMetadataProvider,
    ) -> Result<Vec<String>, DetectorError> {
        let identifier = self.identifier();
        let schema = self.config_schema();
        let resolver = ConfigResolver::new(&identifier, &schema, config);

        if !resolver.flag(ENABLED)? {
            tracing::debug!(detector = %identifier, "detector disabled");
            return Ok(Vec::new());
        }

        tracing::debug!(detector = %identifier, "running detector");
        let mut ctx = DetectorContext::new(resolver, inspector, models);
        self.detect(&mut ctx)?;

        let messages: Vec<String> = ctx
            .into_problems()
            .iter()
            .map(|problem| self.message(problem))
            .collect();

        tracing::debug!(detector = %identifier, problems = messages.len(), "detector finished");
        Ok(messages)
    }
}

/// Everything a detector may consult during one run
///
/// Schema lookups go through the run's [`CachingSchemaInspector`]; models come
/// from the [`ValidationMetadataProvider`] handed to the run.
pub struct DetectorContext<'a, P> {
    config: ConfigResolver<'a>,
    inspector: &'a CachingSchemaInspector<'a>,
    models: &'a dyn ValidationMetadataProvider,
    problems: Vec<P>,
}

impl<'a, P> DetectorContext<'a, P> {
    pub fn new(
        config: ConfigResolver<'a>,
        inspector: &'a CachingSchemaInspector<'a>,
        models: &'a dyn ValidationMetadataProvider,
    ) -> Self {
        Self {
            config,
            inspector,
            models,
            problems: Vec::new(),
        }
    }

    /// Record a problem
    pub fn problem(&mut self, problem: P) {
        self.problems.push(problem);
    }

    /// Problems recorded so far, in discovery order
    pub fn problems(&self) -> &[P] {
        &self.problems
    }

    pub fn into_problems(self) -> Vec<P> {
        self.problems
    }

    /// Report something the user should know that is not a problem
    pub fn warning(&self, message: &str) {
        tracing::warn!(detector = self.config.detector(), "{}", message);
    }

    pub fn config(&self) -> &ConfigResolver<'a> {
        &self.config
    }

    /// Effective value of a boolean option
    pub fn flag(&self, option: &str) -> Result<bool, DetectorError> {
        self.config.flag(option)
    }

    /// Effective value of a list option
    pub fn list(&self, option: &str) -> Result<Vec<String>, DetectorError> {
        self.config.list(option)
    }

    pub fn inspector(&self) -> &'a CachingSchemaInspector<'a> {
        self.inspector
    }

    /// Table names, minus `except`
    pub fn tables(&self, except: &[String]) -> Result<Vec<String>, DetectorError> {
        Ok(self
            .inspector
            .tables()?
            .iter()
            .filter(|table| !except.contains(table))
            .cloned()
            .collect())
    }

    pub fn columns(&self, table: &str) -> Result<Vec<Column>, DetectorError> {
        Ok(self.inspector.columns(table)?)
    }

    pub fn column(&self, table: &str, name: &str) -> Result<Option<Column>, DetectorError> {
        Ok(self.columns(table)?.into_iter().find(|column| column.name == name))
    }

    /// The primary key column of `table`, if it has a single-column key
    pub fn primary_key(&self, table: &str) -> Result<Option<Column>, DetectorError> {
        match self.inspector.primary_key(table)? {
            Some(name) => self.column(table, &name),
            None => Ok(None),
        }
    }

    /// Indexes on `table` whose names are not in `except`
    pub fn indexes(&self, table: &str, except: &[String]) -> Result<Vec<Index>, DetectorError> {
        Ok(self
            .inspector
            .indexes(table)?
            .into_iter()
            .filter(|index| !except.contains(&index.name))
            .collect())
    }

    pub fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>, DetectorError> {
        Ok(self.inspector.foreign_keys(table)?)
    }

    /// Validated check constraint expressions on `table`
    pub fn check_constraints(&self, table: &str) -> Result<Vec<String>, DetectorError> {
        Ok(self.inspector.check_constraints(table)?)
    }

    /// Whether a check constraint on `table` is exactly `<column> IS NOT NULL`
    pub fn not_null_check_constraint_exists(
        &self,
        table: &str,
        column: &Column,
    ) -> Result<bool, DetectorError> {
        let constraints = self.check_constraints(table)?;
        if constraints.is_empty() {
            return Ok(false);
        }

        let quoted = self.inspector.provider().quote_column_name(&column.name);
        let pattern = not_null_pattern(&column.name, &quoted);
        Ok(constraints.iter().any(|definition| pattern.is_match(definition)))
    }

    /// Models, minus `except` and the join models generated for
    /// has-and-belongs-to-many associations
    pub fn models(&self, except: &[String]) -> Vec<&'a Model> {
        self.models
            .all_models()
            .iter()
            .filter(|model| !model.name.starts_with("HABTM_") && !except.contains(&model.name))
            .collect()
    }

    /// Like [`models`](Self::models), restricted to models whose table
    /// exists
    pub fn models_with_tables(&self, except: &[String]) -> Result<Vec<&'a Model>, DetectorError> {
        let mut models = Vec::new();
        for model in self.models(except) {
            let Some(table) = model.table_name.as_deref() else {
                continue;
            };
            if self.inspector.table_exists(table)? {
                models.push(model);
            }
        }
        Ok(models)
    }
}

fn not_null_pattern(column: &str, quoted: &str) -> Regex {
    RegexBuilder::new(&format!(
        r"\A(?:{}|{}) IS NOT NULL\z",
        regex::escape(column),
        regex::escape(quoted)
    ))
        .case_insensitive(true)
        .build()
        .expect("escaped column name is a valid regex")
}
