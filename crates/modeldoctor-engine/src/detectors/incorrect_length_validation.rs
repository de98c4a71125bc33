//! Length limit consistency between the schema and length validators
//!
//! For every string or text attribute, the database-side limit (a column
//! limit, or failing that a `length(column) <= N` check constraint) must
//! match the `maximum` of the model's length validator. Both being absent is
//! fine too.

use crate::detector::{Detector, DetectorContext};
use crate::error::DetectorError;
use modeldoctor_core::{Column, Model, OptionSpec, ValidatorKind};
use regex::{Regex, RegexBuilder};

const IGNORE_MODELS: &str = "ignore_models";
const IGNORE_ATTRIBUTES: &str = "ignore_attributes";

/// Detects mismatches between database length limits and model length
/// validations
#[derive(Debug, Default, Clone, Copy)]
pub struct IncorrectLengthValidation;

/// A string attribute whose two length limits disagree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthMismatch {
    pub model: String,
    pub attribute: String,
    pub table: String,
    pub database_maximum: Option<u32>,
    pub model_maximum: Option<u32>,
}

impl Detector for IncorrectLengthValidation {
    type Problem = LengthMismatch;

    fn description(&self) -> &'static str {
        "detect mismatches between database length limits and model length validations"
    }

    fn options(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec::list(IGNORE_MODELS, "models whose validators should not be checked").global(),
            OptionSpec::list(
                IGNORE_ATTRIBUTES,
                "attributes, written as Model.attribute, whose validators should not be checked",
            ),
        ]
    }

    fn detect(&self, ctx: &mut DetectorContext<'_, LengthMismatch>) -> Result<(), DetectorError> {
        let ignore_models = ctx.list(IGNORE_MODELS)?;
        let ignore_attributes = ctx.list(IGNORE_ATTRIBUTES)?;

        for model in ctx.models_with_tables(&ignore_models)? {
            let Some(table) = model.table_name.as_deref() else {
                continue;
            };

            let columns = ctx.columns(table)?;
            let sti_subclass = model.is_sti_subclass_in(&columns);

            for column in columns {
                if !column.column_type.is_textual()
                    || ignore_attributes.contains(&format!("{}.{}", model.name, column.name))
                {
                    continue;
                }

                let model_maximum = maximum_allowed_by_length_validation(model, &column.name);
                let database_maximum = column_limit(ctx, table, &column)?;
                if model_maximum == database_maximum {
                    continue;
                }

                if let Some(limit) = column.limit {
                    if covered_by_inclusion_validation(model, &column.name, limit) {
                        continue;
                    }
                }

                // Only the STI root reports a limit missing on one side
                if (model_maximum.is_none() || database_maximum.is_none()) && sti_subclass {
                    continue;
                }

                ctx.problem(LengthMismatch {
                    model: model.name.clone(),
                    attribute: column.name.clone(),
                    table: table.to_string(),
                    database_maximum,
                    model_maximum,
                });
            }
        }

        Ok(())
    }

    fn message(&self, problem: &LengthMismatch) -> String {
        let LengthMismatch {
            model,
            attribute,
            table,
            database_maximum,
            model_maximum,
        } = problem;

        match (database_maximum, model_maximum) {
            (Some(database), Some(maximum)) => format!(
                "the schema limits {table}.{attribute} to {database} characters but the length validator on {model}.{attribute} enforces a maximum of {maximum} characters - set both limits to the same value or remove both"
            ),
            (Some(database), None) => format!(
                "the schema limits {table}.{attribute} to {database} characters but there's no length validator on {model}.{attribute} - remove the database limit or add the validator"
            ),
            (None, Some(maximum)) => format!(
                "the length validator on {model}.{attribute} enforces a maximum of {maximum} characters but there's no schema limit on {table}.{attribute} - remove the validator or the schema length limit"
            ),
            (None, None) => format!(
                "neither the schema nor the validators limit the length of {model}.{attribute}"
            ),
        }
    }
}

/// `maximum` of the first length validator on `attribute` that declares one
fn maximum_allowed_by_length_validation(model: &Model, attribute: &str) -> Option<u32> {
    model
        .validators
        .iter()
        .find(|v| v.kind == ValidatorKind::Length && v.options.maximum.is_some() && v.governs(attribute))
        .and_then(|v| v.options.maximum)
}

/// Whether the first inclusion validator on `attribute` only admits literal
/// strings no longer than `limit`
fn covered_by_inclusion_validation(model: &Model, attribute: &str, limit: u32) -> bool {
    let Some(validator) = model
        .validators
        .iter()
        .find(|v| v.kind == ValidatorKind::Inclusion && v.governs(attribute))
    else {
        return false;
    };

    let Some(values) = validator.value_set().and_then(|set| set.literal_strings()) else {
        return false;
    };

    values
        .iter()
        .map(|value| value.chars().count())
        .max()
        .is_some_and(|longest| longest <= limit as usize)
}

/// The database-side limit of `column`
fn column_limit<P>(
    ctx: &DetectorContext<'_, P>,
    table: &str,
    column: &Column,
) -> Result<Option<u32>, DetectorError> {
    if let Some(limit) = column.limit {
        return Ok(Some(limit));
    }

    let constraints = ctx.check_constraints(table)?;
    if constraints.is_empty() {
        return Ok(None);
    }

    let pattern = length_limit_pattern(&column.name);
    Ok(constraints
        .iter()
        .find_map(|expression| length_limit_from_check_constraint(expression, &pattern)))
}

/// Pattern for a check constraint of the form `length(column) <= N`
///
/// Accepts `char_length` and `character_length`, quoted column names, a
/// trailing cast and the extra parentheses PostgreSQL adds when it prints a
/// constraint back, e.g. `char_length((name)::text) <= 64`.
pub fn length_limit_pattern(column: &str) -> Regex {
    let pattern = format!(
        r#"\b(?:char_|character_)?length\(\s*\(?\s*['"`]?{}['"`]?\s*\)?\s*(?:::\s*[a-z_]+(?:\s+[a-z_]+)*)?\s*\)\s*<=\s*(\d+)"#,
        regex::escape(column)
    );
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .expect("escaped column name is a valid regex")
}

/// Extract `N` from `expression` using a [`length_limit_pattern`]
pub fn length_limit_from_check_constraint(expression: &str, pattern: &Regex) -> Option<u32> {
    pattern
        .captures(expression)
        .and_then(|captures| captures.get(1))
        .and_then(|limit| limit.as_str().parse().ok())
}
