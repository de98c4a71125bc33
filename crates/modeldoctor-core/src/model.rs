//! Application-side models and validators
//!
//! A model is the application layer's view of one table, carrying the
//! validators declared on it. Models are handed to detectors through
//! [`ValidationMetadataProvider`]; there is no global registry.

use crate::schema::Column;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Kind of a declared validator
///
/// Only `length` and `inclusion` are interpreted; other kinds are carried so
/// a snapshot can describe a model completely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
    Length,
    Inclusion,
    Presence,
    Uniqueness,
    #[serde(other)]
    Other,
}

/// Values accepted by an inclusion validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueSet {
    /// A literal collection, e.g. `["new", "vip"]`
    Literal(Vec<serde_json::Value>),

    /// A set computed at validation time (a proc, a lambda, a method call);
    /// only its source text is known
    Computed { computed: String },
}

impl ValueSet {
    /// The literal values if every one of them is a string
    pub fn literal_strings(&self) -> Option<Vec<&str>> {
        match self {
            Self::Literal(values) => values.iter().map(|v| v.as_str()).collect(),
            Self::Computed { .. } => None,
        }
    }
}

/// Kind-specific validator options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorOptions {
    /// Upper bound of a length validator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<u32>,

    /// Lower bound of a length validator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<u32>,

    /// Accepted values of an inclusion validator
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_values: Option<ValueSet>,

    /// Alias of `in`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub within: Option<ValueSet>,
}

/// A validator declared on a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    pub kind: ValidatorKind,

    /// Attributes the validator governs
    pub attributes: Vec<String>,

    #[serde(default)]
    pub options: ValidatorOptions,
}

impl Validator {
    /// `validates <attribute>, length: { maximum: <maximum> }`
    pub fn length(attribute: impl Into<String>, maximum: u32) -> Self {
        Self {
            kind: ValidatorKind::Length,
            attributes: vec![attribute.into()],
            options: ValidatorOptions {
                maximum: Some(maximum),
                ..ValidatorOptions::default()
            },
        }
    }

    /// `validates <attribute>, inclusion: { in: <values> }`
    pub fn inclusion(attribute: impl Into<String>, values: ValueSet) -> Self {
        Self {
            kind: ValidatorKind::Inclusion,
            attributes: vec![attribute.into()],
            options: ValidatorOptions {
                in_values: Some(values),
                ..ValidatorOptions::default()
            },
        }
    }

    /// Whether this validator applies to `attribute`
    pub fn governs(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }

    /// The inclusion set, preferring `in` over `within`
    pub fn value_set(&self) -> Option<&ValueSet> {
        self.options.in_values.as_ref().or(self.options.within.as_ref())
    }
}

fn default_inheritance_column() -> String {
    "type".to_string()
}

/// An application model bound (or not) to a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Model name, e.g. "User" or "Admin::User"
    pub name: String,

    /// Backing table; `None` for abstract models
    #[serde(default)]
    pub table_name: Option<String>,

    /// Declared validators, including inherited ones
    #[serde(default)]
    pub validators: Vec<Validator>,

    /// Attribute names the model knows about
    #[serde(default)]
    pub columns: BTreeSet<String>,

    /// Column holding the STI discriminator
    #[serde(default = "default_inheritance_column")]
    pub inheritance_column: String,

    /// Root of the STI hierarchy; `None` means the model is its own base
    #[serde(default)]
    pub base_model: Option<String>,
}

impl Model {
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: Some(table_name.into()),
            validators: Vec::new(),
            columns: BTreeSet::new(),
            inheritance_column: default_inheritance_column(),
            base_model: None,
        }
    }

    /// A model without a table
    pub fn abstract_model(name: impl Into<String>) -> Self {
        Self {
            table_name: None,
            ..Self::new(name, "")
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Make this model an STI subclass of `base`
    pub fn with_base_model(mut self, base: impl Into<String>) -> Self {
        self.base_model = Some(base.into());
        self
    }

    /// Name of the STI root (the model itself when not inheriting)
    pub fn base_model_name(&self) -> &str {
        self.base_model.as_deref().unwrap_or(&self.name)
    }

    /// Whether this is a non-root member of a single-table-inheritance
    /// hierarchy
    pub fn is_sti_subclass(&self) -> bool {
        self.columns.contains(&self.inheritance_column) && self.base_model_name() != self.name
    }

    /// Like [`is_sti_subclass`](Self::is_sti_subclass), but takes the
    /// attribute names from the backing table when the model lists none
    pub fn is_sti_subclass_in(&self, table_columns: &[Column]) -> bool {
        if !self.columns.is_empty() {
            return self.is_sti_subclass();
        }

        self.base_model_name() != self.name
            && table_columns.iter().any(|c| c.name == self.inheritance_column)
    }
}

/// Errors raised while loading snapshots
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("IO error reading {0}: {1}")]
    IoError(String, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Source of the application's models
pub trait ValidationMetadataProvider {
    /// All registered models, in registration order
    fn all_models(&self) -> &[Model];
}

/// Models loaded from a snapshot (models.json)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRegistry {
    pub models: Vec<Model>,
}

impl ModelRegistry {
    pub fn new(models: Vec<Model>) -> Self {
        Self { models }
    }

    /// Load a registry from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ModelError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_json(&contents)
    }

    /// Parse a registry from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::ParseError(e.to_string()))
    }

    pub fn find(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }
}

impl ValidationMetadataProvider for ModelRegistry {
    fn all_models(&self) -> &[Model] {
        &self.models
    }
}
