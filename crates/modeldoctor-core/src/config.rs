//! Configuration schema (modeldoctor.toml)
//!
//! A config file has two tables: `[globals]`, shared by every detector that
//! declares the option global, and `[detectors.<identifier>]` with options
//! local to one detector.
//!
//! ```toml
//! [globals]
//! ignore_models = ["LegacyUser"]
//!
//! [detectors.incorrect_length_validation]
//! enabled = true
//! ignore_attributes = ["User.bio"]
//! ```
//!
//! Loading only parses. [`Config::prepare`] validates the result against the
//! registered detectors' schemas and fills in defaults, after which every
//! declared option has a local value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A configuration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    List(Vec<String>),
}

impl OptionValue {
    /// An empty list
    pub fn empty_list() -> Self {
        Self::List(Vec::new())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            Self::Bool(_) => None,
        }
    }

    /// Name of the value's shape, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::List(_) => "list",
        }
    }

    fn same_kind(&self, other: &OptionValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for OptionValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(String::from).collect())
    }
}

/// Declared metadata of one detector option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,

    /// Whether the option also reads the same-named `[globals]` entry
    pub global: bool,

    /// Value used when the config file does not set the option
    pub default: OptionValue,
}

impl OptionSpec {
    /// A list option, empty by default
    pub fn list(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            global: false,
            default: OptionValue::empty_list(),
        }
    }

    /// Also merge the `[globals]` entry of the same name
    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }
}

/// The `enabled` option every detector has
pub const ENABLED: &str = "enabled";

/// The options a detector recognizes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSchema {
    options: Vec<OptionSpec>,
}

impl ConfigSchema {
    /// Build a schema from detector-specific options; `enabled` is added
    /// implicitly
    pub fn new(options: Vec<OptionSpec>) -> Self {
        let mut all = vec![OptionSpec {
            name: ENABLED,
            description: "set to false to disable the detector altogether",
            global: false,
            default: OptionValue::Bool(true),
        }];
        all.extend(options.into_iter().filter(|o| o.name != ENABLED));
        Self { options: all }
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Options shared by all detectors declaring them global
    #[serde(default)]
    pub globals: BTreeMap<String, OptionValue>,

    /// Per-detector options keyed by detector identifier
    #[serde(default)]
    pub detectors: BTreeMap<String, BTreeMap<String, OptionValue>>,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Validate against the detectors' schemas and fill in defaults
    ///
    /// `schemas` pairs each detector identifier with its schema. Unknown
    /// detectors, unknown options, globals no detector declares, non-list
    /// globals and values whose shape differs from the declared default are
    /// rejected.
    pub fn prepare(mut self, schemas: &[(String, ConfigSchema)]) -> Result<Self, ConfigError> {
        for (detector, options) in &self.detectors {
            let (_, schema) = schemas
                .iter()
                .find(|(id, _)| id == detector)
                .ok_or_else(|| ConfigError::UnknownDetector(detector.clone()))?;

            for (name, value) in options {
                let spec = schema.get(name).ok_or_else(|| ConfigError::UnknownOption {
                    detector: detector.clone(),
                    option: name.clone(),
                })?;
                check_kind(name, value, &spec.default)?;
            }
        }

        for (name, value) in &self.globals {
            let spec = schemas
                .iter()
                .filter_map(|(_, schema)| schema.get(name))
                .find(|spec| spec.global)
                .ok_or_else(|| ConfigError::UnknownGlobal(name.clone()))?;

            if value.as_list().is_none() {
                return Err(ConfigError::InvalidValue {
                    option: name.clone(),
                    expected: "list",
                    found: value.kind(),
                });
            }
            check_kind(name, value, &spec.default)?;
        }

        for (detector, schema) in schemas {
            let options = self.detectors.entry(detector.clone()).or_default();
            for spec in schema.options() {
                options
                    .entry(spec.name.to_string())
                    .or_insert_with(|| spec.default.clone());
            }
        }

        Ok(self)
    }

    /// The local value of `option` for `detector`
    pub fn local(&self, detector: &str, option: &str) -> Option<&OptionValue> {
        self.detectors.get(detector).and_then(|options| options.get(option))
    }

    /// The global value of `option`
    pub fn global(&self, option: &str) -> Option<&OptionValue> {
        self.globals.get(option)
    }

    /// Set a local option, e.g. from a command-line override
    pub fn set_local(&mut self, detector: &str, option: &str, value: impl Into<OptionValue>) {
        self.detectors
            .entry(detector.to_string())
            .or_default()
            .insert(option.to_string(), value.into());
    }

    /// Set a global option
    pub fn set_global(&mut self, option: &str, value: impl Into<OptionValue>) {
        self.globals.insert(option.to_string(), value.into());
    }
}

fn check_kind(name: &str, value: &OptionValue, default: &OptionValue) -> Result<(), ConfigError> {
    if value.same_kind(default) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            option: name.to_string(),
            expected: default.kind(),
            found: value.kind(),
        })
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Unknown detector '{0}'")]
    UnknownDetector(String),

    #[error("Detector '{detector}' has no option '{option}'")]
    UnknownOption { detector: String, option: String },

    #[error("No detector declares a global option '{0}'")]
    UnknownGlobal(String),

    #[error("Option '{option}' must be a {expected}, found a {found}")]
    InvalidValue {
        option: String,
        expected: &'static str,
        found: &'static str,
    },
}
