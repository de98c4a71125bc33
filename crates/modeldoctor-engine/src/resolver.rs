//! Effective option values for one detector run
//!
//! Every option has a local value (filled in by [`Config::prepare`] when the
//! file does not set it). Options declared global additionally pick up the
//! same-named `[globals]` entry: the effective value is the local list
//! followed by the global list.

use crate::error::DetectorError;
use modeldoctor_core::{Config, ConfigSchema, OptionValue};
use std::borrow::Cow;

/// Resolves option values for a single detector
#[derive(Debug, Clone, Copy)]
pub struct ConfigResolver<'a> {
    detector: &'a str,
    schema: &'a ConfigSchema,
    config: &'a Config,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(detector: &'a str, schema: &'a ConfigSchema, config: &'a Config) -> Self {
        Self {
            detector,
            schema,
            config,
        }
    }

    /// Identifier of the detector being resolved for
    pub fn detector(&self) -> &'a str {
        self.detector
    }

    /// The effective value of `option`
    pub fn resolve(&self, option: &str) -> Result<Cow<'a, OptionValue>, DetectorError> {
        let spec = self
            .schema
            .get(option)
            .ok_or_else(|| DetectorError::UnknownOption {
                detector: self.detector.to_string(),
                option: option.to_string(),
            })?;

        let local = self
            .config
            .local(self.detector, option)
            .ok_or_else(|| DetectorError::MissingOption {
                detector: self.detector.to_string(),
                option: option.to_string(),
            })?;

        if !spec.global {
            return Ok(Cow::Borrowed(local));
        }

        match (local, self.config.global(option)) {
            (_, None) => Ok(Cow::Borrowed(local)),
            (OptionValue::List(local), Some(OptionValue::List(global))) => {
                let merged = local.iter().chain(global).cloned().collect();
                Ok(Cow::Owned(OptionValue::List(merged)))
            }
            (OptionValue::List(_), Some(global)) => Err(DetectorError::UnmergeableGlobal {
                option: option.to_string(),
                found: global.kind(),
            }),
            (local, Some(_)) => Err(DetectorError::UnmergeableGlobal {
                option: option.to_string(),
                found: local.kind(),
            }),
        }
    }

    /// The effective value of a boolean option
    pub fn flag(&self, option: &str) -> Result<bool, DetectorError> {
        let value = self.resolve(option)?;
        value.as_bool().ok_or_else(|| self.invalid(option, "boolean", &value))
    }

    /// The effective value of a list option
    pub fn list(&self, option: &str) -> Result<Vec<String>, DetectorError> {
        match self.resolve(option)? {
            Cow::Owned(OptionValue::List(values)) => Ok(values),
            Cow::Borrowed(OptionValue::List(values)) => Ok(values.clone()),
            value => Err(self.invalid(option, "list", &value)),
        }
    }

    fn invalid(&self, option: &str, expected: &'static str, found: &OptionValue) -> DetectorError {
        DetectorError::InvalidOption {
            detector: self.detector.to_string(),
            option: option.to_string(),
            expected,
            found: found.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modeldoctor_core::OptionSpec;
    use pretty_assertions::assert_eq;

    const DETECTOR: &str = "incorrect_length_validation";

    fn schema() -> ConfigSchema {
        ConfigSchema::new(vec![
            OptionSpec::list("ignore_models", "models to skip").global(),
            OptionSpec::list("ignore_attributes", "attributes to skip"),
        ])
    }

    fn config() -> Config {
        Config::default()
            .prepare(&[(DETECTOR.to_string(), schema())])
            .unwrap()
    }

    #[test]
    fn non_global_returns_local_verbatim() {
        let schema = schema();
        let mut config = config();
        config.set_local(DETECTOR, "ignore_attributes", vec!["User.bio"]);
        // Not declared global, so a stray global entry is never consulted
        config.set_global("ignore_attributes", vec!["User.email"]);

        let resolver = ConfigResolver::new(DETECTOR, &schema, &config);
        assert_eq!(resolver.list("ignore_attributes").unwrap(), vec!["User.bio"]);
    }

    #[test]
    fn global_without_global_value_returns_local() {
        let schema = schema();
        let mut config = config();
        config.set_local(DETECTOR, "ignore_models", vec!["Admin"]);

        let resolver = ConfigResolver::new(DETECTOR, &schema, &config);
        assert!(matches!(resolver.resolve("ignore_models").unwrap(), Cow::Borrowed(_)));
        assert_eq!(resolver.list("ignore_models").unwrap(), vec!["Admin"]);
    }

    #[test]
    fn global_merges_local_first() {
        let schema = schema();
        let mut config = config();
        config.set_local(DETECTOR, "ignore_models", vec!["Admin", "Client"]);
        config.set_global("ignore_models", vec!["LegacyUser", "Admin"]);

        let resolver = ConfigResolver::new(DETECTOR, &schema, &config);
        assert_eq!(
            resolver.list("ignore_models").unwrap(),
            vec!["Admin", "Client", "LegacyUser", "Admin"]
        );
    }

    #[test]
    fn enabled_defaults_to_true() {
        let schema = schema();
        let config = config();

        let resolver = ConfigResolver::new(DETECTOR, &schema, &config);
        assert!(resolver.flag("enabled").unwrap());
    }

    #[test]
    fn unknown_option_is_an_error() {
        let schema = schema();
        let config = config();

        let resolver = ConfigResolver::new(DETECTOR, &schema, &config);
        let err = resolver.resolve("ignore_tables").unwrap_err();
        assert!(matches!(err, DetectorError::UnknownOption { option, .. } if option == "ignore_tables"));
    }

    #[test]
    fn unloaded_option_is_an_error() {
        let schema = schema();
        let config = Config::default();

        let resolver = ConfigResolver::new(DETECTOR, &schema, &config);
        let err = resolver.resolve("ignore_models").unwrap_err();
        assert!(matches!(err, DetectorError::MissingOption { .. }));
    }

    #[test]
    fn scalar_global_cannot_be_merged() {
        let schema = schema();
        let mut config = config();
        config.set_global("ignore_models", true);

        let resolver = ConfigResolver::new(DETECTOR, &schema, &config);
        let err = resolver.resolve("ignore_models").unwrap_err();
        assert!(matches!(err, DetectorError::UnmergeableGlobal { found: "boolean", .. }));
    }

    #[test]
    fn wrong_shape_is_an_error() {
        let schema = schema();
        let config = config();

        let resolver = ConfigResolver::new(DETECTOR, &schema, &config);
        assert!(matches!(
            resolver.flag("ignore_attributes"),
            Err(DetectorError::InvalidOption { expected: "boolean", found: "list", .. })
        ));
        assert!(matches!(
            resolver.list("enabled"),
            Err(DetectorError::InvalidOption { expected: "list", found: "boolean", .. })
        ));
    }
}
