//! Detector error types

use modeldoctor_catalog::FetchError;

/// Errors that abort a detector run
///
/// Option errors point at a defect in a detector or in config loading.
/// Fetch errors come from the schema provider and are passed through as-is.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("Detector '{detector}' has no option '{option}'")]
    UnknownOption { detector: String, option: String },

    #[error("Option '{option}' of detector '{detector}' was never loaded")]
    MissingOption { detector: String, option: String },

    #[error("Global option '{option}' is a {found}; only lists can be merged")]
    UnmergeableGlobal { option: String, found: &'static str },

    #[error("Option '{option}' of detector '{detector}' must be a {expected}, found a {found}")]
    InvalidOption {
        detector: String,
        option: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
