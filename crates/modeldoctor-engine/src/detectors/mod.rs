//! Built-in detectors

pub mod incorrect_length_validation;

pub use incorrect_length_validation::{
    length_limit_from_check_constraint, length_limit_pattern, IncorrectLengthValidation, LengthMismatch,
};
