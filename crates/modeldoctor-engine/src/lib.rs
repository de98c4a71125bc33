//! ModelDoctor engine - detectors and inspection runs
//!
//! This crate implements the detection side of ModelDoctor:
//! - The [`Detector`] trait and the shared run logic around it
//! - Option resolution with global merging ([`ConfigResolver`])
//! - The detector registry and the [`Runner`]
//! - Built-in detectors

pub mod detector;
pub mod detectors;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod runner;

pub use detector::{Check, Detector, DetectorContext, DetectorInfo};
pub use detectors::{IncorrectLengthValidation, LengthMismatch};
pub use error::DetectorError;
pub use registry::DetectorRegistry;
pub use resolver::ConfigResolver;
pub use runner::Runner;
