//! Ordered detector registry
//!
//! Detectors run, and are listed, in registration order.

use crate::detector::{Check, Detector};
use crate::detectors::IncorrectLengthValidation;
use modeldoctor_core::ConfigSchema;

type Factory = fn() -> Box<dyn Check>;

fn instantiate<D: Detector + Default + 'static>() -> Box<dyn Check> {
    Box::new(D::default())
}

struct Entry {
    identifier: String,
    factory: Factory,
}

/// Identifier to detector factory, in registration order
#[derive(Default)]
pub struct DetectorRegistry {
    entries: Vec<Entry>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in detector
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register::<IncorrectLengthValidation>();
        registry
    }

    /// Register `D` under its identifier
    ///
    /// Registering an identifier again replaces the factory but keeps the
    /// original position.
    pub fn register<D: Detector + Default + 'static>(&mut self) -> &mut Self {
        let identifier = D::default().identifier();
        let factory: Factory = instantiate::<D>;

        match self.entries.iter_mut().find(|e| e.identifier == identifier) {
            Some(entry) => entry.factory = factory,
            None => self.entries.push(Entry { identifier, factory }),
        }
        self
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.identifier.as_str())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.iter().any(|e| e.identifier == identifier)
    }

    /// A fresh instance of the detector registered as `identifier`
    pub fn get(&self, identifier: &str) -> Option<Box<dyn Check>> {
        self.entries
            .iter()
            .find(|e| e.identifier == identifier)
            .map(|e| (e.factory)())
    }

    /// Fresh instances of every detector
    pub fn detectors(&self) -> impl Iterator<Item = (&str, Box<dyn Check>)> {
        self.entries
            .iter()
            .map(|e| (e.identifier.as_str(), (e.factory)()))
    }

    /// Every detector's config schema, for [`Config::prepare`](modeldoctor_core::Config::prepare)
    pub fn schemas(&self) -> Vec<(String, ConfigSchema)> {
        self.detectors()
            .map(|(identifier, detector)| (identifier.to_string(), detector.info().schema))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
