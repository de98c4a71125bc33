//! Inspection runs
//!
//! A [`Runner`] executes the registered detectors one after another against a
//! single [`CachingSchemaInspector`], so all detectors in a run share its
//! cache. Problem lines reach the sink in discovery order and are collected
//! into a [`Report`].

use crate::error::DetectorError;
use crate::registry::DetectorRegistry;
use modeldoctor_catalog::CachingSchemaInspector;
use modeldoctor_core::{Config, Report, ValidationMetadataProvider};
use std::io::Write;

/// Runs detectors from a registry with a prepared configuration
pub struct Runner<'a> {
    registry: &'a DetectorRegistry,
    config: &'a Config,

    /// Detectors to run; empty means all of them
    only: Vec<String>,
}

impl<'a> Runner<'a> {
    /// `config` must already have been through
    /// [`Config::prepare`](modeldoctor_core::Config::prepare)
    pub fn new(registry: &'a DetectorRegistry, config: &'a Config) -> Self {
        Self {
            registry,
            config,
            only: Vec::new(),
        }
    }

    /// Restrict the run to `identifiers`, still in registry order
    pub fn only(mut self, identifiers: Vec<String>) -> Self {
        self.only = identifiers;
        self
    }

    /// Run every selected detector, writing problem lines to `out`
    ///
    /// The first collaborator error aborts the run.
    pub fn run(
        &self,
        inspector: &CachingSchemaInspector<'_>,
        models: &dyn ValidationMetadataProvider,
        out: &mut dyn Write,
    ) -> Result<Report, DetectorError> {
        let mut report = Report::new();

        for (identifier, detector) in self.registry.detectors() {
            if !self.only.is_empty() && !self.only.iter().any(|id| id == identifier) {
                continue;
            }

            let messages = detector.inspect(self.config, inspector, models)?;
            for message in &messages {
                writeln!(out, "{}", message)?;
            }

            report.add_detector(identifier, messages.is_empty(), &messages);
        }

        tracing::info!(
            detectors = report.summary.detectors_run,
            failed = report.summary.detectors_failed,
            problems = report.summary.problems,
            "inspection finished"
        );
        Ok(report)
    }
}

