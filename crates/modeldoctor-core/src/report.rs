//! Report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// One reported inconsistency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier of the detector that found it
    pub detector: String,

    /// Rendered problem message
    pub message: String,
}

impl Finding {
    pub fn new(detector: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            detector: detector.into(),
            message: message.into(),
        }
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Detectors that ran, including disabled ones
    pub detectors_run: usize,

    /// Detectors that reported at least one problem
    pub detectors_failed: usize,

    /// Total number of problems
    pub problems: usize,
}

/// Inspection report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// All findings in discovery order
    pub findings: Vec<Finding>,
}

impl Report {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: ReportSummary::default(),
            findings: Vec::new(),
        }
    }

    /// Record the outcome of one detector
    pub fn add_detector(&mut self, detector: &str, passed: bool, messages: &[String]) {
        self.summary.detectors_run += 1;
        if !passed {
            self.summary.detectors_failed += 1;
        }

        self.summary.problems += messages.len();
        self.findings
            .extend(messages.iter().map(|message| Finding::new(detector, message.clone())));
    }

    /// Whether every detector passed
    pub fn is_success(&self) -> bool {
        self.summary.detectors_failed == 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report() {
        let report = Report::new();
        assert_eq!(report.version, ReportVersion::CURRENT);
        assert_eq!(report.summary.problems, 0);
        assert!(report.is_success());
    }

    #[test]
    fn report_with_findings() {
        let mut report = Report::new();
        report.add_detector(
            "incorrect_length_validation",
            false,
            &["first".to_string(), "second".to_string()],
        );
        report.add_detector("missing_foreign_keys", true, &[]);

        assert_eq!(report.summary.detectors_run, 2);
        assert_eq!(report.summary.detectors_failed, 1);
        assert_eq!(report.summary.problems, 2);
        assert_eq!(report.findings[1], Finding::new("incorrect_length_validation", "second"));
        assert!(!report.is_success());
    }

    #[test]
    fn report_serialization() {
        let report = Report::new();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"findings\""));
    }
}
