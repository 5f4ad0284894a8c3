//! Run report generation
//!
//! JSON record of one pipeline run: what was configured, who was dropped
//! and why, and the statistics of every filter pass.

use crate::config::PipelineConfig;
use crate::error::RdmResult;
use crate::screening::FilterPass;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

pub const REPORT_FILE: &str = "run_report.json";

/// Complete run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub session: SessionInfo,
    pub config: serde_json::Value,
    pub participants_loaded: usize,
    pub participants_reconstructed: usize,
    pub participants_retained: usize,
    pub skipped: Vec<SkippedParticipant>,
    pub filter_passes: Vec<FilterPass>,
}

/// Run metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub run_id: Uuid,
    /// Run start timestamp (RFC 3339)
    pub timestamp: String,
    pub version: String,
}

/// Participant dropped before screening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedParticipant {
    pub participant_id: String,
    pub reason: String,
}

impl RunReport {
    /// Start a report for a run using `config`
    ///
    /// # Errors
    /// * `RdmError::Json` if the resolved config cannot be serialized
    pub fn new(config: &PipelineConfig) -> RdmResult<Self> {
        Ok(Self {
            session: SessionInfo {
                run_id: Uuid::new_v4(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            config: serde_json::to_value(config)?,
            participants_loaded: 0,
            participants_reconstructed: 0,
            participants_retained: 0,
            skipped: Vec::new(),
            filter_passes: Vec::new(),
        })
    }

    /// Export report to JSON file
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Import report from JSON file
    pub fn import_json<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let report: RunReport = serde_json::from_reader(file)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_report_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(REPORT_FILE);

        let mut report = RunReport::new(&PipelineConfig::default()).unwrap();
        report.participants_loaded = 3;
        report.skipped.push(SkippedParticipant {
            participant_id: "p3".to_string(),
            reason: "no full trial".to_string(),
        });
        report.export_json(&path).unwrap();

        let loaded = RunReport::import_json(&path).unwrap();
        assert_eq!(loaded.session.run_id, report.session.run_id);
        assert_eq!(loaded.participants_loaded, 3);
        assert_eq!(loaded.skipped, report.skipped);
        assert_eq!(loaded.config["z_threshold"], 3.0);
        assert_eq!(loaded.config["weighting"], "equal");
    }

    #[test]
    fn test_report_records_resolved_config() {
        let config = PipelineConfig {
            z_threshold: 2.5,
            full_set_size: 12,
            ..PipelineConfig::default()
        };
        let report = RunReport::new(&config).unwrap();

        assert!(report.config.is_object());
        assert_eq!(report.config["z_threshold"], 2.5);
        assert_eq!(report.config["full_set_size"], 12);
        assert_eq!(report.config["filter_mode"], "single_pass");
    }
}
