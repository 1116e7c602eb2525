use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::AnalysisReport;

/// Load analysis results from a JSON report.
pub fn load_report(path: &Path) -> Result<AnalysisReport> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Failed to parse report {}", path.display()))
}

/// Save analysis results as pretty-printed JSON.
pub fn save_report(path: &Path, report: &AnalysisReport) -> io::Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisSummary, ResultRecord, TrackId};

    #[test]
    fn test_report_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let report = AnalysisReport {
            records: vec![ResultRecord {
                title: "Track One".to_string(),
                dynamic_range: 13.0,
                ..ResultRecord::new(TrackId(1))
            }],
            summary: AnalysisSummary {
                processing_secs: 1.5,
                audio_secs: 240.0,
            },
        };
        save_report(&path, &report).unwrap();

        let loaded = load_report(&path).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].title, "Track One");
        assert_eq!(loaded.records[0].sample_peak, f64::NEG_INFINITY);
        assert_eq!(loaded.summary.audio_secs, 240.0);
    }

    #[test]
    fn test_load_report_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_report(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read report"));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[]").unwrap();
        let err = load_report(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse report"));
    }
}
