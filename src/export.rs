// src/export.rs

use crate::core::models::RunReport;
use color_eyre::eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes `report` as pretty JSON to `<dir>/report-<timestamp>.json`.
pub fn export_report(report: &RunReport, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).wrap_err_with(|| format!("creating {}", dir.display()))?;

    let stamp = report.generated_at.format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("report-{}.json", stamp));
    let json = serde_json::to_string_pretty(report).wrap_err("serializing run report")?;
    std::fs::write(&path, json).wrap_err_with(|| format!("writing {}", path.display()))?;

    info!(path = %path.display(), targets = report.outcomes.len(), "Exported run report.");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::aggregate;
    use crate::core::models::{Finding, ScanOutcome, Severity, TargetOutcome};

    #[test]
    fn writes_a_readable_report() {
        let outcomes = vec![
            TargetOutcome {
                target: "a.example.com".to_string(),
                outcome: ScanOutcome::Success {
                    findings: vec![Finding {
                        target: "a.example.com".to_string(),
                        id: "TLS1_3".to_string(),
                        severity: Severity::Ok,
                        description: "offered".to_string(),
                        cve: None,
                        cwe: None,
                    }],
                    duration_secs: 12.5,
                },
            },
            TargetOutcome {
                target: "b.example.com".to_string(),
                outcome: ScanOutcome::Timeout { elapsed_secs: 300.0 },
            },
        ];
        let report = aggregate(&outcomes);
        let dir = std::env::temp_dir().join(format!("tls-sweep-export-{}", std::process::id()));

        let path = export_report(&report, &dir).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("report-") && name.ends_with(".json"), "{}", name);

        let read: RunReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(read, report);
        assert_eq!(read.targets[0].grade.to_string(), "A+");
    }
}
