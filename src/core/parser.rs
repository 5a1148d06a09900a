// src/core/parser.rs

use crate::core::error::{Result, ScanError};
use crate::core::models::{Finding, Severity};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// One row of the auditor's flat JSON output (`--jsonfile`).
#[derive(Debug, Deserialize)]
struct RawRow {
    id: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    finding: String,
    #[serde(default)]
    cve: Option<String>,
    #[serde(default)]
    cwe: Option<String>,
}

/// Reads and parses a findings file written for `target`.
pub fn parse_findings_file(path: &Path, target: &str) -> Result<Vec<Finding>> {
    let content = std::fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_findings(&content, target).map_err(|reason| ScanError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

/// Parses the auditor's JSON rows into findings, preserving row order.
///
/// Rows with a severity outside the known set (e.g. `DEBUG`) are dropped. A
/// `FATAL` row means the auditor itself gave up, which makes the whole file
/// unusable.
pub fn parse_findings(content: &str, target: &str) -> std::result::Result<Vec<Finding>, String> {
    if content.trim().is_empty() {
        return Err("file is empty".to_string());
    }
    let rows: Vec<RawRow> = serde_json::from_str(content).map_err(|e| format!("invalid JSON: {}", e))?;

    let mut findings = Vec::with_capacity(rows.len());
    for row in rows {
        if row.severity.eq_ignore_ascii_case("FATAL") {
            return Err(format!("auditor reported a fatal problem in '{}': {}", row.id, row.finding));
        }
        let severity = match Severity::from_str(row.severity.trim()) {
            Ok(severity) => severity,
            Err(_) => {
                debug!(id = %row.id, severity = %row.severity, "Skipping row with unscored severity.");
                continue;
            }
        };
        findings.push(Finding {
            target: target.to_string(),
            id: row.id,
            severity,
            description: row.finding,
            cve: non_empty(row.cve),
            cwe: non_empty(row.cwe),
        });
    }
    Ok(findings)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"id":"service","ip":"example.com/93.184.216.34","port":"443","severity":"INFO","cve":"","cwe":"","finding":"HTTP"},
        {"id":"SSLv3","ip":"example.com/93.184.216.34","port":"443","severity":"OK","cve":"","cwe":"","finding":"not offered"},
        {"id":"TLS1_3","ip":"example.com/93.184.216.34","port":"443","severity":"OK","cve":"","cwe":"","finding":"offered with final"},
        {"id":"heartbleed","ip":"example.com/93.184.216.34","port":"443","severity":"OK","cve":"CVE-2014-0160","cwe":"CWE-119","finding":"not vulnerable, no heartbeat extension"},
        {"id":"optimal_proto","ip":"example.com/93.184.216.34","port":"443","severity":"DEBUG","finding":"skipped"},
        {"id":"SWEET32","fqdn/ip":"example.com/93.184.216.34","port":"443","severity":"low","cve":"CVE-2016-2183 CVE-2016-6329","cwe":"CWE-327","finding":"uses 64 bit block ciphers"}
    ]"#;

    #[test]
    fn parses_rows_in_source_order() {
        let findings = parse_findings(SAMPLE, "example.com").unwrap();
        let ids: Vec<&str> = findings.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["service", "SSLv3", "TLS1_3", "heartbleed", "SWEET32"]);
        assert!(findings.iter().all(|f| f.target == "example.com"));
    }

    #[test]
    fn empty_cve_and_cwe_become_none() {
        let findings = parse_findings(SAMPLE, "example.com").unwrap();
        assert_eq!(findings[0].cve, None);
        assert_eq!(findings[3].cve.as_deref(), Some("CVE-2014-0160"));
        assert_eq!(findings[3].cwe.as_deref(), Some("CWE-119"));
        assert_eq!(findings[4].severity, Severity::Low);
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse_findings(SAMPLE, "t").unwrap(), parse_findings(SAMPLE, "t").unwrap());
    }

    #[test]
    fn rejects_empty_and_malformed_content() {
        assert!(parse_findings("", "t").is_err());
        assert!(parse_findings("   \n", "t").is_err());
        assert!(parse_findings("{\"id\":\"x\"}", "t").is_err());
        assert!(parse_findings("[{\"id\":", "t").is_err());
    }

    #[test]
    fn fatal_row_fails_the_whole_file() {
        let content = r#"[{"id":"scanProblem","severity":"FATAL","finding":"No engine or GET request"}]"#;
        let err = parse_findings(content, "t").unwrap_err();
        assert!(err.contains("scanProblem"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("tls-sweep-parser-does-not-exist.json");
        let err = parse_findings_file(&path, "t").unwrap_err();
        assert!(matches!(err, ScanError::Io { .. }));
    }
}
