// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::{Display, EnumIter, EnumString};

// --- Core Data Models ---

/// Severity label attached to every row of an auditor findings file.
///
/// Ordering follows risk, so `Severity::Critical > Severity::High`. `Warn` sits
/// between `Info` and `Low`, matching its penalty weight.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Ok,
    Info,
    Warn,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Penalty points one finding of this severity costs its target.
    pub fn weight(self) -> u32 {
        match self {
            Severity::Critical => 100,
            Severity::High => 80,
            Severity::Medium => 60,
            Severity::Low => 40,
            Severity::Warn => 30,
            Severity::Info => 10,
            Severity::Ok => 0,
        }
    }
}

/// One observation produced by the auditor for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub target: String,
    /// The auditor's check identifier, e.g. `TLS1_2` or `heartbleed`.
    pub id: String,
    pub severity: Severity,
    pub description: String,
    pub cve: Option<String>,
    pub cwe: Option<String>,
}

/// A validated `host[:port]` queued for scanning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanTask {
    pub target: String,
}

impl ScanTask {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into() }
    }
}

/// Terminal result of one `ScanTask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    Success { findings: Vec<Finding>, duration_secs: f64 },
    Timeout { elapsed_secs: f64 },
    Failed { reason: String },
}

impl ScanOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        ScanOutcome::Failed { reason: reason.into() }
    }

    pub fn status(&self) -> TaskStatus {
        match self {
            ScanOutcome::Success { .. } => TaskStatus::Success,
            ScanOutcome::Timeout { .. } => TaskStatus::Timeout,
            ScanOutcome::Failed { .. } => TaskStatus::Failed,
        }
    }
}

/// A `ScanOutcome` paired with the target it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub target: String,
    pub outcome: ScanOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    Timeout,
    Failed,
}

// --- Resource Models ---

/// Point-in-time view of host pressure. Built fresh on every sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub available_mem_gb: f64,
    pub load_average_1m: f64,
    pub core_count: usize,
}

/// Worker-count decision derived from one `ResourceSnapshot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPlan {
    pub suggested_workers: usize,
    pub max_safe_workers: usize,
    pub overloaded: bool,
}

impl WorkerPlan {
    /// Plan used when no snapshot could be taken at all.
    pub fn sequential() -> Self {
        Self { suggested_workers: 1, max_safe_workers: 1, overloaded: false }
    }
}

// --- Scoring Models ---

/// Letter bucket derived from a numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum Grade {
    #[strum(serialize = "A+")]
    #[serde(rename = "A+")]
    APlus,
    A,
    #[strum(serialize = "A-")]
    #[serde(rename = "A-")]
    AMinus,
    #[strum(serialize = "B+")]
    #[serde(rename = "B+")]
    BPlus,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            95.. => Grade::APlus,
            90..=94 => Grade::A,
            85..=89 => Grade::AMinus,
            80..=84 => Grade::BPlus,
            75..=79 => Grade::B,
            60..=74 => Grade::C,
            50..=59 => Grade::D,
            _ => Grade::F,
        }
    }
}

/// A known vulnerability check reported for a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub name: String,
    pub severity: Severity,
    /// The auditor's verdict text, e.g. "not vulnerable, no heartbeat extension".
    pub status: String,
    pub cve: Option<String>,
    pub cwe: Option<String>,
    pub description: String,
    pub vulnerable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Severity,
    pub category: String,
    pub issue: String,
    pub advice: String,
}

/// Raw verdict of one certificate or cipher check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDetail {
    pub severity: Severity,
    pub value: String,
}

/// Headline counts for one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSummary {
    pub vulnerable_count: usize,
    /// Legacy protocol versions the target still offers.
    pub weak_protocols: usize,
    pub tls_1_2_supported: bool,
    pub tls_1_3_supported: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ComplianceStatus {
    Pass,
    Fail,
}

/// Verdict for one requirement of a compliance standard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub standard: String,
    pub requirement: String,
    pub status: ComplianceStatus,
}

/// Scored view of one target, recomputed from scratch from its findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTarget {
    pub target: String,
    pub score: u8,
    pub grade: Grade,
    pub critical_count: usize,
    pub high_count: usize,
    pub total_checks: usize,
    pub protocol_support: BTreeSet<String>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub severity_distribution: BTreeMap<Severity, usize>,
    pub recommendations: Vec<Recommendation>,
    /// Certificate checks keyed by check id.
    pub certificates: BTreeMap<String, CheckDetail>,
    /// Cipher checks keyed by check id.
    pub ciphers: BTreeMap<String, CheckDetail>,
    pub summary: TargetSummary,
    pub compliance: Vec<ComplianceCheck>,
}

// --- Main Report ---

/// Per-target status line. Every attempted target gets exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetStatus {
    pub target: String,
    pub status: TaskStatus,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub workers: usize,
    pub overload_events: usize,
}

/// Consolidated result of one coordinator run, handed to renderers as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub targets: Vec<ScoredTarget>,
    pub outcomes: Vec<TargetStatus>,
    pub stats: RunStats,
    pub warnings: Vec<String>,
}

impl RunReport {
    /// Mean score over successfully scanned targets.
    pub fn average_score(&self) -> Option<u8> {
        if self.targets.is_empty() {
            return None;
        }
        let total: u32 = self.targets.iter().map(|t| u32::from(t.score)).sum();
        Some((total / self.targets.len() as u32) as u8)
    }

    pub fn scored(&self, target: &str) -> Option<&ScoredTarget> {
        self.targets.iter().find(|t| t.target == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!(Severity::from_str("critical").unwrap(), Severity::Critical);
        assert_eq!(Severity::from_str("WARN").unwrap(), Severity::Warn);
        assert_eq!(Severity::from_str("Ok").unwrap(), Severity::Ok);
        assert!(Severity::from_str("DEBUG").is_err());
    }

    #[test]
    fn severity_displays_in_auditor_format() {
        assert_eq!(Severity::Medium.to_string(), "MEDIUM");
    }

    #[test]
    fn grade_thresholds_are_closed_on_the_lower_bound() {
        assert_eq!(Grade::from_score(100), Grade::APlus);
        assert_eq!(Grade::from_score(95), Grade::APlus);
        assert_eq!(Grade::from_score(94), Grade::A);
        assert_eq!(Grade::from_score(85), Grade::AMinus);
        assert_eq!(Grade::from_score(80), Grade::BPlus);
        assert_eq!(Grade::from_score(75), Grade::B);
        assert_eq!(Grade::from_score(74), Grade::C);
        assert_eq!(Grade::from_score(60), Grade::C);
        assert_eq!(Grade::from_score(50), Grade::D);
        assert_eq!(Grade::from_score(49), Grade::F);
        assert_eq!(Grade::from_score(0), Grade::F);
    }

    #[test]
    fn grade_display_uses_letter_form() {
        assert_eq!(Grade::APlus.to_string(), "A+");
        assert_eq!(Grade::AMinus.to_string(), "A-");
        assert_eq!(Grade::F.to_string(), "F");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = ScanOutcome::Timeout { elapsed_secs: 1.5 };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "timeout");
        assert_eq!(outcome.status(), TaskStatus::Timeout);
    }
}
