// src/core/aggregator.rs

//! Turns per-target findings into scores, grades and a prioritized issue list.
//!
//! # Scoring policy
//!
//! Every finding costs `Severity::weight()` penalty points (CRITICAL 100, HIGH
//! 80, MEDIUM 60, LOW 40, WARN 30, INFO 10, OK 0). The normalized penalty is
//!
//! ```text
//! penalty = min(100, mean(weights) + WORST_FINDING_SHARE * worst_actionable_weight)
//! score   = 100 - round(penalty)
//! ```
//!
//! where `worst_actionable_weight` is the largest weight of WARN or above (0 if
//! none). The mean keeps long lists of passing checks from being drowned by
//! informational rows; the worst-finding term makes a single CRITICAL sink its
//! own target (to 49 or below, grade F) no matter how many checks passed.
//! Targets are scored independently, so nothing leaks across targets.
//! `[OK]` scores 100 (A+) and `[CRITICAL, HIGH]` scores 0 (F). Adding a
//! CRITICAL can only raise the mean and the worst weight, so it never raises a
//! score.

use crate::core::error::ScanError;
use crate::core::knowledge_base::{self, FindingCategory, PROTOCOLS};
use crate::core::models::{
    CheckDetail, ComplianceCheck, ComplianceStatus, Finding, Grade, Recommendation, RunReport, RunStats, ScanOutcome,
    ScoredTarget, Severity, TargetOutcome, TargetStatus, TargetSummary, Vulnerability,
};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Share of the worst actionable finding's weight added on top of the mean.
pub const WORST_FINDING_SHARE: f64 = 0.5;
/// Findings at or above this weight count as actionable.
pub const ACTIONABLE_WEIGHT: u32 = 30;
/// Standard the compliance verdicts are reported against.
pub const PCI_DSS: &str = "PCI DSS";

/// Numeric score of a finding multiset. Order does not matter.
pub fn security_score(findings: &[Finding]) -> u8 {
    if findings.is_empty() {
        return 100;
    }
    let total: u32 = findings.iter().map(|f| f.severity.weight()).sum();
    let mean = f64::from(total) / findings.len() as f64;
    let worst = findings
        .iter()
        .map(|f| f.severity.weight())
        .filter(|w| *w >= ACTIONABLE_WEIGHT)
        .max()
        .unwrap_or(0);
    let penalty = (mean + WORST_FINDING_SHARE * f64::from(worst)).min(100.0).round();
    (100.0 - penalty) as u8
}

/// Scores one target from scratch.
pub fn score(target: &str, findings: &[Finding]) -> ScoredTarget {
    let score = security_score(findings);

    let mut severity_distribution = BTreeMap::new();
    for finding in findings {
        *severity_distribution.entry(finding.severity).or_insert(0) += 1;
    }

    let protocol_support: BTreeSet<String> = findings
        .iter()
        .filter(|f| is_offered(&f.description))
        .filter_map(|f| knowledge_base::protocol(&f.id))
        .map(|p| p.label.to_string())
        .collect();

    let vulnerabilities: Vec<Vulnerability> = findings.iter().filter_map(to_vulnerability).collect();
    let protocols_probed = findings.iter().any(|f| knowledge_base::protocol(&f.id).is_some());
    let recommendations = recommend(findings, &protocol_support, protocols_probed, &vulnerabilities);

    let mut certificates = BTreeMap::new();
    let mut ciphers = BTreeMap::new();
    for finding in findings {
        let detail = || CheckDetail { severity: finding.severity, value: finding.description.clone() };
        match knowledge_base::category(&finding.id) {
            FindingCategory::Certificates => {
                certificates.insert(finding.id.clone(), detail());
            }
            FindingCategory::Ciphers => {
                ciphers.insert(finding.id.clone(), detail());
            }
            _ => {}
        }
    }

    let summary = TargetSummary {
        vulnerable_count: vulnerabilities.iter().filter(|v| v.vulnerable).count(),
        weak_protocols: PROTOCOLS
            .iter()
            .filter(|p| p.legacy && protocol_support.contains(p.label))
            .count(),
        tls_1_2_supported: protocol_support.contains("TLS 1.2"),
        tls_1_3_supported: protocol_support.contains("TLS 1.3"),
    };
    let compliance = pci_dss(&summary, &protocol_support);

    let scored = ScoredTarget {
        target: target.to_string(),
        score,
        grade: Grade::from_score(score),
        critical_count: severity_distribution.get(&Severity::Critical).copied().unwrap_or(0),
        high_count: severity_distribution.get(&Severity::High).copied().unwrap_or(0),
        total_checks: findings.len(),
        protocol_support,
        vulnerabilities,
        severity_distribution,
        recommendations,
        certificates,
        ciphers,
        summary,
        compliance,
    };
    debug!(host = target, score = scored.score, grade = %scored.grade, "Scored target.");
    scored
}

/// Folds outcomes into a report, preserving input order.
pub fn aggregate(outcomes: &[TargetOutcome]) -> RunReport {
    let mut stats = RunStats { attempted: outcomes.len(), ..Default::default() };
    let mut targets = Vec::new();
    let mut statuses = Vec::with_capacity(outcomes.len());

    for entry in outcomes {
        let detail = match &entry.outcome {
            ScanOutcome::Success { findings, duration_secs } => {
                stats.succeeded += 1;
                targets.push(score(&entry.target, findings));
                format!("{} findings in {:.1}s", findings.len(), duration_secs)
            }
            ScanOutcome::Timeout { elapsed_secs } => {
                stats.timed_out += 1;
                ScanError::TaskTimeout { target: entry.target.clone(), elapsed_secs: *elapsed_secs }.to_string()
            }
            ScanOutcome::Failed { reason } => {
                stats.failed += 1;
                reason.clone()
            }
        };
        statuses.push(TargetStatus {
            target: entry.target.clone(),
            status: entry.outcome.status(),
            detail,
        });
    }

    RunReport {
        generated_at: Utc::now(),
        targets,
        outcomes: statuses,
        stats,
        warnings: Vec::new(),
    }
}

/// PCI DSS transport requirements that can be judged from findings alone.
fn pci_dss(summary: &TargetSummary, protocol_support: &BTreeSet<String>) -> Vec<ComplianceCheck> {
    let verdict = |pass: bool| if pass { ComplianceStatus::Pass } else { ComplianceStatus::Fail };
    let ssl_offered = ["SSLv2", "SSLv3"].iter().any(|label| protocol_support.contains(*label));
    [
        ("TLS 1.2+ Required", summary.tls_1_2_supported || summary.tls_1_3_supported),
        ("No SSLv2/SSLv3", !ssl_offered),
        ("No Known Vulnerabilities", summary.vulnerable_count == 0),
    ]
    .into_iter()
    .map(|(requirement, pass)| ComplianceCheck {
        standard: PCI_DSS.to_string(),
        requirement: requirement.to_string(),
        status: verdict(pass),
    })
    .collect()
}

fn is_offered(description: &str) -> bool {
    let text = description.to_ascii_lowercase();
    text.contains("offered") && !text.contains("not offered")
}

fn to_vulnerability(finding: &Finding) -> Option<Vulnerability> {
    let detail = knowledge_base::vulnerability(&finding.id, finding.cve.as_deref())?;
    let text = finding.description.to_ascii_lowercase();
    let says_vulnerable = text.contains("vulnerable") && !text.contains("not vulnerable");
    Some(Vulnerability {
        name: detail.id.to_string(),
        severity: finding.severity,
        status: finding.description.clone(),
        cve: finding.cve.clone(),
        cwe: finding.cwe.clone(),
        description: detail.description.to_string(),
        vulnerable: !matches!(finding.severity, Severity::Ok | Severity::Info) || says_vulnerable,
    })
}

fn recommend(
    findings: &[Finding],
    protocol_support: &BTreeSet<String>,
    protocols_probed: bool,
    vulnerabilities: &[Vulnerability],
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    let mut push = |priority: Severity, check_id: &str, issue: String, advice: String| {
        let category = knowledge_base::category(check_id).to_string();
        recommendations.push(Recommendation { priority, category, issue, advice });
    };

    if protocols_probed {
        if !protocol_support.contains("TLS 1.3") {
            push(
                Severity::High,
                "TLS1_3",
                "TLS 1.3 not supported".to_string(),
                "Enable TLS 1.3 support for enhanced security and performance".to_string(),
            );
        }
        if !protocol_support.contains("TLS 1.2") {
            push(
                Severity::Critical,
                "TLS1_2",
                "TLS 1.2 not supported".to_string(),
                "Enable TLS 1.2 support immediately - minimum requirement".to_string(),
            );
        }
        for legacy in PROTOCOLS.iter().filter(|p| p.legacy && protocol_support.contains(p.label)) {
            push(
                Severity::High,
                legacy.id,
                format!("{} offered", legacy.label),
                format!("Disable {} on the server; it is obsolete and insecure", legacy.label),
            );
        }
    }

    for vuln in vulnerabilities
        .iter()
        .filter(|v| v.vulnerable && matches!(v.severity, Severity::Critical | Severity::High))
    {
        push(
            vuln.severity,
            &vuln.name,
            format!("{} vulnerability detected", vuln.name),
            format!("Patch {} immediately", vuln.description),
        );
    }

    if findings
        .iter()
        .any(|f| f.id == "OCSP_stapling" && f.severity == Severity::Low)
    {
        push(
            Severity::Medium,
            "OCSP_stapling",
            "OCSP stapling not configured".to_string(),
            "Enable OCSP stapling for better certificate validation performance".to_string(),
        );
    }

    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::TaskStatus;

    fn finding(id: &str, severity: Severity, description: &str) -> Finding {
        Finding {
            target: "example.com".to_string(),
            id: id.to_string(),
            severity,
            description: description.to_string(),
            cve: None,
            cwe: None,
        }
    }

    fn of(severities: &[Severity]) -> Vec<Finding> {
        severities.iter().enumerate().map(|(i, s)| finding(&format!("check{}", i), *s, "")).collect()
    }

    #[test]
    fn only_ok_findings_score_perfectly() {
        let scored = score("example.com", &of(&[Severity::Ok]));
        assert_eq!(scored.score, 100);
        assert_eq!(scored.grade, Grade::APlus);
    }

    #[test]
    fn critical_and_high_score_failing() {
        let scored = score("example.com", &of(&[Severity::Critical, Severity::High]));
        assert!(matches!(scored.grade, Grade::F | Grade::D), "{:?}", scored);
        assert_eq!(scored.critical_count, 1);
        assert_eq!(scored.high_count, 1);
    }

    #[test]
    fn a_single_critical_sinks_an_otherwise_clean_target() {
        let mut findings = of(&[Severity::Ok; 60]);
        findings.push(finding("heartbleed", Severity::Critical, "VULNERABLE"));
        assert_eq!(score("example.com", &findings).grade, Grade::F);
    }

    #[test]
    fn scoring_is_idempotent_and_order_independent() {
        let findings = of(&[Severity::Low, Severity::Ok, Severity::Warn, Severity::Info, Severity::Medium]);
        let mut reversed = findings.clone();
        reversed.reverse();
        let a = score("t", &findings);
        let b = score("t", &findings);
        let c = score("t", &reversed);
        assert_eq!((a.score, a.grade), (b.score, b.grade));
        assert_eq!((a.score, a.grade), (c.score, c.grade));
    }

    #[test]
    fn adding_a_critical_never_raises_the_score() {
        let bases: Vec<Vec<Severity>> = vec![
            vec![],
            vec![Severity::Ok],
            vec![Severity::Info, Severity::Info, Severity::Ok],
            vec![Severity::Low, Severity::Medium],
            vec![Severity::Critical],
            vec![Severity::High, Severity::Warn, Severity::Ok, Severity::Ok],
        ];
        for base in bases {
            let before = security_score(&of(&base));
            let mut more = base.clone();
            more.push(Severity::Critical);
            let after = security_score(&of(&more));
            assert!(after <= before, "{:?}: {} -> {}", base, before, after);
        }
    }

    #[test]
    fn informational_rows_do_not_floor_a_clean_target() {
        let mut severities = vec![Severity::Ok; 40];
        severities.extend([Severity::Info; 20]);
        let scored = score("t", &of(&severities));
        assert!(scored.score >= 95, "{}", scored.score);
    }

    #[test]
    fn extracts_protocol_support_and_vulnerabilities() {
        let mut heartbleed = finding("heartbleed", Severity::Critical, "VULNERABLE (NOT ok)");
        heartbleed.cve = Some("CVE-2014-0160".to_string());
        let findings = vec![
            finding("SSLv3", Severity::Ok, "not offered"),
            finding("TLS1_2", Severity::Ok, "offered"),
            finding("TLS1_3", Severity::Ok, "offered with final"),
            finding("TLS1", Severity::Low, "offered (deprecated)"),
            heartbleed,
            finding("LOGJAM", Severity::Ok, "not vulnerable, no DH key exchange"),
        ];
        let scored = score("t", &findings);
        let protocols: Vec<&str> = scored.protocol_support.iter().map(String::as_str).collect();
        assert_eq!(protocols, ["TLS 1.0", "TLS 1.2", "TLS 1.3"]);
        assert_eq!(scored.vulnerabilities.len(), 2);
        assert!(scored.vulnerabilities[0].vulnerable);
        assert!(!scored.vulnerabilities[1].vulnerable);

        let issues: Vec<&str> = scored.recommendations.iter().map(|r| r.issue.as_str()).collect();
        assert_eq!(issues, ["heartbleed vulnerability detected", "TLS 1.0 offered"]);
    }

    #[test]
    fn missing_modern_protocols_are_recommended_by_priority() {
        let findings = vec![
            finding("TLS1_2", Severity::Medium, "not offered"),
            finding("TLS1_3", Severity::Medium, "not offered"),
            finding("OCSP_stapling", Severity::Low, "not offered"),
        ];
        let scored = score("t", &findings);
        let priorities: Vec<Severity> = scored.recommendations.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, [Severity::Critical, Severity::High, Severity::Medium]);
    }

    #[test]
    fn no_protocol_rows_means_no_protocol_advice() {
        let scored = score("t", &of(&[Severity::Ok, Severity::Info]));
        assert!(scored.recommendations.is_empty());
    }

    #[test]
    fn certificate_and_cipher_rows_are_broken_out() {
        let findings = vec![
            finding("cert_notAfter", Severity::Ok, "2027-01-01 00:00"),
            finding("cert_trust", Severity::High, "self signed"),
            finding("OCSP_stapling", Severity::Low, "not offered"),
            finding("cipher_order", Severity::Ok, "server"),
            finding("cipherlist_NULL", Severity::Ok, "not offered"),
            finding("TLS1_2", Severity::Ok, "offered"),
        ];
        let scored = score("t", &findings);
        let certs: Vec<&str> = scored.certificates.keys().map(String::as_str).collect();
        assert_eq!(certs, ["OCSP_stapling", "cert_notAfter", "cert_trust"]);
        assert_eq!(scored.certificates["cert_trust"].severity, Severity::High);
        assert_eq!(scored.certificates["cert_trust"].value, "self signed");
        let ciphers: Vec<&str> = scored.ciphers.keys().map(String::as_str).collect();
        assert_eq!(ciphers, ["cipher_order", "cipherlist_NULL"]);
    }

    #[test]
    fn summary_and_pci_dss_verdicts_follow_the_findings() {
        let compliant = score(
            "good",
            &[
                finding("SSLv2", Severity::Ok, "not offered"),
                finding("SSLv3", Severity::Ok, "not offered"),
                finding("TLS1_2", Severity::Ok, "offered"),
                finding("TLS1_3", Severity::Ok, "offered with final"),
                finding("heartbleed", Severity::Ok, "not vulnerable, no heartbeat extension"),
            ],
        );
        assert_eq!(
            compliant.summary,
            TargetSummary { vulnerable_count: 0, weak_protocols: 0, tls_1_2_supported: true, tls_1_3_supported: true }
        );
        assert_eq!(compliant.compliance.len(), 3);
        assert!(compliant.compliance.iter().all(|c| c.status == ComplianceStatus::Pass && c.standard == PCI_DSS));

        let legacy = score(
            "bad",
            &[
                finding("SSLv3", Severity::High, "offered (NOT ok)"),
                finding("TLS1", Severity::Low, "offered (deprecated)"),
                finding("TLS1_2", Severity::Medium, "not offered"),
                finding("POODLE_SSL", Severity::High, "VULNERABLE, uses SSLv3+CBC"),
            ],
        );
        assert_eq!(legacy.summary.vulnerable_count, 1);
        assert_eq!(legacy.summary.weak_protocols, 2);
        assert!(!legacy.summary.tls_1_2_supported);
        let failed: Vec<&str> = legacy
            .compliance
            .iter()
            .filter(|c| c.status == ComplianceStatus::Fail)
            .map(|c| c.requirement.as_str())
            .collect();
        assert_eq!(failed, ["TLS 1.2+ Required", "No SSLv2/SSLv3", "No Known Vulnerabilities"]);
    }

    #[test]
    fn aggregate_keeps_order_and_tolerates_failures() {
        let outcomes = vec![
            TargetOutcome {
                target: "a.example.com".to_string(),
                outcome: ScanOutcome::Success { findings: of(&[Severity::Ok]), duration_secs: 3.0 },
            },
            TargetOutcome {
                target: "b.example.com".to_string(),
                outcome: ScanOutcome::failed("auditor exited with status 1"),
            },
            TargetOutcome {
                target: "c.example.com".to_string(),
                outcome: ScanOutcome::Success { findings: of(&[Severity::High]), duration_secs: 4.0 },
            },
        ];
        let report = aggregate(&outcomes);
        let scored: Vec<&str> = report.targets.iter().map(|t| t.target.as_str()).collect();
        assert_eq!(scored, ["a.example.com", "c.example.com"]);
        assert_eq!(report.outcomes[1].status, TaskStatus::Failed);
        assert_eq!(report.outcomes[1].detail, "auditor exited with status 1");
        assert_eq!(report.stats.attempted, 3);
        assert_eq!(report.stats.succeeded, 2);
        assert_eq!(report.stats.failed, 1);
    }

    #[test]
    fn aggregate_of_nothing_is_an_empty_report() {
        let report = aggregate(&[]);
        assert!(report.targets.is_empty());
        assert!(report.outcomes.is_empty());
        assert_eq!(report.stats, RunStats::default());
    }
}
