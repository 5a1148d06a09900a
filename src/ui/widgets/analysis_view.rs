// src/ui/widgets/analysis_view.rs

use super::{grade_color, severity_color, status_color};
use crate::app::{App, AppState, SPINNER_CHARS};
use crate::core::knowledge_base::PROTOCOLS;
use crate::core::models::{CheckDetail, ComplianceStatus, ScoredTarget, Severity, TaskStatus};
use std::collections::BTreeMap;
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use strum::IntoEnumIterator;

/// Renders the details of the selected target.
pub fn render_analysis_view(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Details (scroll with PgUp PgDn)");

    let content = match app.state {
        AppState::Idle => Paragraph::new("Scan results will appear here...").alignment(Alignment::Center),
        AppState::Scanning => {
            let spinner_char = SPINNER_CHARS[app.spinner_frame];
            Paragraph::new(Line::from(vec![
                Span::styled(format!("{} ", spinner_char), Style::default().fg(Color::Cyan)),
                Span::raw(format!(
                    "Scanning... {}/{} targets done.",
                    app.progress.completed, app.progress.total
                )),
            ]))
            .alignment(Alignment::Center)
        }
        AppState::Finished => Paragraph::new(finished_lines(app))
            .wrap(Wrap { trim: false })
            .scroll((app.details_scroll, 0)),
    };
    frame.render_widget(content.block(block), area);
}

fn finished_lines(app: &App) -> Vec<Line<'static>> {
    if let Some(error) = &app.run_error {
        return vec![
            Line::from("RUN FAILED".red().bold()),
            Line::from(""),
            Line::from(error.clone()),
        ];
    }
    let Some(status) = app.selected_status() else {
        return vec![Line::from("No targets were scanned.")];
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(status.target.clone(), Style::new().bold()),
            Span::raw("  "),
            Span::styled(status.status.to_string(), Style::new().fg(status_color(status.status))),
        ]),
        Line::from(status.detail.clone().dark_gray()),
        Line::from(""),
    ];

    match app.selected_scored() {
        Some(scored) => lines.extend(scored_lines(scored)),
        None if status.status == TaskStatus::Timeout => {
            lines.push(Line::from("The auditor was stopped before it finished. No score is available."));
        }
        None => lines.push(Line::from("No findings could be collected for this target.")),
    }
    lines
}

fn scored_lines(scored: &ScoredTarget) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::raw("Grade "),
        Span::styled(scored.grade.to_string(), Style::new().fg(grade_color(scored.grade)).bold()),
        Span::raw(format!(
            "  score {}/100  ({} checks, {} critical, {} high)",
            scored.score, scored.total_checks, scored.critical_count, scored.high_count
        )),
    ])];

    let distribution: Vec<Span> = Severity::iter()
        .rev()
        .filter_map(|severity| {
            let count = scored.severity_distribution.get(&severity).copied().unwrap_or(0);
            (count > 0).then(|| Span::styled(format!("{} {}  ", severity, count), Style::new().fg(severity_color(severity))))
        })
        .collect();
    lines.push(Line::from(distribution));

    lines.push(Line::from(""));
    lines.push(Line::from("PROTOCOLS".yellow().bold()));
    let mut protocol_spans = Vec::new();
    for protocol in PROTOCOLS {
        let offered = scored.protocol_support.contains(protocol.label);
        let style = match (offered, protocol.legacy) {
            (true, true) => Style::new().fg(Color::Red),
            (true, false) => Style::new().fg(Color::Green),
            (false, _) => Style::new().fg(Color::DarkGray),
        };
        let mark = if offered { "✓" } else { "✗" };
        protocol_spans.push(Span::styled(format!("{} {}  ", mark, protocol.label), style));
    }
    lines.push(Line::from(protocol_spans));
    lines.push(Line::from(format!(
        "{} weak protocols offered, {} vulnerable checks",
        scored.summary.weak_protocols, scored.summary.vulnerable_count
    )));

    lines.push(Line::from(""));
    lines.push(Line::from("COMPLIANCE".yellow().bold()));
    for check in &scored.compliance {
        let style = match check.status {
            ComplianceStatus::Pass => Style::new().fg(Color::Green),
            ComplianceStatus::Fail => Style::new().fg(Color::Red).bold(),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<5}", check.status.to_string()), style),
            Span::raw(format!("{}: {}", check.standard, check.requirement)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from("VULNERABILITIES".yellow().bold()));
    if scored.vulnerabilities.is_empty() {
        lines.push(Line::from("No known vulnerability checks reported."));
    }
    for vuln in &scored.vulnerabilities {
        let (mark, style) = if vuln.vulnerable {
            ("✗", Style::new().fg(severity_color(vuln.severity)).bold())
        } else {
            ("✓", Style::new().fg(Color::Green))
        };
        let mut spans = vec![
            Span::styled(format!("{} {:<22}", mark, vuln.name), style),
            Span::raw(vuln.status.clone()),
        ];
        if let Some(cve) = &vuln.cve {
            spans.push(Span::styled(format!("  [{}]", cve), Style::new().fg(Color::DarkGray)));
        }
        lines.push(Line::from(spans));
    }

    push_checks(&mut lines, "CERTIFICATES", &scored.certificates);
    push_checks(&mut lines, "CIPHERS", &scored.ciphers);

    lines.push(Line::from(""));
    lines.push(Line::from("RECOMMENDATIONS".yellow().bold()));
    if scored.recommendations.is_empty() {
        lines.push(Line::from("✓ Nothing to fix.".green()));
    }
    for rec in &scored.recommendations {
        lines.push(Line::from(vec![
            Span::styled(format!("[{}] ", rec.priority), Style::new().fg(severity_color(rec.priority)).bold()),
            Span::styled(format!("{}: ", rec.category), Style::new().fg(Color::DarkGray)),
            Span::raw(rec.issue.clone()),
        ]));
        lines.push(Line::from(format!("    {}", rec.advice)));
    }
    lines
}

fn push_checks(lines: &mut Vec<Line<'static>>, title: &'static str, checks: &BTreeMap<String, CheckDetail>) {
    if checks.is_empty() {
        return;
    }
    lines.push(Line::from(""));
    lines.push(Line::from(title.yellow().bold()));
    for (id, detail) in checks {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<26}", id), Style::new().fg(severity_color(detail.severity))),
            Span::raw(detail.value.clone()),
        ]));
    }
}
