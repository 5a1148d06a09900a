// src/ui/widgets/summary.rs

use crate::app::{App, AppState, ExportStatus};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

/// Renders the run overview: worker plan, host pressure and, once finished,
/// the average score and per-status counts.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Score
            Constraint::Length(1), // Gauge
            Constraint::Length(1), // Spacer
            Constraint::Length(4), // Run
            Constraint::Length(1), // Spacer
            Constraint::Length(6), // Host
            Constraint::Min(0),    // Warnings and export
        ])
        .split(area);

    if app.state == AppState::Idle {
        let idle = Paragraph::new(vec![
            Line::from("Auditor".bold()),
            Line::from(app.config.binary.clone()),
            Line::from(format!("timeout {}s", app.config.task_timeout.as_secs())),
            Line::from(format!("up to {} workers", app.config.requested_workers)),
        ]);
        frame.render_widget(idle, summary_chunks[0].union(summary_chunks[3]));
        return;
    }

    // --- Score ---
    let average = app.report.as_ref().and_then(|r| r.average_score());
    let score_line = match average {
        Some(score) => Line::from(format!("{}/100 average", score)).style(Style::default().fg(score_color(score))),
        None if app.state == AppState::Scanning => Line::from("pending"),
        None => Line::from("no scored targets"),
    };
    let score_text = Text::from(vec![Line::from("Overall Score".bold()), score_line]);
    frame.render_widget(Paragraph::new(score_text).alignment(Alignment::Center), summary_chunks[0]);

    let score_gauge = Gauge::default()
        .percent(u16::from(app.displayed_score))
        .label("")
        .style(Style::default().fg(score_color(app.displayed_score)));
    frame.render_widget(score_gauge, summary_chunks[1]);

    // --- Run ---
    let progress = &app.progress;
    let mut run_lines = vec![Line::from("RUN".bold())];
    match &app.report {
        Some(report) => {
            let stats = &report.stats;
            run_lines.push(Line::from(format!("{} targets, {} workers", stats.attempted, stats.workers)));
            run_lines.push(Line::from(vec![
                Span::styled(format!("{} ok  ", stats.succeeded), Style::new().fg(Color::Green)),
                Span::styled(format!("{} timeout  ", stats.timed_out), Style::new().fg(Color::Yellow)),
                Span::styled(format!("{} failed", stats.failed), Style::new().fg(Color::Red)),
            ]));
            run_lines.push(Line::from(format!("{} overload events", stats.overload_events)));
        }
        None => {
            let phase = progress.phase.map(|p| p.to_string()).unwrap_or_else(|| "Starting".to_string());
            run_lines.push(Line::from(format!("phase: {}", phase)));
            run_lines.push(Line::from(format!("{}/{} done", progress.completed, progress.total)));
            if let Some(plan) = progress.plan {
                run_lines.push(Line::from(format!(
                    "{} workers (max safe {})",
                    plan.suggested_workers, plan.max_safe_workers
                )));
            }
        }
    }
    frame.render_widget(Paragraph::new(run_lines), summary_chunks[3]);

    // --- Host ---
    let mut host_lines = vec![Line::from("HOST".bold())];
    match progress.snapshot {
        Some(snapshot) => {
            host_lines.push(Line::from(format!("CPU {:.1}%  load {:.2}", snapshot.cpu_percent, snapshot.load_average_1m)));
            host_lines.push(Line::from(format!(
                "RAM {:.1}%  {:.1} GB free",
                snapshot.mem_percent, snapshot.available_mem_gb
            )));
            host_lines.push(Line::from(format!("{} cores", snapshot.core_count)));
        }
        None => host_lines.push(Line::from("metrics unavailable".dark_gray())),
    }
    if progress.overloaded && app.state == AppState::Scanning {
        host_lines.push(Line::from("OVERLOADED: running sequentially".red().bold()));
        host_lines.push(Line::from(progress.overload_reasons.join(", ")).red());
    }
    frame.render_widget(Paragraph::new(host_lines), summary_chunks[5]);

    // --- Warnings and export ---
    let mut tail_lines = Vec::new();
    if let Some(report) = &app.report {
        for warning in &report.warnings {
            tail_lines.push(Line::from(format!("! {}", warning)).yellow());
        }
    }
    match &app.export_status {
        ExportStatus::Idle => {}
        ExportStatus::Success(path) => tail_lines.push(Line::from(format!("Exported to {}", path)).green()),
        ExportStatus::Error(e) => tail_lines.push(Line::from(format!("Export failed: {}", e)).red()),
    }
    frame.render_widget(Paragraph::new(tail_lines).wrap(Wrap { trim: true }), summary_chunks[6]);
}

fn score_color(score: u8) -> Color {
    if score >= 80 {
        Color::Green
    } else if score >= 50 {
        Color::Yellow
    } else {
        Color::Red
    }
}
