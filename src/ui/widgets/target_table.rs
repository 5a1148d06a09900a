// src/ui/widgets/target_table.rs

use super::{grade_color, status_color};
use crate::app::{App, AppState, RowState, SPINNER_CHARS};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

const WIDTHS: [Constraint; 5] = [
    Constraint::Length(4),
    Constraint::Min(20),
    Constraint::Length(10),
    Constraint::Length(6),
    Constraint::Length(6),
];

/// Renders one row per target: live states while scanning, grades once done.
pub fn render_target_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Targets (↑ ↓ to select)");
    let header = Row::new(["#", "Target", "Status", "Grade", "Score"]).style(Style::new().bold()).bottom_margin(1);

    let rows: Vec<Row> = match app.state {
        AppState::Idle => {
            let hint = Paragraph::new("Enter one or more targets and press Enter to start.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(hint, area);
            return;
        }
        AppState::Scanning => app
            .progress
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let (label, color) = match &row.state {
                    RowState::Queued => ("queued".to_string(), Color::DarkGray),
                    RowState::Running => (format!("{} running", SPINNER_CHARS[app.spinner_frame]), Color::Cyan),
                    RowState::Done(status) => (status.to_string().to_lowercase(), status_color(*status)),
                };
                let target = if row.target.is_empty() { "…".to_string() } else { row.target.clone() };
                Row::new(vec![
                    Cell::from((i + 1).to_string()),
                    Cell::from(target),
                    Cell::from(label).style(Style::new().fg(color)),
                    Cell::from(""),
                    Cell::from(""),
                ])
            })
            .collect(),
        AppState::Finished => match &app.report {
            Some(report) => report
                .outcomes
                .iter()
                .enumerate()
                .map(|(i, outcome)| {
                    let (grade, score) = match report.scored(&outcome.target) {
                        Some(scored) => (
                            Cell::from(scored.grade.to_string()).style(Style::new().fg(grade_color(scored.grade)).bold()),
                            Cell::from(scored.score.to_string()),
                        ),
                        None => (Cell::from("-"), Cell::from("-")),
                    };
                    Row::new(vec![
                        Cell::from((i + 1).to_string()),
                        Cell::from(outcome.target.clone()),
                        Cell::from(outcome.status.to_string().to_lowercase())
                            .style(Style::new().fg(status_color(outcome.status))),
                        grade,
                        score,
                    ])
                })
                .collect(),
            None => Vec::new(),
        },
    };

    let table = Table::new(rows, WIDTHS)
        .header(header)
        .block(block)
        .row_highlight_style(Style::new().bg(Color::DarkGray))
        .highlight_symbol("» ");
    frame.render_stateful_widget(table, area, &mut app.table_state);
}
