// src/ui/widgets/log_view.rs

use crate::app::App;
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation},
};

/// Renders the tail of the log file, newest line at the bottom.
///
/// Lines look like `DATE TIME LEVEL MESSAGE`; the timestamp is dimmed and the
/// level colored. Long lines scroll horizontally with ← →.
pub fn render_log_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title("Logs (scroll with ← →, hide with L)")
        .borders(Borders::ALL);
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let max_width = app.log_content.iter().map(|line| line.chars().count()).max().unwrap_or(0);
    app.log_horizontal_scroll_state = app.log_horizontal_scroll_state.content_length(max_width);

    // Keep the newest lines in view, leaving a row for the scrollbar.
    let visible = inner_area.height.saturating_sub(1) as usize;
    let skip = app.log_content.len().saturating_sub(visible);
    let log_lines: Vec<Line> = app.log_content[skip..].iter().map(|line| style_log_line(line)).collect();

    let log_paragraph = Paragraph::new(log_lines).scroll((0, app.log_horizontal_scroll as u16));
    frame.render_widget(log_paragraph, inner_area);

    let scrollbar = Scrollbar::new(ScrollbarOrientation::HorizontalBottom).thumb_symbol("■");
    let scrollbar_area = Rect {
        x: inner_area.x,
        y: inner_area.y + inner_area.height.saturating_sub(1),
        width: inner_area.width,
        height: 1,
    };
    frame.render_stateful_widget(scrollbar, scrollbar_area, &mut app.log_horizontal_scroll_state);
}

fn style_log_line(line: &str) -> Line<'_> {
    let mut parts = line.splitn(3, ' ');
    let (Some(date), Some(time), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
        return Line::from(line);
    };
    // The level is right-aligned, so the padding stays with the timestamp.
    let (level, message) = rest.trim_start().split_once(' ').unwrap_or((rest.trim_start(), ""));
    let level_style = match level {
        "ERROR" => Style::default().fg(Color::Red).bold(),
        "WARN" => Style::default().fg(Color::Yellow),
        "INFO" => Style::default().fg(Color::Green),
        _ => Style::default().fg(Color::Blue),
    };
    Line::from(vec![
        Span::styled(format!("{} {} ", date, time), Style::default().fg(Color::DarkGray)),
        Span::styled(level, level_style),
        Span::raw(format!(" {}", message)),
    ])
}
