// src/ui/widgets/input.rs
use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// Renders the target input box. Parse errors show up in the bottom border.
pub fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let mut input_block = Block::default()
        .borders(Borders::ALL)
        .title("Targets (host[:port], comma separated, @file)");
    if let Some(error) = &app.input_error {
        input_block = input_block.title_bottom(Line::from(error.as_str()).red());
    }
    let input_paragraph = Paragraph::new(app.input.as_str())
        .block(input_block)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(input_paragraph, area);

    if app.state == AppState::Idle && !app.show_disclaimer {
        let cursor_x = area.x + app.input.chars().count() as u16 + 1;
        frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}
