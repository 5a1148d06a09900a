// src/ui/widgets/disclaimer_popup.rs

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    text::Line,
};

/// Renders the authorization disclaimer as a modal over the rest of the UI.
pub fn render_disclaimer_popup(frame: &mut Frame, area: Rect) {
    let disclaimer_text = Text::from(vec![
        Line::from("IMPORTANT LEGAL DISCLAIMER".bold().yellow()),
        Line::from(""),
        Line::from("tls-sweep runs an external TLS auditor against every target you enter. Each audit opens many connections and sends deliberately malformed handshakes."),
        Line::from(""),
        Line::from("Only scan hosts you own or have explicit, written permission to test. Unauthorized scanning may be illegal in your jurisdiction."),
        Line::from(""),
        Line::from("By continuing you confirm that:"),
        Line::from("1. Every target you enter is in scope for you to test."),
        Line::from("2. You accept responsibility for the traffic this tool generates."),
        Line::from("3. The authors assume NO liability for misuse or damage."),
        Line::from(""),
        Line::from("Press ".bold() + "Enter".bold().yellow() + " to Acknowledge and Continue".bold()),
    ]);

    let block = Block::default()
        .title("Disclaimer")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let popup_area = centered_rect(60, 60, area);

    let popup = Paragraph::new(disclaimer_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

/// A `Rect` of the given percentages, centered in `r`.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centered_inside_its_parent() {
        let parent = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 60, parent);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.x, 20);
        assert!(popup.y > 0 && popup.bottom() < parent.bottom());
    }
}
