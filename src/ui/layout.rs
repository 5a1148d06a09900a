// src/ui/layout.rs

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen areas, recomputed every frame.
pub struct AppLayout {
    pub input: Rect,
    pub targets: Rect,
    pub details: Rect,
    pub summary: Rect,
    pub log_panel: Rect,
    pub footer: Rect,
}

/// Splits the frame into input bar, content and footer.
///
/// The content area holds the target table above the details panel on the
/// left and the run summary on the right. When `show_logs` is set a log panel
/// takes the bottom third of the content area.
pub fn create_layout(frame_size: Rect, show_logs: bool) -> AppLayout {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(frame_size);

    let (content, log_panel) = if show_logs {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(main_chunks[1]);
        (split[0], split[1])
    } else {
        (main_chunks[1], Rect::default())
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(content);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(columns[0]);

    AppLayout {
        input: main_chunks[0],
        targets: left[0],
        details: left[1],
        summary: columns[1],
        log_panel,
        footer: main_chunks[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_panel_only_takes_space_when_shown() {
        let area = Rect::new(0, 0, 120, 40);
        let hidden = create_layout(area, false);
        assert_eq!(hidden.log_panel, Rect::default());
        let shown = create_layout(area, true);
        assert!(shown.log_panel.height > 0);
        assert!(shown.targets.height < hidden.targets.height);
        assert_eq!(shown.footer.height, 1);
    }
}
