// src/ui/widgets/mod.rs

use crate::core::models::{Grade, Severity, TaskStatus};
use ratatui::style::Color;

pub mod analysis_view; // Details of the selected target.
pub mod disclaimer_popup;
pub mod footer;
pub mod input;
pub mod log_view;
pub mod summary;
pub mod target_table; // One row per target, live while scanning.

pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::High => Color::LightRed,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::LightYellow,
        Severity::Warn => Color::Magenta,
        Severity::Info => Color::Cyan,
        Severity::Ok => Color::Green,
    }
}

pub fn grade_color(grade: Grade) -> Color {
    match grade {
        Grade::APlus | Grade::A | Grade::AMinus => Color::Green,
        Grade::BPlus | Grade::B => Color::Cyan,
        Grade::C => Color::Yellow,
        Grade::D | Grade::F => Color::Red,
    }
}

pub fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Success => Color::Green,
        TaskStatus::Timeout => Color::Yellow,
        TaskStatus::Failed => Color::Red,
    }
}
