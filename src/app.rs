// src/app.rs

use crate::config::ScanConfig;
use crate::core::coordinator::{RunPhase, ScanEvent};
use crate::core::error::ScanError;
use crate::core::models::{ResourceSnapshot, RunReport, ScoredTarget, TargetStatus, TaskStatus, WorkerPlan};
use crate::export::export_report;
use crate::logging::read_log_tail;
use ratatui::widgets::{ScrollbarState, TableState};
use tracing::{error, info};

pub const SPINNER_CHARS: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Log lines kept for the log panel.
const LOG_TAIL_LINES: usize = 200;

pub enum ExportStatus {
    Idle,
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Idle,
    Scanning,
    Finished,
}

/// Live state of one target while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    Queued,
    Running,
    Done(TaskStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRow {
    pub target: String,
    pub state: RowState,
}

/// What the coordinator has told us so far about the current run.
#[derive(Debug, Default)]
pub struct RunProgress {
    pub phase: Option<RunPhase>,
    pub plan: Option<WorkerPlan>,
    pub snapshot: Option<ResourceSnapshot>,
    pub rows: Vec<TargetRow>,
    pub completed: usize,
    pub total: usize,
    pub overloaded: bool,
    pub overload_reasons: Vec<String>,
}

pub struct App {
    pub should_quit: bool,
    pub state: AppState,
    pub show_disclaimer: bool,
    pub config: ScanConfig,
    pub input: String,
    pub input_error: Option<String>,
    pub progress: RunProgress,
    pub report: Option<RunReport>,
    pub run_error: Option<String>,
    pub table_state: TableState,
    pub details_scroll: u16,
    pub show_logs: bool,
    pub log_content: Vec<String>,
    pub log_horizontal_scroll: usize,
    pub log_horizontal_scroll_state: ScrollbarState,
    pub export_status: ExportStatus,
    pub spinner_frame: usize,
    /// Gauge value, animated towards the report's average score.
    pub displayed_score: u8,
}

impl App {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            should_quit: false,
            state: AppState::Idle,
            show_disclaimer: true,
            config,
            input: String::new(),
            input_error: None,
            progress: RunProgress::default(),
            report: None,
            run_error: None,
            table_state: TableState::default(),
            details_scroll: 0,
            show_logs: false,
            log_content: Vec::new(),
            log_horizontal_scroll: 0,
            log_horizontal_scroll_state: ScrollbarState::default(),
            export_status: ExportStatus::Idle,
            spinner_frame: 0,
            displayed_score: 0,
        }
    }

    pub fn on_tick(&mut self) {
        if self.state == AppState::Scanning {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
        if let Some(target) = self.report.as_ref().and_then(RunReport::average_score) {
            if self.displayed_score < target {
                self.displayed_score += 1;
            } else if self.displayed_score > target {
                self.displayed_score -= 1;
            }
        }
        if self.show_logs {
            self.log_content = read_log_tail(LOG_TAIL_LINES);
        }
    }

    /// Switches to `Scanning` for a fresh run.
    pub fn start_scan(&mut self) {
        self.state = AppState::Scanning;
        self.progress = RunProgress::default();
        self.report = None;
        self.run_error = None;
        self.input_error = None;
        self.export_status = ExportStatus::Idle;
        self.table_state.select(None);
        self.details_scroll = 0;
        self.displayed_score = 0;
    }

    pub fn apply_event(&mut self, event: ScanEvent) {
        let progress = &mut self.progress;
        match event {
            ScanEvent::Planned { plan, snapshot, total } => {
                progress.plan = Some(plan);
                progress.snapshot = snapshot;
                progress.total = total;
                progress.overloaded = plan.overloaded;
                progress.rows = vec![TargetRow { target: String::new(), state: RowState::Queued }; total];
            }
            ScanEvent::Phase(phase) => progress.phase = Some(phase),
            ScanEvent::TaskStarted { index, target } => {
                if let Some(row) = progress.rows.get_mut(index) {
                    *row = TargetRow { target, state: RowState::Running };
                }
            }
            ScanEvent::TaskFinished { index, target, status, completed, total } => {
                progress.completed = completed;
                progress.total = total;
                if let Some(row) = progress.rows.get_mut(index) {
                    *row = TargetRow { target, state: RowState::Done(status) };
                }
            }
            ScanEvent::Resources(snapshot) => progress.snapshot = Some(snapshot),
            ScanEvent::Overloaded { reasons } => {
                progress.overloaded = true;
                progress.overload_reasons = reasons;
            }
            ScanEvent::Recovered => {
                progress.overloaded = false;
                progress.overload_reasons.clear();
            }
        }
    }

    pub fn finish(&mut self, result: Result<RunReport, ScanError>) {
        self.state = AppState::Finished;
        match result {
            Ok(report) => {
                if !report.outcomes.is_empty() {
                    self.table_state.select(Some(0));
                }
                self.report = Some(report);
            }
            Err(e) => {
                error!(error = %e, "Scan run failed.");
                self.run_error = Some(e.to_string());
            }
        }
    }

    pub fn select_next(&mut self) {
        let len = self.report.as_ref().map_or(0, |r| r.outcomes.len());
        if len == 0 {
            return;
        }
        let next = self.table_state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.table_state.select(Some(next));
        self.details_scroll = 0;
    }

    pub fn select_previous(&mut self) {
        if let Some(i) = self.table_state.selected() {
            self.table_state.select(Some(i.saturating_sub(1)));
            self.details_scroll = 0;
        }
    }

    pub fn selected_status(&self) -> Option<&TargetStatus> {
        let report = self.report.as_ref()?;
        report.outcomes.get(self.table_state.selected()?)
    }

    pub fn selected_scored(&self) -> Option<&ScoredTarget> {
        let status = self.selected_status()?;
        self.report.as_ref()?.scored(&status.target)
    }

    pub fn scroll_details_down(&mut self) {
        self.details_scroll = self.details_scroll.saturating_add(1);
    }

    pub fn scroll_details_up(&mut self) {
        self.details_scroll = self.details_scroll.saturating_sub(1);
    }

    pub fn toggle_logs(&mut self) {
        self.show_logs = !self.show_logs;
        if self.show_logs {
            self.log_content = read_log_tail(LOG_TAIL_LINES);
        }
    }

    pub fn scroll_logs_left(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_sub(4);
        self.log_horizontal_scroll_state = self.log_horizontal_scroll_state.position(self.log_horizontal_scroll);
    }

    pub fn scroll_logs_right(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_add(4);
        self.log_horizontal_scroll_state = self.log_horizontal_scroll_state.position(self.log_horizontal_scroll);
    }

    pub fn export(&mut self) {
        let Some(report) = &self.report else {
            return;
        };
        self.export_status = match export_report(report, &self.config.output_dir) {
            Ok(path) => {
                info!(path = %path.display(), "Report exported from the TUI.");
                ExportStatus::Success(path.display().to_string())
            }
            Err(e) => {
                error!(error = ?e, "Report export failed.");
                ExportStatus::Error(format!("{:#}", e))
            }
        };
    }

    pub fn acknowledge_disclaimer(&mut self) {
        self.show_disclaimer = false;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.input = String::new();
        self.input_error = None;
        self.progress = RunProgress::default();
        self.report = None;
        self.run_error = None;
        self.table_state = TableState::default();
        self.details_scroll = 0;
        self.export_status = ExportStatus::Idle;
        self.displayed_score = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::aggregate;
    use crate::core::models::{ScanOutcome, TargetOutcome};

    fn report() -> RunReport {
        aggregate(&[
            TargetOutcome {
                target: "a.example.com".to_string(),
                outcome: ScanOutcome::Success { findings: vec![], duration_secs: 1.0 },
            },
            TargetOutcome {
                target: "b.example.com".to_string(),
                outcome: ScanOutcome::failed("auditor exited with status 1"),
            },
        ])
    }

    #[test]
    fn events_drive_the_progress_rows() {
        let mut app = App::new(ScanConfig::default());
        app.start_scan();
        app.apply_event(ScanEvent::Planned { plan: WorkerPlan::sequential(), snapshot: None, total: 2 });
        app.apply_event(ScanEvent::TaskStarted { index: 1, target: "b.com".to_string() });
        assert_eq!(app.progress.rows[0].state, RowState::Queued);
        assert_eq!(app.progress.rows[1].state, RowState::Running);

        app.apply_event(ScanEvent::TaskFinished {
            index: 1,
            target: "b.com".to_string(),
            status: TaskStatus::Timeout,
            completed: 1,
            total: 2,
        });
        assert_eq!(app.progress.rows[1].state, RowState::Done(TaskStatus::Timeout));
        assert_eq!(app.progress.completed, 1);

        app.apply_event(ScanEvent::Overloaded { reasons: vec!["CPU at 97.0%".to_string()] });
        assert!(app.progress.overloaded);
        assert_eq!(app.progress.overload_reasons, ["CPU at 97.0%"]);
        app.apply_event(ScanEvent::Recovered);
        assert!(!app.progress.overloaded);
    }

    #[test]
    fn selection_stays_within_the_report() {
        let mut app = App::new(ScanConfig::default());
        app.start_scan();
        app.finish(Ok(report()));
        assert_eq!(app.state, AppState::Finished);
        assert_eq!(app.selected_status().unwrap().target, "a.example.com");
        assert!(app.selected_scored().is_some());

        app.select_next();
        app.select_next();
        assert_eq!(app.selected_status().unwrap().target, "b.example.com");
        assert!(app.selected_scored().is_none());

        app.select_previous();
        app.select_previous();
        assert_eq!(app.table_state.selected(), Some(0));
    }

    #[test]
    fn run_errors_are_kept_for_display() {
        let mut app = App::new(ScanConfig::default());
        app.finish(Err(ScanError::Coordinator("worker pool closed".to_string())));
        assert!(app.report.is_none());
        assert!(app.run_error.unwrap().contains("worker pool closed"));
    }

    #[test]
    fn gauge_animates_towards_the_average() {
        let mut app = App::new(ScanConfig::default());
        app.finish(Ok(report()));
        for _ in 0..150 {
            app.on_tick();
        }
        assert_eq!(app.displayed_score, 100);
    }

    #[test]
    fn reset_returns_to_a_clean_idle_state() {
        let mut app = App::new(ScanConfig::default());
        app.input = "a.com".to_string();
        app.finish(Ok(report()));
        app.reset();
        assert_eq!(app.state, AppState::Idle);
        assert!(app.input.is_empty());
        assert!(app.report.is_none());
        assert_eq!(app.table_state.selected(), None);
    }
}
