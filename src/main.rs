// src/main.rs

use crossterm::{
    ExecutableCommand,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

mod app;
mod config;
mod core;
mod export;
mod logging;
mod ui;

use crate::app::{App, AppState};
use crate::config::ScanConfig;
use crate::core::coordinator::{ScanCoordinator, ScanEvent};
use crate::core::error::ScanError;
use crate::core::models::RunReport;
use crate::core::monitor::SystemMonitor;
use crate::core::runner::ExternalRunner;
use crate::core::targets::parse_target_input;

type RunResult = Result<RunReport, ScanError>;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    let config = ScanConfig::from_env();
    info!(
        binary = %config.binary,
        output_dir = %config.output_dir.display(),
        timeout_secs = config.task_timeout.as_secs(),
        workers = config.requested_workers,
        "Starting tls-sweep."
    );

    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut app = App::new(config);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ScanEvent>();
    let (result_tx, mut result_rx) = mpsc::channel::<RunResult>(1);

    let outcome = run_loop(&mut terminal, &mut app, &event_tx, &result_tx, &mut event_rx, &mut result_rx).await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    info!("Exiting tls-sweep.");
    outcome
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    event_tx: &mpsc::UnboundedSender<ScanEvent>,
    result_tx: &mpsc::Sender<RunResult>,
    event_rx: &mut mpsc::UnboundedReceiver<ScanEvent>,
    result_rx: &mut mpsc::Receiver<RunResult>,
) -> color_eyre::Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(app, event_tx, result_tx)?;
        }

        while let Ok(event) = event_rx.try_recv() {
            app.apply_event(event);
        }
        if let Ok(result) = result_rx.try_recv() {
            app.finish(result);
        }
        app.on_tick();
    }
    Ok(())
}

fn handle_events(
    app: &mut App,
    event_tx: &mpsc::UnboundedSender<ScanEvent>,
    result_tx: &mpsc::Sender<RunResult>,
) -> std::io::Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if app.show_disclaimer {
            match key.code {
                KeyCode::Enter => app.acknowledge_disclaimer(),
                KeyCode::Esc => app.quit(),
                _ => {}
            }
            return Ok(());
        }
        match app.state {
            AppState::Idle => handle_idle_input(app, key.code, event_tx, result_tx),
            AppState::Finished => handle_finished_input(app, key.code),
            AppState::Scanning => match key.code {
                KeyCode::Char('q') => app.quit(),
                KeyCode::Char('l') => app.toggle_logs(),
                KeyCode::Left => app.scroll_logs_left(),
                KeyCode::Right => app.scroll_logs_right(),
                _ => {}
            },
        }
    }
    Ok(())
}

/// Typing edits the target list; Enter starts a run in the background.
fn handle_idle_input(
    app: &mut App,
    key_code: KeyCode,
    event_tx: &mpsc::UnboundedSender<ScanEvent>,
    result_tx: &mpsc::Sender<RunResult>,
) {
    match key_code {
        KeyCode::Esc => app.quit(),
        KeyCode::Char(c) => {
            app.input.push(c);
            app.input_error = None;
        }
        KeyCode::Backspace => {
            app.input.pop();
            app.input_error = None;
        }
        KeyCode::Enter => {
            let targets = match parse_target_input(&app.input) {
                Ok(targets) if targets.is_empty() => return,
                Ok(targets) => targets,
                Err(e) => {
                    app.input_error = Some(e.to_string());
                    return;
                }
            };
            app.start_scan();

            let config = app.config.clone();
            let event_tx = event_tx.clone();
            let result_tx = result_tx.clone();
            tokio::spawn(async move {
                let coordinator = ScanCoordinator::new(ExternalRunner::from_config(&config), SystemMonitor::default())
                    .with_monitor_interval(config.monitor_interval)
                    .with_events(event_tx);
                let result = coordinator
                    .run_all(&targets, config.requested_workers, config.task_timeout)
                    .await;
                let _ = result_tx.send(result).await;
            });
        }
        _ => {}
    }
}

fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('n') => app.reset(),
        KeyCode::Char('e') => app.export(),
        KeyCode::Char('l') => app.toggle_logs(),
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        KeyCode::PageUp => app.scroll_details_up(),
        KeyCode::PageDown => app.scroll_details_down(),
        KeyCode::Left => app.scroll_logs_left(),
        KeyCode::Right => app.scroll_logs_right(),
        _ => {}
    }
}
