// src/logging.rs

use color_eyre::eyre::Result;
use directories::ProjectDirs;
use lazy_static::lazy_static;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use time::macros::format_description;
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::{self, EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Bytes read per step when walking the log file backwards.
const TAIL_CHUNK: u64 = 16 * 1024;

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref LOG_ENV: String = format!("{}_LOGLEVEL", PROJECT_NAME.clone());
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "tls-sweep", env!("CARGO_PKG_NAME"))
}

pub fn get_data_dir() -> PathBuf {
    if let Some(proj_dirs) = project_directory() {
        proj_dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

pub fn log_path() -> PathBuf {
    get_data_dir().join(LOG_FILE.as_str())
}

/// Initializes file-based logging using the tracing subscriber.
///
/// The terminal belongs to the TUI, so everything goes to the log file.
pub fn initialize_logging() -> Result<()> {
    let directory = get_data_dir();
    std::fs::create_dir_all(&directory)?;
    let log_file = std::fs::File::create(log_path())?;

    let file_log_level = std::env::var("RUST_LOG")
        .or_else(|_| std::env::var(LOG_ENV.clone()))
        .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")));

    let timer = LocalTime::new(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"));

    let file_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_timer(timer)
        .with_target(false)
        .with_ansi(false)
        .with_filter(EnvFilter::new(file_log_level));

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .init();

    Ok(())
}

/// Last `max_lines` lines of the log file, oldest first.
pub fn read_log_tail(max_lines: usize) -> Vec<String> {
    read_tail(&log_path(), max_lines).unwrap_or_default()
}

/// Reads backwards from the end of `path` until `max_lines` full lines are in
/// hand, so the cost does not grow with the file.
fn read_tail(path: &Path, max_lines: usize) -> std::io::Result<Vec<String>> {
    let mut file = File::open(path)?;
    let mut start = file.metadata()?.len();
    let mut buf: Vec<u8> = Vec::new();
    while start > 0 && buf.iter().filter(|b| **b == b'\n').count() <= max_lines {
        let step = TAIL_CHUNK.min(start);
        start -= step;
        file.seek(SeekFrom::Start(start))?;
        let mut chunk = vec![0; step as usize];
        file.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&buf);
        buf = chunk;
    }
    Ok(tail_lines(&String::from_utf8_lossy(&buf), max_lines))
}

fn tail_lines(content: &str, max_lines: usize) -> Vec<String> {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].iter().map(|l| l.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_names_derive_from_the_crate_name() {
        assert_eq!(PROJECT_NAME.as_str(), "TLS_SWEEP");
        assert_eq!(LOG_ENV.as_str(), "TLS_SWEEP_LOGLEVEL");
        assert_eq!(LOG_FILE.as_str(), "tls-sweep.log");
    }

    #[test]
    fn tail_keeps_the_newest_lines() {
        assert_eq!(tail_lines("a\nb\nc\n", 2), ["b", "c"]);
        assert_eq!(tail_lines("a\n", 5), ["a"]);
        assert!(tail_lines("", 3).is_empty());
    }

    #[test]
    fn tail_of_a_large_file_reads_only_the_end() {
        let path = std::env::temp_dir().join(format!("tls-sweep-log-tail-{}.log", std::process::id()));
        let content: String = (0..5000).map(|i| format!("2026-01-01 00:00:00  INFO line {}\n", i)).collect();
        std::fs::write(&path, &content).unwrap();
        assert!(content.len() as u64 > 3 * TAIL_CHUNK);

        let lines = read_tail(&path, 3).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("line 4997"));
        assert!(lines[2].ends_with("line 4999"));

        assert_eq!(read_tail(&path, 10_000).unwrap().len(), 5000);
        std::fs::remove_file(&path).unwrap();
        assert!(read_tail(&path, 3).is_err());
    }
}
