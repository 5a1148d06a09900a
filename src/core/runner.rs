// src/core/runner.rs

use crate::config::{ExistingOutput, ScanConfig};
use crate::core::error::ScanError;
use crate::core::models::{ScanOutcome, ScanTask};
use crate::core::parser::parse_findings_file;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Bytes of stderr/stdout kept for failure reasons.
const OUTPUT_TAIL: usize = 512;
/// How long to wait for pipe readers once the process has exited.
const READER_GRACE: Duration = Duration::from_secs(2);

/// Runs one scan for one target and always produces an outcome.
pub trait TaskRunner: Send + Sync + 'static {
    fn run(&self, task: &ScanTask, timeout: Duration) -> impl Future<Output = ScanOutcome> + Send;
}

/// Drives the external auditor binary.
#[derive(Debug, Clone)]
pub struct ExternalRunner {
    binary: String,
    extra_args: Vec<String>,
    output_flag: String,
    output_dir: PathBuf,
    existing_output: ExistingOutput,
}

impl ExternalRunner {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            extra_args: config.extra_args.clone(),
            output_flag: config.output_flag.clone(),
            output_dir: config.output_dir.clone(),
            existing_output: config.existing_output,
        }
    }

    /// Where the findings for `target` are written.
    pub fn output_path(&self, target: &str) -> PathBuf {
        self.output_dir.join(format!("{}.json", safe_file_stem(target)))
    }

    fn command(&self, target: &str, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.extra_args)
            .arg(&self.output_flag)
            .arg(output)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down the auditor's helpers too.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }

    async fn prepare_output(&self, path: &Path) -> Result<(), ScanError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| ScanError::Io { path: self.output_dir.clone(), source })?;
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ScanError::Io { path: path.to_path_buf(), source }),
        }
    }
}

impl TaskRunner for ExternalRunner {
    async fn run(&self, task: &ScanTask, timeout: Duration) -> ScanOutcome {
        let target = task.target.as_str();
        let output = self.output_path(target);

        if self.existing_output == ExistingOutput::Reuse && output.exists() {
            match parse_findings_file(&output, target) {
                Ok(findings) => {
                    info!(host = target, path = %output.display(), "Reusing existing findings file.");
                    return ScanOutcome::Success { findings, duration_secs: 0.0 };
                }
                Err(e) => warn!(host = target, error = %e, "Existing findings file unusable, rescanning."),
            }
        }

        if let Err(e) = self.prepare_output(&output).await {
            return ScanOutcome::failed(e.to_string());
        }

        info!(host = target, binary = %self.binary, "Starting auditor.");
        let started = Instant::now();
        let mut child = match self.command(target, &output).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(host = target, error = %e, "Failed to spawn auditor.");
                return ScanOutcome::failed(format!("failed to spawn '{}': {}", self.binary, e));
            }
        };
        let stdout = spawn_tail_reader(child.stdout.take());
        let stderr = spawn_tail_reader(child.stderr.take());

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                terminate(&mut child).await;
                stdout.abort();
                stderr.abort();
                return ScanOutcome::failed(format!("failed waiting on auditor: {}", e));
            }
            Err(_) => {
                terminate(&mut child).await;
                stdout.abort();
                stderr.abort();
                let elapsed_secs = started.elapsed().as_secs_f64();
                let error = ScanError::TaskTimeout { target: target.to_string(), elapsed_secs };
                warn!(error = %error, "Auditor killed.");
                return ScanOutcome::Timeout { elapsed_secs };
            }
        };

        let duration_secs = started.elapsed().as_secs_f64();
        let stderr_tail = collect_tail(stderr).await;
        let stdout_tail = collect_tail(stdout).await;

        if !status.success() {
            let detail = if stderr_tail.is_empty() { stdout_tail } else { stderr_tail };
            let reason = match status.code() {
                Some(code) => format!("auditor exited with status {}", code),
                None => "auditor terminated by signal".to_string(),
            };
            let reason = if detail.is_empty() { reason } else { format!("{}: {}", reason, detail) };
            let error = ScanError::TaskFailed { target: target.to_string(), reason: reason.clone() };
            warn!(error = %error, "Scan failed.");
            return ScanOutcome::failed(reason);
        }

        match parse_findings_file(&output, target) {
            Ok(findings) => {
                info!(host = target, findings = findings.len(), duration_secs, "Scan finished.");
                ScanOutcome::Success { findings, duration_secs }
            }
            Err(e) => {
                warn!(host = target, error = %e, "Auditor succeeded but produced no usable findings.");
                ScanOutcome::failed(e.to_string())
            }
        }
    }
}

/// Kills the auditor (and its process group on unix) and reaps it.
async fn terminate(child: &mut Child) {
    if let Some(pid) = child.id() {
        kill_process_group(pid);
    }
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "Auditor already exited.");
    }
    if let Err(e) = child.wait().await {
        warn!(error = %e, "Could not reap auditor process.");
    }
}

/// Sends SIGKILL to the auditor's process group, which `command` made it lead.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        warn!(pid, "Auditor pid out of range, cannot signal its process group.");
        return;
    };
    // SAFETY: killpg takes no pointers; the group id is the child we spawned.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
        return;
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        debug!(pid, "Auditor process group already gone.");
    } else {
        warn!(pid, error = %err, "Could not kill auditor process group.");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

fn spawn_tail_reader<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(mut pipe) = pipe else {
            return String::new();
        };
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!(error = %e, "Auditor output pipe closed early.");
        }
        tail(&buf)
    })
}

async fn collect_tail(handle: JoinHandle<String>) -> String {
    let abort = handle.abort_handle();
    match tokio::time::timeout(READER_GRACE, handle).await {
        Ok(Ok(text)) => text,
        Ok(Err(_)) => String::new(),
        Err(_) => {
            abort.abort();
            String::new()
        }
    }
}

fn tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    let start = text.len().saturating_sub(OUTPUT_TAIL);
    let start = (start..text.len()).find(|i| text.is_char_boundary(*i)).unwrap_or(text.len());
    text[start..].trim().to_string()
}

/// Filesystem-safe, collision-free file stem for a target.
///
/// Only `[A-Za-z0-9-]` survive; anything else becomes `_` and a hash of the
/// raw target is appended. Stems without a hash therefore never contain `_`,
/// so two distinct targets cannot map to the same file.
pub fn safe_file_stem(target: &str) -> String {
    let mut changed = false;
    let stem: String = target
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                changed = true;
                '_'
            }
        })
        .collect();
    if changed || stem.is_empty() {
        format!("{}-{:016x}", stem, fnv1a(target.as_bytes()))
    } else {
        stem
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
