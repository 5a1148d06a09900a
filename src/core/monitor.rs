// src/core/monitor.rs

use crate::core::error::{Result, ScanError};
use crate::core::models::ResourceSnapshot;
use std::future::Future;
use std::time::Duration;
use sysinfo::{MINIMUM_CPU_UPDATE_INTERVAL, System};
use tokio::task::spawn_blocking;
use tracing::{debug, warn};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Anything that can produce a fresh `ResourceSnapshot` on demand.
///
/// The coordinator only talks to this trait, which lets tests script the
/// host pressure a run observes.
pub trait ResourceProbe: Send + Sync + 'static {
    fn sample(&self) -> impl Future<Output = Result<ResourceSnapshot>> + Send;
}

/// Samples the local host through `sysinfo`.
///
/// Stateless: every call builds its own `System`, so concurrent callers never
/// share anything mutable.
#[derive(Debug, Clone)]
pub struct SystemMonitor {
    timeout: Duration,
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl SystemMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ResourceProbe for SystemMonitor {
    async fn sample(&self) -> Result<ResourceSnapshot> {
        let sampling = spawn_blocking(read_host_metrics);
        match tokio::time::timeout(self.timeout, sampling).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(error = %e, "Resource sampling task panicked.");
                Err(ScanError::ResourceUnavailable(format!("sampling task failed: {}", e)))
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Resource sampling timed out.");
                Err(ScanError::ResourceUnavailable("sampling timed out".to_string()))
            }
        }
    }
}

fn read_host_metrics() -> Result<ResourceSnapshot> {
    let mut sys = System::new();
    // CPU usage is a delta between two refreshes.
    sys.refresh_cpu_usage();
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    let total = sys.total_memory();
    if total == 0 {
        return Err(ScanError::ResourceUnavailable("host reports no memory".to_string()));
    }
    let core_count = match sys.cpus().len() {
        0 => std::thread::available_parallelism()
            .map(|n| n.get())
            .map_err(|e| ScanError::ResourceUnavailable(format!("core count unknown: {}", e)))?,
        n => n,
    };

    let available = sys.available_memory();
    let snapshot = ResourceSnapshot {
        cpu_percent: f64::from(sys.global_cpu_usage()).clamp(0.0, 100.0),
        mem_percent: (total.saturating_sub(available) as f64 / total as f64 * 100.0).clamp(0.0, 100.0),
        available_mem_gb: available as f64 / BYTES_PER_GB,
        load_average_1m: System::load_average().one.max(0.0),
        core_count,
    };
    debug!(
        cpu = snapshot.cpu_percent,
        mem = snapshot.mem_percent,
        available_gb = snapshot.available_mem_gb,
        load = snapshot.load_average_1m,
        cores = snapshot.core_count,
        "Sampled host resources."
    );
    Ok(snapshot)
}
