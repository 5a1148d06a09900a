// src/core/advisor.rs

//! Worker-count policy. Pure functions of a `ResourceSnapshot`.

use crate::core::models::{ResourceSnapshot, WorkerPlan};

/// Hard ceiling on concurrent auditor processes, whatever the host size.
pub const MAX_WORKERS: usize = 8;
/// Memory budgeted per running auditor.
pub const GB_PER_WORKER: f64 = 2.0;

pub const CPU_OVERLOAD_PERCENT: f64 = 80.0;
pub const MEM_OVERLOAD_PERCENT: f64 = 85.0;
pub const MIN_AVAILABLE_GB: f64 = 1.0;

/// Returns true when the host should not take on more concurrent work.
pub fn is_overloaded(snapshot: &ResourceSnapshot) -> bool {
    snapshot.cpu_percent > CPU_OVERLOAD_PERCENT
        || snapshot.mem_percent > MEM_OVERLOAD_PERCENT
        || snapshot.available_mem_gb < MIN_AVAILABLE_GB
}

/// Computes a safe worker plan.
///
/// One core is always left free and roughly 2 GB of available memory is
/// reserved per worker. Under overload the plan degrades to a single worker
/// instead of refusing to run.
pub fn plan(snapshot: &ResourceSnapshot, requested_workers: usize, core_count: usize) -> WorkerPlan {
    let cores = core_count.max(1);
    let max_by_cpu = cores.saturating_sub(1).max(1);
    let max_by_ram = ((snapshot.available_mem_gb.max(0.0) / GB_PER_WORKER).floor() as usize).max(1);
    let max_safe_workers = max_by_cpu.min(max_by_ram).min(MAX_WORKERS).min(cores).max(1);

    let overloaded = is_overloaded(snapshot);
    let suggested_workers = if overloaded {
        1
    } else {
        requested_workers.clamp(1, max_safe_workers)
    };

    WorkerPlan { suggested_workers, max_safe_workers, overloaded }
}

/// Human-readable reasons behind an overload verdict.
pub fn overload_reasons(snapshot: &ResourceSnapshot) -> Vec<String> {
    let mut reasons = Vec::new();
    if snapshot.cpu_percent > CPU_OVERLOAD_PERCENT {
        reasons.push(format!("CPU at {:.1}%", snapshot.cpu_percent));
    }
    if snapshot.mem_percent > MEM_OVERLOAD_PERCENT {
        reasons.push(format!("memory at {:.1}%", snapshot.mem_percent));
    }
    if snapshot.available_mem_gb < MIN_AVAILABLE_GB {
        reasons.push(format!("only {:.2} GB available", snapshot.available_mem_gb));
    }
    reasons
}
