// src/core/coordinator.rs

//! Runs one auditor task per target with an adaptive, resource-aware
//! concurrency bound, then folds the outcomes into a `RunReport`.

use crate::core::advisor;
use crate::core::aggregator;
use crate::core::error::{Result, ScanError};
use crate::core::models::{
    ResourceSnapshot, RunReport, ScanOutcome, ScanTask, TargetOutcome, TaskStatus, WorkerPlan,
};
use crate::core::monitor::ResourceProbe;
use crate::core::runner::TaskRunner;
use crate::core::targets::prepare_targets;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use strum::Display;
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Extra time a runner gets to enforce its own timeout before the coordinator
/// abandons it.
const RUNNER_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RunPhase {
    Planning,
    Executing,
    Draining,
    Done,
}

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Planned {
        plan: WorkerPlan,
        snapshot: Option<ResourceSnapshot>,
        total: usize,
    },
    Phase(RunPhase),
    TaskStarted {
        index: usize,
        target: String,
    },
    TaskFinished {
        index: usize,
        target: String,
        status: TaskStatus,
        completed: usize,
        total: usize,
    },
    Resources(ResourceSnapshot),
    Overloaded {
        reasons: Vec<String>,
    },
    Recovered,
}

/// Best-effort event sender. A dropped receiver never affects the run.
#[derive(Debug, Clone, Default)]
struct EventSink(Option<mpsc::UnboundedSender<ScanEvent>>);

impl EventSink {
    fn emit(&self, event: ScanEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(event);
        }
    }
}

pub struct ScanCoordinator<R, P> {
    runner: Arc<R>,
    probe: Arc<P>,
    monitor_interval: Duration,
    events: EventSink,
}

impl<R: TaskRunner, P: ResourceProbe> ScanCoordinator<R, P> {
    pub fn new(runner: R, probe: P) -> Self {
        Self {
            runner: Arc::new(runner),
            probe: Arc::new(probe),
            monitor_interval: Duration::from_secs(5),
            events: EventSink::default(),
        }
    }

    /// How often host pressure is re-sampled while tasks run.
    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_events(mut self, tx: mpsc::UnboundedSender<ScanEvent>) -> Self {
        self.events = EventSink(Some(tx));
        self
    }

    /// Scans every target and returns one consolidated report.
    ///
    /// Every attempted target ends up in `report.outcomes`, in input order,
    /// whatever happened to it. Individual failures never fail the run; only a
    /// broken coordinator does.
    pub async fn run_all(
        &self,
        targets: &[String],
        requested_workers: usize,
        per_task_timeout: Duration,
    ) -> Result<RunReport> {
        let started = Instant::now();
        self.events.emit(ScanEvent::Phase(RunPhase::Planning));

        let prepared = prepare_targets(targets);
        let total = prepared.len();
        if total == 0 {
            info!("No targets to scan.");
            self.events.emit(ScanEvent::Phase(RunPhase::Done));
            return Ok(aggregator::aggregate(&[]));
        }

        let mut warnings = Vec::new();
        let overload_events = Arc::new(AtomicUsize::new(0));
        let (plan, snapshot) = match self.probe.sample().await {
            Ok(snapshot) => {
                let plan = advisor::plan(&snapshot, requested_workers, snapshot.core_count);
                if plan.overloaded {
                    let reasons = advisor::overload_reasons(&snapshot);
                    warn!(reasons = ?reasons, "Host is overloaded, starting sequentially.");
                    warnings.push(format!("{}; running sequentially", ScanError::Overloaded(reasons.join(", "))));
                    overload_events.fetch_add(1, Ordering::Relaxed);
                    self.events.emit(ScanEvent::Overloaded { reasons });
                }
                (plan, Some(snapshot))
            }
            Err(e) => {
                warn!(error = %e, "Could not sample host resources, running sequentially.");
                warnings.push(format!("{}; running sequentially", e));
                (WorkerPlan::sequential(), None)
            }
        };
        info!(
            targets = total,
            requested = requested_workers,
            workers = plan.suggested_workers,
            max_safe = plan.max_safe_workers,
            "Planned scan run."
        );
        self.events.emit(ScanEvent::Planned { plan, snapshot, total });

        let mut progress = Progress::new(total);
        let mut queue = Vec::with_capacity(total);
        for (index, entry) in prepared.into_iter().enumerate() {
            match entry {
                Ok(task) => {
                    progress.names[index] = task.target.clone();
                    queue.push((index, task));
                }
                Err(ScanError::InvalidTarget { target, reason }) => {
                    warn!(host = %target, reason = %reason, "Skipping invalid target.");
                    progress.names[index] = target;
                    progress.finish(index, ScanOutcome::failed(format!("invalid target: {}", reason)), &self.events);
                }
                Err(other) => {
                    progress.names[index] = targets.get(index).cloned().unwrap_or_default();
                    progress.finish(index, ScanOutcome::failed(other.to_string()), &self.events);
                }
            }
        }

        let (gate_tx, mut gate_rx) = watch::channel(!plan.overloaded);
        let monitor = tokio::spawn(watch_resources(
            self.probe.clone(),
            self.monitor_interval,
            gate_tx,
            self.events.clone(),
            overload_events.clone(),
        ));

        self.events.emit(ScanEvent::Phase(RunPhase::Executing));
        let semaphore = Arc::new(Semaphore::new(plan.suggested_workers));
        let mut join_set: JoinSet<ScanOutcome> = JoinSet::new();

        let dispatched = self
            .dispatch(queue, &semaphore, &mut join_set, &mut gate_rx, &mut progress, per_task_timeout)
            .await;

        self.events.emit(ScanEvent::Phase(RunPhase::Draining));
        while let Some(joined) = join_set.join_next_with_id().await {
            progress.record(joined, &self.events);
        }
        monitor.abort();
        dispatched?;

        let outcomes = progress.into_outcomes();
        let mut report = aggregator::aggregate(&outcomes);
        report.stats.workers = plan.suggested_workers;
        report.stats.overload_events = overload_events.load(Ordering::Relaxed);
        report.warnings = warnings;

        info!(
            succeeded = report.stats.succeeded,
            timed_out = report.stats.timed_out,
            failed = report.stats.failed,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Scan run finished."
        );
        self.events.emit(ScanEvent::Phase(RunPhase::Done));
        Ok(report)
    }

    async fn dispatch(
        &self,
        queue: Vec<(usize, ScanTask)>,
        semaphore: &Arc<Semaphore>,
        join_set: &mut JoinSet<ScanOutcome>,
        gate_rx: &mut watch::Receiver<bool>,
        progress: &mut Progress,
        per_task_timeout: Duration,
    ) -> Result<()> {
        let mut gate_open = true;
        for (index, task) in queue {
            let permit = loop {
                tokio::select! {
                    permit = semaphore.clone().acquire_owned() => {
                        break permit.map_err(|e| ScanError::Coordinator(format!("worker pool closed: {}", e)))?;
                    }
                    Some(joined) = join_set.join_next_with_id() => progress.record(joined, &self.events),
                }
            };

            // Gate is checked with the permit held. While the host is
            // overloaded only one task runs at a time.
            loop {
                let admitted = !gate_open || *gate_rx.borrow_and_update();
                if admitted || join_set.is_empty() {
                    break;
                }
                tokio::select! {
                    Some(joined) = join_set.join_next_with_id() => progress.record(joined, &self.events),
                    changed = gate_rx.changed() => {
                        if changed.is_err() {
                            debug!("Resource watcher stopped, lifting the overload gate.");
                            gate_open = false;
                        }
                    }
                }
            }

            debug!(index, host = %task.target, "Dispatching scan task.");
            self.events.emit(ScanEvent::TaskStarted { index, target: task.target.clone() });
            let runner = self.runner.clone();
            let handle = join_set.spawn(async move {
                let _permit = permit;
                run_guarded(&*runner, &task, per_task_timeout).await
            });
            progress.running.insert(handle.id(), index);
        }
        Ok(())
    }
}

/// Runs one task, abandoning it if the runner overruns its own timeout.
async fn run_guarded<R: TaskRunner>(runner: &R, task: &ScanTask, timeout: Duration) -> ScanOutcome {
    let started = Instant::now();
    match tokio::time::timeout(timeout.saturating_add(RUNNER_GRACE), runner.run(task, timeout)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(host = %task.target, "Runner overran its timeout, abandoning task.");
            ScanOutcome::Timeout { elapsed_secs: started.elapsed().as_secs_f64() }
        }
    }
}

/// Re-samples the host and publishes whether new tasks may start.
async fn watch_resources<P: ResourceProbe>(
    probe: Arc<P>,
    interval: Duration,
    gate: watch::Sender<bool>,
    events: EventSink,
    overload_events: Arc<AtomicUsize>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let snapshot = match probe.sample().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(error = %e, "Skipping resource sample.");
                continue;
            }
        };
        events.emit(ScanEvent::Resources(snapshot));

        let admit = !advisor::is_overloaded(&snapshot);
        let was_admitting = gate.send_replace(admit);
        if was_admitting && !admit {
            let reasons = advisor::overload_reasons(&snapshot);
            warn!(reasons = ?reasons, "Host overloaded, holding back new tasks.");
            overload_events.fetch_add(1, Ordering::Relaxed);
            events.emit(ScanEvent::Overloaded { reasons });
        } else if !was_admitting && admit {
            info!("Host pressure back to normal.");
            events.emit(ScanEvent::Recovered);
        }
    }
}

fn crashed(e: &JoinError) -> ScanOutcome {
    let reason = if e.is_panic() { "task crashed before reporting" } else { "task cancelled before reporting" };
    ScanOutcome::failed(reason)
}

/// Per-index outcome slots, filled as tasks finish in any order.
struct Progress {
    names: Vec<String>,
    outcomes: Vec<Option<ScanOutcome>>,
    completed: usize,
    /// Input index of every spawned, not yet joined task.
    running: HashMap<Id, usize>,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            names: vec![String::new(); total],
            outcomes: vec![None; total],
            completed: 0,
            running: HashMap::new(),
        }
    }

    fn finish(&mut self, index: usize, outcome: ScanOutcome, events: &EventSink) {
        self.completed += 1;
        events.emit(ScanEvent::TaskFinished {
            index,
            target: self.names[index].clone(),
            status: outcome.status(),
            completed: self.completed,
            total: self.outcomes.len(),
        });
        self.outcomes[index] = Some(outcome);
    }

    fn record(&mut self, joined: std::result::Result<(Id, ScanOutcome), JoinError>, events: &EventSink) {
        let (id, outcome) = match joined {
            Ok((id, outcome)) => (id, outcome),
            Err(e) => {
                warn!(error = %e, "Scan task ended without a result.");
                (e.id(), crashed(&e))
            }
        };
        match self.running.remove(&id) {
            Some(index) => {
                debug!(index, status = %outcome.status(), "Scan task finished.");
                self.finish(index, outcome, events);
            }
            None => warn!(task = %id, "Joined a task that was never dispatched."),
        }
    }

    /// Pairs every slot with its target. Slots a crashed task never filled
    /// become failures.
    fn into_outcomes(self) -> Vec<TargetOutcome> {
        self.names
            .into_iter()
            .zip(self.outcomes)
            .map(|(target, outcome)| {
                let outcome = outcome.unwrap_or_else(|| {
                    let crashed = ScanError::TaskFailed {
                        target: target.clone(),
                        reason: "task crashed before reporting".to_string(),
                    };
                    ScanOutcome::failed(crashed.to_string())
                });
                TargetOutcome { target, outcome }
            })
            .collect()
    }
}
