//! Simulated transfer run: `idle -> pending -> transferring -> success | error`.

use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use chrono::Utc;
use shared::{
    domain::{
        DestinationConfig, HistoryEntry, RunId, SourceConfig, TransferDirection, TransferOutcome,
        TransferSnapshot, TransferStatus,
    },
    error::{ErrorReport, TransferError},
    protocol::{Notice, TransferEvent},
};
use tokio::{
    sync::{broadcast, Mutex},
    time::{interval_at, sleep, Instant},
};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    history::HistoryLog,
    outcome::{OutcomeSource, WeightedOutcomeSource},
};

const PROGRESS_COMPLETE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTimings {
    pub preparation_delay: Duration,
    pub tick_interval: Duration,
    pub progress_step: u8,
}

impl RunTimings {
    pub fn new(preparation_delay: Duration, tick_interval: Duration, progress_step: u8) -> Self {
        Self {
            preparation_delay,
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            progress_step: progress_step.clamp(1, PROGRESS_COMPLETE),
        }
    }
}

impl Default for RunTimings {
    fn default() -> Self {
        RunTimings::from(&Settings::default())
    }
}

impl From<&Settings> for RunTimings {
    fn from(settings: &Settings) -> Self {
        Self::new(
            settings.preparation_delay(),
            settings.tick_interval(),
            settings.progress_step,
        )
    }
}

/// Labels fixed when the run starts; later form edits do not rewrite them.
#[derive(Debug, Clone)]
struct RunPlan {
    run_id: RunId,
    direction: TransferDirection,
    source_label: String,
    destination_label: String,
}

struct ActiveRun {
    run_id: RunId,
    // Dropping the guard cancels the run's scheduled steps.
    _cancel_guard: DropGuard,
}

#[derive(Default)]
struct OrchestratorState {
    snapshot: TransferSnapshot,
    history: HistoryLog,
    active: Option<ActiveRun>,
}

impl OrchestratorState {
    fn owns(&self, run_id: RunId) -> bool {
        self.active.as_ref().map(|active| active.run_id) == Some(run_id)
    }
}

pub struct TransferOrchestrator {
    timings: RunTimings,
    outcomes: Arc<dyn OutcomeSource>,
    inner: Mutex<OrchestratorState>,
    events: broadcast::Sender<TransferEvent>,
    next_run_id: AtomicI64,
}

impl TransferOrchestrator {
    pub fn new(settings: &Settings) -> Arc<Self> {
        Self::new_with_outcome_source(
            RunTimings::from(settings),
            Arc::new(WeightedOutcomeSource::new(
                settings.success_probability,
                settings.seed,
            )),
            settings.event_capacity,
        )
    }

    pub fn new_with_outcome_source(
        timings: RunTimings,
        outcomes: Arc<dyn OutcomeSource>,
        event_capacity: usize,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Arc::new(Self {
            timings,
            outcomes,
            inner: Mutex::new(OrchestratorState::default()),
            events,
            next_run_id: AtomicI64::new(1),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> TransferSnapshot {
        self.inner.lock().await.snapshot.clone()
    }

    /// Finished runs, most recent first.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.inner.lock().await.history.entries().to_vec()
    }

    pub async fn is_active(&self) -> bool {
        self.inner.lock().await.active.is_some()
    }

    /// Validates readiness and schedules a new run.
    ///
    /// Rejections leave the status, progress and history untouched.
    pub async fn start(
        self: &Arc<Self>,
        source: &SourceConfig,
        destination: &DestinationConfig,
        direction: Option<TransferDirection>,
    ) -> Result<RunId, TransferError> {
        let missing = missing_inputs(source, destination, direction);
        let direction = match direction {
            Some(direction) if missing.is_empty() => direction,
            _ => {
                let err = TransferError::ConfigurationIncomplete { missing };
                warn!(error = %err, "transfer start rejected");
                self.publish(TransferEvent::Rejected {
                    error: ErrorReport::from(&err),
                });
                self.publish(TransferEvent::Notice(Notice::configuration_incomplete()));
                return Err(err);
            }
        };

        let mut state = self.inner.lock().await;
        if let Some(active) = state.active.as_ref() {
            let err = TransferError::RunInProgress {
                run_id: active.run_id.0,
                status: state.snapshot.status.to_string(),
            };
            warn!(error = %err, "transfer start rejected");
            self.publish(TransferEvent::Rejected {
                error: ErrorReport::from(&err),
            });
            return Err(err);
        }

        let run_id = RunId(self.next_run_id.fetch_add(1, Ordering::Relaxed));
        let (source_label, destination_label) = direction.endpoint_labels(source, destination);
        let plan = RunPlan {
            run_id,
            direction,
            source_label,
            destination_label,
        };

        let cancel = CancellationToken::new();
        state.snapshot = TransferSnapshot {
            status: TransferStatus::Pending,
            progress: 0,
            error: None,
            run_id: Some(run_id),
        };
        state.active = Some(ActiveRun {
            run_id,
            _cancel_guard: cancel.clone().drop_guard(),
        });
        info!(
            %run_id,
            %direction,
            source = %plan.source_label,
            destination = %plan.destination_label,
            "transfer run started"
        );
        self.publish(TransferEvent::StatusChanged {
            run_id,
            status: TransferStatus::Pending,
            error: None,
        });

        tokio::spawn(drive_run(Arc::downgrade(self), plan, self.timings, cancel));
        Ok(run_id)
    }

    /// Stops the active run, if any, and returns to `idle` without recording history.
    pub async fn cancel(&self) -> bool {
        let mut state = self.inner.lock().await;
        let Some(active) = state.active.take() else {
            return false;
        };
        let run_id = active.run_id;
        drop(active);

        state.snapshot = TransferSnapshot::default();
        info!(%run_id, "transfer run cancelled");
        self.publish(TransferEvent::StatusChanged {
            run_id,
            status: TransferStatus::Idle,
            error: None,
        });
        true
    }

    async fn begin_transferring(&self, run_id: RunId) -> bool {
        let mut state = self.inner.lock().await;
        if !state.owns(run_id) {
            return false;
        }
        state.snapshot.status = TransferStatus::Transferring;
        debug!(%run_id, "transfer run preparing finished");
        self.publish(TransferEvent::StatusChanged {
            run_id,
            status: TransferStatus::Transferring,
            error: None,
        });
        true
    }

    async fn advance(&self, run_id: RunId, progress: u8) -> bool {
        let mut state = self.inner.lock().await;
        if !state.owns(run_id) {
            return false;
        }
        state.snapshot.progress = progress;
        debug!(%run_id, progress, "transfer progress");
        self.publish(TransferEvent::ProgressUpdated { run_id, progress });
        true
    }

    async fn resolve(&self, plan: RunPlan) {
        let mut state = self.inner.lock().await;
        if !state.owns(plan.run_id) {
            return;
        }

        let outcome = self.outcomes.draw();
        let error = match outcome {
            TransferOutcome::Success => None,
            TransferOutcome::Failure => Some(TransferError::simulated_failure().to_string()),
        };
        let status = outcome.terminal_status();
        let entry = HistoryEntry {
            id: plan.run_id,
            source: plan.source_label,
            destination: plan.destination_label,
            timestamp: Utc::now(),
            outcome,
            error: error.clone(),
            direction: plan.direction,
        };

        state.snapshot.status = status;
        state.snapshot.error = error.clone();
        state.history.record(entry.clone());
        state.active = None;

        match outcome {
            TransferOutcome::Success => info!(run_id = %plan.run_id, "transfer run succeeded"),
            TransferOutcome::Failure => {
                warn!(run_id = %plan.run_id, error = ?error, "transfer run failed")
            }
        }

        self.publish(TransferEvent::StatusChanged {
            run_id: plan.run_id,
            status,
            error: error.clone(),
        });
        self.publish(TransferEvent::Completed { entry });
        let notice = match outcome {
            TransferOutcome::Success => Notice::transfer_succeeded(),
            TransferOutcome::Failure => Notice::transfer_failed(error.as_deref()),
        };
        self.publish(TransferEvent::Notice(notice));
    }

    fn publish(&self, event: TransferEvent) {
        // No subscribers is fine; the snapshot still reflects the state.
        let _ = self.events.send(event);
    }
}

async fn drive_run(
    orchestrator: Weak<TransferOrchestrator>,
    plan: RunPlan,
    timings: RunTimings,
    cancel: CancellationToken,
) {
    let run_id = plan.run_id;

    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = sleep(timings.preparation_delay) => {}
    }
    let Some(this) = orchestrator.upgrade() else {
        return;
    };
    if !this.begin_transferring(run_id).await {
        return;
    }
    drop(this);

    let mut ticker = interval_at(
        Instant::now() + timings.tick_interval,
        timings.tick_interval,
    );
    let mut progress = 0u8;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        let Some(this) = orchestrator.upgrade() else {
            return;
        };
        if progress >= PROGRESS_COMPLETE {
            this.resolve(plan).await;
            return;
        }
        progress = progress
            .saturating_add(timings.progress_step)
            .min(PROGRESS_COMPLETE);
        if !this.advance(run_id, progress).await {
            return;
        }
    }
}

fn missing_inputs(
    source: &SourceConfig,
    destination: &DestinationConfig,
    direction: Option<TransferDirection>,
) -> Vec<String> {
    let mut missing = source
        .missing_fields()
        .into_iter()
        .map(|field| format!("source.{field}"))
        .chain(
            destination
                .missing_fields()
                .into_iter()
                .map(|field| format!("destination.{field}")),
        )
        .collect::<Vec<_>>();
    if direction.is_none() {
        missing.push("direction".to_string());
    }
    missing
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
