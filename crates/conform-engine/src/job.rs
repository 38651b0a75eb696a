//! Background job execution.
//!
//! A conform run can take minutes on a large delivery tree, so front-ends
//! run it on a worker thread and follow along over channels: one for
//! progress ticks, one for warning lines, one for the final result.
//! Cancellation is cooperative, checked between records.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use conform_core::{ConformError, JobConfig, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{run_conform, EngineEvent, JobSummary};
use crate::view::TimelineView;

/// Shared cancellation flag, cloneable across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One progress tick, emitted after each record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProgress {
    pub done: usize,
    pub total: usize,
    pub shot: String,
}

/// A conform job ready to run in the background.
pub struct ConformJob {
    config: JobConfig,
    view: Option<Box<dyn TimelineView + Send>>,
}

impl ConformJob {
    pub fn new(config: JobConfig) -> Self {
        Self { config, view: None }
    }

    /// Attach a host timeline view for duplicate detection.
    pub fn with_view(mut self, view: Box<dyn TimelineView + Send>) -> Self {
        self.view = Some(view);
        self
    }

    /// Start the worker thread and hand back the control surface.
    pub fn spawn(self) -> JobHandle {
        let id = Uuid::new_v4();
        let cancel = CancelToken::new();
        let (progress_tx, progress_rx) = unbounded();
        let (warning_tx, warning_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();

        let worker_cancel = cancel.clone();
        let thread = std::thread::spawn(move || {
            info!("job {id} started on {}", self.config.edl_path.display());
            let result = run_job(self, &worker_cancel, &progress_tx, &warning_tx);
            match &result {
                Ok(summary) => info!("job {id} placed {} clips", summary.clips_placed),
                Err(ConformError::Cancelled) => info!("job {id} cancelled"),
                Err(e) => warn!("job {id} failed: {e}"),
            }
            // The handle may already be dropped; nothing to do then.
            let _ = result_tx.send(result);
        });

        JobHandle {
            id,
            cancel,
            progress: progress_rx,
            warnings: warning_rx,
            result: result_rx,
            thread: Mutex::new(Some(thread)),
        }
    }
}

fn run_job(
    job: ConformJob,
    cancel: &CancelToken,
    progress: &Sender<JobProgress>,
    warnings: &Sender<String>,
) -> Result<JobSummary> {
    let view = job.view.as_deref().map(|v| v as &dyn TimelineView);
    run_conform(&job.config, view, cancel, &mut |event| match event {
        EngineEvent::Progress { done, total, shot } => {
            let _ = progress.send(JobProgress { done, total, shot });
        }
        EngineEvent::Warning(text) => {
            let _ = warnings.send(text);
        }
    })
}

/// Control surface of a running job.
pub struct JobHandle {
    id: Uuid,
    cancel: CancelToken,
    progress: Receiver<JobProgress>,
    warnings: Receiver<String>,
    result: Receiver<Result<JobSummary>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Progress ticks, one per processed record.
    pub fn progress(&self) -> &Receiver<JobProgress> {
        &self.progress
    }

    /// Warning lines accumulated so far.
    pub fn warnings(&self) -> &Receiver<String> {
        &self.warnings
    }

    /// Request cancellation; the worker stops at the next record boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the worker finishes and return its result.
    pub fn wait(&self) -> Result<JobSummary> {
        let result = self
            .result
            .recv()
            .map_err(|_| ConformError::Internal("job worker disappeared".to_string()))?;
        if let Some(thread) = self.thread.lock().take() {
            if thread.join().is_err() {
                return Err(ConformError::Internal("job worker panicked".to_string()));
            }
        }
        result
    }
}
