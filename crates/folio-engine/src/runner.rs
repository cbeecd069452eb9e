// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Task runner — one detached OS thread per submitted operation.
//
// The worker owns the request for the task's lifetime. Progress flows back
// over a `watch` channel; the final report (or failure) over a `oneshot`.
// Errors and panics inside an adapter both end as a `Failed` event, never as
// a crash of the caller.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use folio_core::config::EngineConfig;
use folio_core::error::FolioError;
use folio_core::human_errors::{Severity, humanize_error};
use folio_core::types::{OperationReport, OperationRequest, ProgressEvent, TaskId, TaskState};
use folio_document::{PageRasterizer, default_rasterizer};
use tokio::sync::{oneshot, watch};
use tracing::{error, info};

use crate::operations::{self, OperationContext};
use crate::progress::{self, ProgressReporter};

/// Why a task ended without a report.
#[derive(Debug)]
pub struct TaskFailure {
    /// Plain-English summary for the user.
    pub message: String,
    /// What the user could try next.
    pub suggestion: String,
    /// Whether retrying could help.
    pub severity: Severity,
    /// The underlying error.
    pub cause: FolioError,
}

impl TaskFailure {
    fn from_error(cause: FolioError) -> Self {
        let human = humanize_error(&cause);
        Self {
            message: human.message,
            suggestion: human.suggestion,
            severity: human.severity,
            cause,
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.cause)
    }
}

impl std::error::Error for TaskFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

pub type TaskOutcome = Result<OperationReport, TaskFailure>;

/// Launches operations in the background. Holds no per-request state, so a
/// single runner can serve any number of concurrent submissions.
pub struct TaskRunner {
    config: Arc<EngineConfig>,
    rasterizer: Arc<dyn PageRasterizer>,
}

impl TaskRunner {
    /// A runner using the build's default page rasterizer.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rasterizer(config, default_rasterizer())
    }

    pub fn with_rasterizer(config: EngineConfig, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            config: Arc::new(config),
            rasterizer,
        }
    }

    /// Start `request` on its own thread and return immediately.
    ///
    /// The request should already have passed
    /// [`OperationRequest::validate`]; anything it gets wrong anyway ends as
    /// a failed task.
    pub fn submit(&self, request: OperationRequest) -> TaskHandle {
        let id = TaskId::new();
        let (reporter, progress) = progress::channel(id);
        let (result_tx, result_rx) = oneshot::channel();
        info!(task = %id, kind = %request.kind, inputs = request.inputs.len(), "Task submitted");

        // Parked here so a failed spawn can still report through it.
        let slot = Arc::new(Mutex::new(Some(Worker {
            request: Arc::new(request),
            config: Arc::clone(&self.config),
            rasterizer: Arc::clone(&self.rasterizer),
            reporter,
            result_tx,
        })));

        let thread_slot = Arc::clone(&slot);
        let spawned = std::thread::Builder::new()
            .name(format!("folio-task-{}", id.short()))
            .spawn(move || {
                if let Some(worker) = take(&thread_slot) {
                    worker.run();
                }
            });

        // Dropping the JoinHandle detaches the thread.
        if let Err(err) = spawned {
            error!(task = %id, %err, "Failed to spawn worker thread");
            if let Some(worker) = take(&slot) {
                worker.conclude(Err(FolioError::Io(err)));
            }
        }

        TaskHandle {
            id,
            progress,
            result: result_rx,
        }
    }
}

fn take(slot: &Mutex<Option<Worker>>) -> Option<Worker> {
    slot.lock().ok().and_then(|mut worker| worker.take())
}

struct Worker {
    request: Arc<OperationRequest>,
    config: Arc<EngineConfig>,
    rasterizer: Arc<dyn PageRasterizer>,
    reporter: ProgressReporter,
    result_tx: oneshot::Sender<TaskOutcome>,
}

impl Worker {
    fn run(mut self) {
        let request = Arc::clone(&self.request);
        let config = Arc::clone(&self.config);
        let rasterizer = Arc::clone(&self.rasterizer);
        let reporter = &mut self.reporter;

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let ctx = OperationContext::new(&request, &config, rasterizer.as_ref());
            operations::execute(&ctx, reporter)
        }))
        .unwrap_or_else(|payload| Err(FolioError::TaskPanicked(panic_message(payload.as_ref()))));

        self.conclude(result);
    }

    /// Emit the terminal event and hand the outcome to the caller.
    fn conclude(mut self, result: folio_core::error::Result<OperationReport>) {
        let task = self.reporter.task_id();
        let outcome = match result {
            Ok(report) => {
                info!(task = %task, summary = %report.summary, "Task succeeded");
                self.reporter.complete(report.summary.clone());
                Ok(report)
            }
            Err(err) => {
                error!(task = %task, kind = %self.request.kind, error = %err, "Task failed");
                self.reporter.fail(format!("Error: {err}"));
                Err(TaskFailure::from_error(err))
            }
        };
        // The caller may have dropped its handle; that is not an error.
        let _ = self.result_tx.send(outcome);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Caller-side view of one submitted task.
pub struct TaskHandle {
    id: TaskId,
    progress: watch::Receiver<ProgressEvent>,
    result: oneshot::Receiver<TaskOutcome>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// A receiver for the task's progress events. Poll with `borrow()` or
    /// await `changed()`.
    pub fn progress(&self) -> watch::Receiver<ProgressEvent> {
        self.progress.clone()
    }

    /// State carried by the latest event.
    pub fn state(&self) -> TaskState {
        self.progress.borrow().state
    }

    /// Wait for the task to finish.
    pub async fn outcome(self) -> TaskOutcome {
        self.result.await.unwrap_or_else(|_| Err(lost_worker()))
    }

    /// Block the current thread until the task finishes.
    ///
    /// Must not be called from inside an async runtime; use
    /// [`outcome`](Self::outcome) there.
    pub fn wait(self) -> TaskOutcome {
        self.result.blocking_recv().unwrap_or_else(|_| Err(lost_worker()))
    }
}

fn lost_worker() -> TaskFailure {
    TaskFailure::from_error(FolioError::TaskPanicked(
        "worker ended without reporting a result".into(),
    ))
}
