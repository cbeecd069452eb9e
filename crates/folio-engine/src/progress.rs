// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress channel from a worker to its caller.
//
// Built on `tokio::sync::watch`: one slot, latest value wins, and readers can
// poll with `borrow()` or await `changed()`.

use chrono::Utc;
use folio_core::types::{ProgressEvent, TaskId, TaskState};
use tokio::sync::watch;
use tracing::debug;

/// Create the reporter (worker side) and receiver (caller side) for a task.
/// The receiver starts at the `Pending` event.
pub fn channel(task_id: TaskId) -> (ProgressReporter, watch::Receiver<ProgressEvent>) {
    let (sender, receiver) = watch::channel(ProgressEvent::pending(task_id));
    let reporter = ProgressReporter {
        task_id,
        sender,
        percent: 0.0,
        finished: false,
    };
    (reporter, receiver)
}

/// Worker-side handle. Percent never goes down, and nothing is sent after
/// the terminal event.
pub struct ProgressReporter {
    task_id: TaskId,
    sender: watch::Sender<ProgressEvent>,
    percent: f32,
    finished: bool,
}

impl ProgressReporter {
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Last percent emitted.
    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Mark the task as started.
    pub fn running(&mut self, message: impl Into<String>) {
        self.emit(self.percent, message.into(), TaskState::Running);
    }

    /// Checkpoint after `done` of `total` units.
    pub fn step(&mut self, done: usize, total: usize, message: impl Into<String>) {
        let percent = if total == 0 {
            100.0
        } else {
            done as f32 / total as f32 * 100.0
        };
        self.emit(percent, message.into(), TaskState::Running);
    }

    /// Terminal success at 100%.
    pub fn complete(&mut self, message: impl Into<String>) {
        self.emit(100.0, message.into(), TaskState::Succeeded);
    }

    /// Terminal failure, keeping the percent reached so far.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.emit(self.percent, message.into(), TaskState::Failed);
    }

    fn emit(&mut self, percent: f32, message: String, state: TaskState) {
        if self.finished {
            debug!(task = %self.task_id, %message, "Ignoring progress after terminal event");
            return;
        }
        let percent = if percent.is_nan() { self.percent } else { percent.clamp(0.0, 100.0) };
        self.percent = self.percent.max(percent);
        self.finished = state.is_terminal();

        // `send_replace` stores the value even when every receiver is gone.
        self.sender.send_replace(ProgressEvent {
            task_id: self.task_id,
            percent: self.percent,
            message,
            state,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_pending() {
        let (_reporter, receiver) = channel(TaskId::new());
        let event = receiver.borrow().clone();
        assert_eq!(event.state, TaskState::Pending);
        assert_eq!(event.percent, 0.0);
    }

    #[test]
    fn steps_report_fraction_done() {
        let (mut reporter, receiver) = channel(TaskId::new());
        reporter.running("Splitting PDF");
        reporter.step(1, 4, "Split page 1/4");
        assert_eq!(receiver.borrow().percent, 25.0);
        reporter.step(4, 4, "Split page 4/4");
        assert_eq!(receiver.borrow().percent, 100.0);
        assert_eq!(receiver.borrow().state, TaskState::Running);
    }

    #[test]
    fn percent_never_decreases() {
        let (mut reporter, receiver) = channel(TaskId::new());
        reporter.step(3, 4, "three");
        reporter.step(1, 4, "one");
        let event = receiver.borrow().clone();
        assert_eq!(event.percent, 75.0);
        assert_eq!(event.message, "one");
    }

    #[test]
    fn out_of_range_is_clamped() {
        let (mut reporter, receiver) = channel(TaskId::new());
        reporter.step(9, 4, "overshoot");
        assert_eq!(receiver.borrow().percent, 100.0);
    }

    #[test]
    fn zero_units_counts_as_done() {
        let (mut reporter, receiver) = channel(TaskId::new());
        reporter.step(0, 0, "nothing to do");
        assert_eq!(receiver.borrow().percent, 100.0);
    }

    #[test]
    fn failure_keeps_last_percent() {
        let (mut reporter, receiver) = channel(TaskId::new());
        reporter.step(1, 2, "half");
        reporter.fail("Error: disk full");
        let event = receiver.borrow().clone();
        assert_eq!(event.state, TaskState::Failed);
        assert_eq!(event.percent, 50.0);
    }

    #[test]
    fn nothing_after_terminal_event() {
        let (mut reporter, receiver) = channel(TaskId::new());
        reporter.complete("done");
        reporter.fail("late failure");
        reporter.step(1, 2, "late step");
        let event = receiver.borrow().clone();
        assert_eq!(event.state, TaskState::Succeeded);
        assert_eq!(event.message, "done");
        assert!(reporter.is_finished());
    }

    #[test]
    fn dropped_receiver_does_not_break_the_worker() {
        let (mut reporter, receiver) = channel(TaskId::new());
        drop(receiver);
        reporter.step(1, 1, "still fine");
        reporter.complete("done");
        assert_eq!(reporter.percent(), 100.0);
    }

    #[tokio::test]
    async fn async_reader_sees_latest_value() {
        let (mut reporter, mut receiver) = channel(TaskId::new());
        let worker = std::thread::spawn(move || {
            for done in 1..=10 {
                reporter.step(done, 10, format!("{done}/10"));
            }
            reporter.complete("done");
        });

        let mut last = 0.0;
        loop {
            if receiver.changed().await.is_err() {
                break;
            }
            let event = receiver.borrow_and_update().clone();
            assert!(event.percent >= last);
            last = event.percent;
            if event.state.is_terminal() {
                break;
            }
        }
        worker.join().expect("worker");
        assert_eq!(receiver.borrow().state, TaskState::Succeeded);
    }
}
