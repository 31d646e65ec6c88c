//! Sequential batch moves.
//!
//! Requests are processed strictly one after another: two in-flight moves could
//! pick the same unique name. Individual failures are collected unless
//! `stop_on_error` is set, in which case the batch halts at the first failure
//! and untouched requests are left out of the report.
//!
//! `spawn_batch` runs the same loop on a worker thread and reports over a channel.

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::Serialize;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::mover::{FileMover, MoveRequest, MoveResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    pub stop_on_error: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Number of requests submitted.
    pub total: usize,
    /// Moves that completed, skips included.
    pub success: usize,
    /// Subset of `success` that were skipped on conflict.
    pub skipped: usize,
    pub failed: usize,
    /// One result per processed request, in order.
    pub operations: Vec<MoveResult>,
    pub cancelled: bool,
    pub stopped_on_error: bool,
}

impl BatchReport {
    fn push(&mut self, result: MoveResult) {
        match &result {
            MoveResult::Failed { .. } => self.failed += 1,
            MoveResult::Skipped { .. } => {
                self.success += 1;
                self.skipped += 1;
            }
            MoveResult::Success { .. } => self.success += 1,
        }
        self.operations.push(result);
    }
}

/// Run `requests` with no observers.
pub fn run_batch(mover: &FileMover, requests: &[MoveRequest], options: BatchOptions) -> BatchReport {
    run_batch_with(mover, requests, options, &CancelToken::new(), |_, _| {}, |_| {})
}

/// Run `requests` in order.
///
/// `on_progress(current, total)` fires before each item; `on_file_complete` after it.
pub fn run_batch_with<P, C>(
    mover: &FileMover,
    requests: &[MoveRequest],
    options: BatchOptions,
    cancel: &CancelToken,
    mut on_progress: P,
    mut on_file_complete: C,
) -> BatchReport
where
    P: FnMut(usize, usize),
    C: FnMut(&MoveResult),
{
    let total = requests.len();
    let mut report = BatchReport {
        total,
        ..BatchReport::default()
    };

    for (i, request) in requests.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(done = i, total, "batch cancelled");
            report.cancelled = true;
            break;
        }
        on_progress(i + 1, total);

        let result = mover.move_file(request);
        on_file_complete(&result);
        let failed = result.is_failed();
        report.push(result);

        if failed && options.stop_on_error {
            warn!(done = i + 1, total, "stopping batch on first error");
            report.stopped_on_error = true;
            break;
        }
    }

    info!(
        total,
        success = report.success,
        skipped = report.skipped,
        failed = report.failed,
        "batch finished"
    );
    report
}

/// Progress reported by a background batch.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Progress { current: usize, total: usize },
    FileComplete(MoveResult),
    Finished(BatchReport),
}

/// Handle to a batch running on its own thread.
pub struct BatchHandle {
    events: Receiver<BatchEvent>,
    cancel: CancelToken,
    worker: JoinHandle<()>,
}

impl BatchHandle {
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.events
    }

    /// Ask the worker to stop before its next item.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drain events until the batch finishes and return its report.
    ///
    /// Events not yet consumed through `events()` are passed to `on_event`.
    pub fn wait<F>(self, mut on_event: F) -> Option<BatchReport>
    where
        F: FnMut(&BatchEvent),
    {
        let mut report = None;
        for event in self.events.iter() {
            on_event(&event);
            if let BatchEvent::Finished(r) = event {
                report = Some(r);
            }
        }
        if self.worker.join().is_err() {
            warn!("batch worker panicked");
        }
        report
    }
}

/// Run a batch on a worker thread, streaming `BatchEvent`s.
pub fn spawn_batch(
    mover: FileMover,
    requests: Vec<MoveRequest>,
    options: BatchOptions,
    cancel: CancelToken,
) -> BatchHandle {
    let (tx, rx): (Sender<BatchEvent>, Receiver<BatchEvent>) = unbounded();
    let worker_cancel = cancel.clone();
    let worker = thread::spawn(move || {
        // A dropped receiver only means nobody is listening.
        let progress_tx = tx.clone();
        let complete_tx = tx.clone();
        let report = run_batch_with(
            &mover,
            &requests,
            options,
            &worker_cancel,
            |current, total| {
                let _ = progress_tx.send(BatchEvent::Progress { current, total });
            },
            |result| {
                let _ = complete_tx.send(BatchEvent::FileComplete(result.clone()));
            },
        );
        let _ = tx.send(BatchEvent::Finished(report));
    });
    BatchHandle {
        events: rx,
        cancel,
        worker,
    }
}
