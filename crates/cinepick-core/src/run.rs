use cinepick_models::{ProgressState, RunKind, RunOutcome};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Highest value a run reports before it is terminal.
const MAX_RUNNING_PROGRESS: f64 = 0.99;

/// Progress of one run: written by the run, read by any number of pollers.
///
/// `progress` never decreases, stays below 1.0 while running, and becomes
/// exactly 1.0 together with `complete`. Once complete the state is frozen.
#[derive(Clone, Default)]
pub struct ProgressCell {
    inner: Arc<RwLock<ProgressState>>,
}

impl ProgressCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressState {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn update(&self, progress: f64, status: impl Into<String>) {
        let mut state = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if state.complete {
            return;
        }
        state.progress = clamp_running(state.progress, progress);
        state.status = status.into();
    }

    /// Move the bar without touching the status text.
    pub fn advance(&self, progress: f64) {
        let mut state = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if state.complete {
            return;
        }
        state.progress = clamp_running(state.progress, progress);
    }

    pub fn finish(&self, status: impl Into<String>) {
        let mut state = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if state.complete {
            return;
        }
        state.progress = 1.0;
        state.status = status.into();
        state.complete = true;
    }
}

fn clamp_running(current: f64, requested: f64) -> f64 {
    let requested = if requested.is_finite() { requested } else { current };
    current.max(requested.clamp(0.0, MAX_RUNNING_PROGRESS))
}

/// Caller's view of a started run: progress, stop request, and the final outcome.
#[derive(Clone)]
pub struct RunHandle {
    kind: RunKind,
    progress: ProgressCell,
    cancel: CancellationToken,
    outcome: watch::Receiver<Option<RunOutcome>>,
}

/// The run's side of a [`RunHandle`].
pub struct RunReporter {
    progress: ProgressCell,
    cancel: CancellationToken,
    outcome: watch::Sender<Option<RunOutcome>>,
}

impl RunHandle {
    pub fn new(kind: RunKind) -> (RunHandle, RunReporter) {
        let progress = ProgressCell::new();
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(None);
        (
            RunHandle {
                kind,
                progress: progress.clone(),
                cancel: cancel.clone(),
                outcome: rx,
            },
            RunReporter {
                progress,
                cancel,
                outcome: tx,
            },
        )
    }

    pub fn kind(&self) -> RunKind {
        self.kind
    }

    pub fn progress(&self) -> ProgressState {
        self.progress.snapshot()
    }

    /// Ask the run to stop at its next checkpoint. Idempotent.
    pub fn request_stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.borrow().is_some() || self.outcome.has_changed().is_err()
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome.borrow().clone()
    }

    /// Wait for the run to terminate.
    pub async fn wait(&self) -> RunOutcome {
        let mut rx = self.outcome.clone();
        loop {
            if let Some(outcome) = rx.borrow_and_update().clone() {
                return outcome;
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone().unwrap_or_else(|| RunOutcome::Error {
                    message: "run ended without reporting an outcome".to_string(),
                });
            }
        }
    }
}

impl RunReporter {
    pub fn progress(&self) -> &ProgressCell {
        &self.progress
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Publish the terminal outcome; the progress cell freezes at 1.0.
    pub fn finish(&self, outcome: RunOutcome) {
        self.progress.finish(outcome.status());
        self.outcome.send_replace(Some(outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic_and_capped_until_finish() {
        let cell = ProgressCell::new();
        assert_eq!(cell.snapshot(), ProgressState::default());

        cell.update(0.4, "Scraping");
        cell.update(0.2, "Scraping more");
        assert_eq!(cell.snapshot().progress, 0.4);
        assert_eq!(cell.snapshot().status, "Scraping more");

        cell.advance(5.0);
        assert!(cell.snapshot().progress < 1.0);
        assert!(!cell.snapshot().complete);

        cell.finish("Complete");
        let done = cell.snapshot();
        assert_eq!(done.progress, 1.0);
        assert!(done.complete);
    }

    #[test]
    fn test_finished_state_is_frozen() {
        let cell = ProgressCell::new();
        cell.finish("Stopped");
        cell.update(0.1, "late update");
        cell.finish("Complete");
        assert_eq!(cell.snapshot().status, "Stopped");
        assert_eq!(cell.snapshot().progress, 1.0);
    }

    #[tokio::test]
    async fn test_handle_observes_reporter() {
        let (handle, reporter) = RunHandle::new(RunKind::Quick);
        assert!(!handle.is_finished());

        handle.request_stop();
        handle.request_stop();
        assert!(reporter.is_cancelled());

        reporter.finish(RunOutcome::Stopped);
        assert_eq!(handle.wait().await, RunOutcome::Stopped);
        assert!(handle.is_finished());
        assert_eq!(handle.progress().status, "Stopped");
    }

    #[tokio::test]
    async fn test_dropped_reporter_yields_error_outcome() {
        let (handle, reporter) = RunHandle::new(RunKind::Full);
        drop(reporter);
        assert!(matches!(handle.wait().await, RunOutcome::Error { .. }));
        assert!(handle.is_finished());
    }
}
