//! Progress-observer trait for per-item run events.
//!
//! Inject an `Arc<dyn ProgressObserver>` into the dispatcher to receive
//! events as the scheduler walks the staged items.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: a
//! front-end can forward events to a progress bar, a UI overlay, or a log
//! without the library knowing how the host communicates. The trait is
//! `Send + Sync` so observers can be shared freely; all methods default to
//! no-ops so implementors only override what they care about.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

/// Called by the pipeline as a run progresses.
///
/// The scheduler guarantees that `on_progress` percentages are monotone
/// non-decreasing and reach exactly 100 only after the last item of a
/// successful run; after a failing item no further events are emitted.
pub trait ProgressObserver: Send + Sync {
    /// Called once when the run starts, before any item is processed.
    fn on_run_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called just before an item is handed to the transformation routine.
    ///
    /// `index` is 0-based; `total` is the snapshot size.
    fn on_item_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called after every completed item with the overall percentage,
    /// computed as `round(items_completed / total * 100)`.
    fn on_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// Called once if the run fails; no `on_progress` follows.
    fn on_run_failed(&self, error: &str) {
        let _ = error;
    }

    /// Called once after a successful run with the number of outputs emitted.
    fn on_run_complete(&self, outputs: usize) {
        let _ = outputs;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {}

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Poll-friendly view of the in-flight run: its status plus the latest
/// overall percentage. Share one as the dispatcher's observer and render
/// it from wherever the front-end draws.
#[derive(Debug, Default)]
pub struct ProcessingSession {
    status: Mutex<RunStatus>,
    percent: AtomicU8,
}

impl ProcessingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RunStatus {
        *self.status.lock().unwrap()
    }

    /// Latest reported overall percentage, `0..=100`.
    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::SeqCst)
    }
}

impl ProgressObserver for ProcessingSession {
    fn on_run_start(&self, _total_items: usize) {
        *self.status.lock().unwrap() = RunStatus::Running;
        self.percent.store(0, Ordering::SeqCst);
    }

    fn on_progress(&self, percent: u8) {
        self.percent.store(percent, Ordering::SeqCst);
    }

    fn on_run_failed(&self, _error: &str) {
        *self.status.lock().unwrap() = RunStatus::Failed;
    }

    fn on_run_complete(&self, _outputs: usize) {
        *self.status.lock().unwrap() = RunStatus::Succeeded;
    }
}

/// Convenience alias matching the type the dispatcher stores.
pub type SharedProgress = Arc<dyn ProgressObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        percents: Mutex<Vec<u8>>,
        failures: AtomicUsize,
        completions: AtomicUsize,
    }

    impl ProgressObserver for Recorder {
        fn on_progress(&self, percent: u8) {
            self.percents.lock().unwrap().push(percent);
        }
        fn on_run_failed(&self, _error: &str) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
        fn on_run_complete(&self, _outputs: usize) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopProgress;
        obs.on_run_start(3);
        obs.on_item_start(0, 3);
        obs.on_progress(33);
        obs.on_run_failed("boom");
        obs.on_run_complete(3);
    }

    #[test]
    fn session_tracks_status_and_percent() {
        let session = ProcessingSession::new();
        assert_eq!(session.status(), RunStatus::Idle);

        session.on_run_start(4);
        assert_eq!(session.status(), RunStatus::Running);
        session.on_progress(25);
        session.on_progress(50);
        assert_eq!(session.percent(), 50);

        session.on_run_complete(4);
        assert_eq!(session.status(), RunStatus::Succeeded);

        let failing = ProcessingSession::new();
        failing.on_run_start(1);
        failing.on_run_failed("boom");
        assert_eq!(failing.status(), RunStatus::Failed);
    }

    #[test]
    fn recorder_sees_events_through_dyn() {
        let rec = Arc::new(Recorder::default());
        let obs: SharedProgress = rec.clone();
        obs.on_progress(50);
        obs.on_progress(100);
        obs.on_run_complete(2);
        assert_eq!(*rec.percents.lock().unwrap(), vec![50, 100]);
        assert_eq!(rec.completions.load(Ordering::SeqCst), 1);
        assert_eq!(rec.failures.load(Ordering::SeqCst), 0);
    }
}
