//! Batch scheduler: cooperative, chunked traversal of the staged items.
//!
//! Items are processed in fixed-size batches, strictly sequentially within
//! a batch — never concurrently — so at most one decoded document is held
//! at a time. After each item the task yields briefly to let the host's
//! event loop run; after each full batch it pauses longer, giving the
//! allocator a window to reclaim the batch's decoded state before the next
//! batch allocates more. Both pauses are policy, not hard-coded waits.
//!
//! Progress is reported after every item as `round(done / total * 100)`,
//! monotone non-decreasing and ending at 100. Rounding means runs of 200 or
//! more items can report 100 one item before the end, so completion is
//! signalled by the run callbacks, not by the percent value.
//!
//! Cancellation is checked *between* items only: an in-flight item always
//! runs to completion. The default [`CancelToken`] never fires, so external
//! behavior is unchanged when cancellation is unused.

use crate::error::ToolError;
use crate::progress::ProgressObserver;
use crate::staging::StagedItem;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Tunable batching/yielding policy.
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    /// Items per batch.
    pub batch_size: usize,
    /// Short pause after each item, to keep the host responsive.
    pub item_pause: Duration,
    /// Longer pause after each full batch, to let memory be reclaimed.
    pub batch_pause: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 5,
            item_pause: Duration::from_millis(8),
            batch_pause: Duration::from_millis(20),
        }
    }
}

/// Cooperative cancellation flag, checked between items.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Overall percentage after `done` of `total` items.
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    debug_assert!(total > 0 && done <= total);
    ((done as f64 / total as f64) * 100.0).round() as u8
}

/// Drive `f` over every staged item, in order, batched per `policy`.
///
/// `f` receives the item and its 0-based index and runs to completion
/// before the next item starts. The first error aborts the traversal;
/// no progress event is emitted for the failing item.
pub async fn run_batched<'a, F>(
    items: &'a [StagedItem],
    policy: &BatchPolicy,
    observer: &dyn ProgressObserver,
    cancel: &CancelToken,
    mut f: F,
) -> Result<(), ToolError>
where
    F: FnMut(&'a StagedItem, usize) -> BoxFuture<'a, Result<(), ToolError>>,
{
    let total = items.len();
    if total == 0 {
        return Err(ToolError::NoInput);
    }
    let batch_size = policy.batch_size.max(1);
    debug!(total, batch_size, "starting batched traversal");

    let mut done = 0usize;
    for batch in items.chunks(batch_size) {
        for item in batch {
            if cancel.is_cancelled() {
                return Err(ToolError::Cancelled {
                    completed: done,
                    total,
                });
            }
            let index = done;
            observer.on_item_start(index, total);
            trace!(index, name = %item.file.name, "processing item");
            f(item, index).await?;
            done += 1;
            observer.on_progress(percent(done, total));

            // Let the host's rendering/input loop breathe between items.
            if done < total && !policy.item_pause.is_zero() {
                tokio::time::sleep(policy.item_pause).await;
            }
        }
        // Longer pause between batches so the just-dropped documents can be
        // reclaimed before the next batch allocates.
        if done < total && !policy.batch_pause.is_zero() {
            tokio::time::sleep(policy.batch_pause).await;
        }
    }

    debug_assert_eq!(done, total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::InputFile;
    use std::sync::Mutex;

    fn items(n: usize) -> Vec<StagedItem> {
        (0..n)
            .map(|i| StagedItem {
                id: i as u64 + 1,
                file: Arc::new(InputFile::new(
                    format!("f{i}.pdf"),
                    Some("application/pdf"),
                    vec![0u8; 4],
                )),
                page_count: None,
            })
            .collect()
    }

    #[derive(Default)]
    struct Percents(Mutex<Vec<u8>>);

    impl ProgressObserver for Percents {
        fn on_progress(&self, percent: u8) {
            self.0.lock().unwrap().push(percent);
        }
    }

    fn fast_policy() -> BatchPolicy {
        BatchPolicy {
            batch_size: 5,
            item_pause: Duration::ZERO,
            batch_pause: Duration::ZERO,
        }
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(1, 8), 13); // 12.5 rounds away from zero
    }

    #[test]
    fn percent_can_hit_100_one_item_early_on_long_runs() {
        assert_eq!(percent(199, 200), 100);
        assert_eq!(percent(200, 200), 100);
    }

    #[tokio::test]
    async fn progress_is_monotone_and_ends_at_100() {
        let staged = items(7);
        let obs = Percents::default();
        run_batched(
            &staged,
            &fast_policy(),
            &obs,
            &CancelToken::new(),
            |_item, _| Box::pin(async { Ok(()) }),
        )
        .await
        .unwrap();

        let seen = obs.0.lock().unwrap().clone();
        assert_eq!(seen.len(), 7);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 100);
        assert!(seen[..6].iter().all(|&p| p < 100));
    }

    #[tokio::test]
    async fn items_visited_in_staged_order() {
        let staged = items(6);
        let visited = Arc::new(Mutex::new(Vec::new()));
        let v = visited.clone();
        run_batched(
            &staged,
            &fast_policy(),
            &NoopObserver,
            &CancelToken::new(),
            move |item, index| {
                let v = v.clone();
                let name = item.file.name.clone();
                Box::pin(async move {
                    v.lock().unwrap().push((index, name));
                    Ok(())
                })
            },
        )
        .await
        .unwrap();

        let seen = visited.lock().unwrap().clone();
        let expected: Vec<_> = (0..6).map(|i| (i, format!("f{i}.pdf"))).collect();
        assert_eq!(seen, expected);
    }

    struct NoopObserver;
    impl ProgressObserver for NoopObserver {}

    #[tokio::test]
    async fn error_stops_traversal_and_progress() {
        let staged = items(5);
        let obs = Percents::default();
        let result = run_batched(
            &staged,
            &fast_policy(),
            &obs,
            &CancelToken::new(),
            |_item, index| {
                Box::pin(async move {
                    if index == 2 {
                        Err(ToolError::Internal("boom".into()))
                    } else {
                        Ok(())
                    }
                })
            },
        )
        .await;

        assert!(result.is_err());
        // Progress was reported for the two completed items only.
        let seen = obs.0.lock().unwrap().clone();
        assert_eq!(seen, vec![percent(1, 5), percent(2, 5)]);
    }

    #[tokio::test]
    async fn empty_snapshot_is_rejected() {
        let result = run_batched(
            &[],
            &fast_policy(),
            &NoopObserver,
            &CancelToken::new(),
            |_item, _| Box::pin(async { Ok(()) }),
        )
        .await;
        assert!(matches!(result, Err(ToolError::NoInput)));
    }

    #[tokio::test]
    async fn cancellation_takes_effect_between_items() {
        let staged = items(4);
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let result = run_batched(
            &staged,
            &fast_policy(),
            &NoopObserver,
            &cancel,
            move |_item, index| {
                let trigger = trigger.clone();
                Box::pin(async move {
                    if index == 1 {
                        trigger.cancel();
                    }
                    Ok(())
                })
            },
        )
        .await;

        match result {
            Err(ToolError::Cancelled { completed, total }) => {
                assert_eq!(completed, 2);
                assert_eq!(total, 4);
            }
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }
}
