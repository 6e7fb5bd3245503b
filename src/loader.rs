//! Single-flight loading of the next item.
//!
//! [`LoadController::request_load`] claims the loading flag with a
//! compare-and-swap before anything is spawned, so two triggers in the same
//! turn cannot both start a load. The claim is a [`LoadGuard`] that travels
//! with the in-flight fetch and comes back inside the [`LoadEvent`]; the flag
//! clears whenever the guard is dropped, whichever way the load ends.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::axis::Threshold;
use crate::sequence::{ItemId, Sequence};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("simulated fetch #{attempt} failed")]
    Simulated { attempt: u32 },
    #[error("item source unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous data source standing in for a network call.
///
/// The fetch carries no payload: the id that gets appended is always the
/// next one in the sequence, computed when the fetch completes.
pub trait ItemSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<(), FetchError>> + Send;
}

/// Fixed-latency source. Every `fail_every`-th fetch fails (0 disables failures).
#[derive(Debug)]
pub struct SimulatedSource {
    latency: Duration,
    fail_every: u32,
    attempts: AtomicU32,
}

impl SimulatedSource {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            fail_every: 0,
            attempts: AtomicU32::new(0),
        }
    }

    pub fn with_fail_every(mut self, fail_every: u32) -> Self {
        self.fail_every = fail_every;
        self
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl ItemSource for SimulatedSource {
    fn fetch(&self) -> impl Future<Output = Result<(), FetchError>> + Send {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        let latency = self.latency;
        let fail = self.fail_every > 0 && attempt % self.fail_every == 0;
        async move {
            tokio::time::sleep(latency).await;
            if fail {
                Err(FetchError::Simulated { attempt })
            } else {
                Ok(())
            }
        }
    }
}

/// Shared "a load is in flight" flag.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Atomically flips the flag from false to true. Returns `None` if it was already set.
    pub fn try_acquire(&self) -> Option<LoadGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LoadGuard {
                flag: Arc::clone(&self.0),
            })
    }
}

/// Clears the loading flag on drop.
#[derive(Debug)]
pub struct LoadGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Completion of a fetch, delivered back to the event loop.
#[derive(Debug)]
pub struct LoadEvent {
    pub ticket: u64,
    pub result: Result<(), FetchError>,
    guard: LoadGuard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Appended(ItemId),
    /// The item was appended and the sequence reached its maximum.
    AppendedAndFinished(ItemId),
    /// Nothing appended; the next id would exceed the maximum.
    Finished,
    Failed,
}

impl LoadOutcome {
    pub fn appended(self) -> Option<ItemId> {
        match self {
            LoadOutcome::Appended(id) | LoadOutcome::AppendedAndFinished(id) => Some(id),
            LoadOutcome::Finished | LoadOutcome::Failed => None,
        }
    }
}

pub struct LoadController<S> {
    source: Arc<S>,
    loading: LoadingFlag,
    finished: bool,
    max: Threshold,
    started: u64,
    failures: u64,
}

impl<S: ItemSource> LoadController<S> {
    pub fn new(source: S, max: Threshold) -> Self {
        // a maximum of 1 (or 0) is already met by the initial item
        let finished = max.is_reached_by(1);
        Self {
            source: Arc::new(source),
            loading: LoadingFlag::default(),
            finished,
            max,
            started: 0,
            failures: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn max(&self) -> &Threshold {
        &self.max
    }

    /// Number of loads started since construction.
    pub fn loads_started(&self) -> u64 {
        self.started
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Start loading the next item unless a load is in flight or the list is finished.
    ///
    /// Must be called from within a tokio runtime. Returns whether a load was started.
    pub fn request_load<E>(&mut self, events: &UnboundedSender<E>) -> bool
    where
        E: From<LoadEvent> + Send + 'static,
    {
        if self.finished {
            return false;
        }
        let Some(guard) = self.loading.try_acquire() else {
            return false;
        };

        self.started += 1;
        let ticket = self.started;
        debug!(ticket, "load started");

        let source = Arc::clone(&self.source);
        let events = events.clone();
        tokio::spawn(async move {
            let result = source.fetch().await;
            let event = LoadEvent {
                ticket,
                result,
                guard,
            };
            // no cancellation: a load outlives a dropped receiver and its guard is released here
            if events.send(E::from(event)).is_err() {
                debug!(ticket, "load finished after the list was dropped");
            }
        });
        true
    }

    /// Apply a completed fetch to `sequence`. The loading flag is released on return.
    pub fn complete(&mut self, sequence: &mut Sequence, event: LoadEvent) -> LoadOutcome {
        let LoadEvent {
            ticket,
            result,
            guard,
        } = event;

        let outcome = match result {
            Err(e) => {
                self.failures += 1;
                error!(ticket, error = %e, "Error fetching data");
                LoadOutcome::Failed
            }
            Ok(()) if self.finished => LoadOutcome::Finished,
            Ok(()) => {
                let candidate = sequence.next_id();
                if !self.max.admits(candidate) {
                    self.finished = true;
                    info!(ticket, max = %self.max, "sequence finished");
                    LoadOutcome::Finished
                } else {
                    match sequence.append(candidate) {
                        Ok(()) if self.max.is_reached_by(candidate) => {
                            self.finished = true;
                            info!(ticket, item = candidate, "sequence finished");
                            LoadOutcome::AppendedAndFinished(candidate)
                        }
                        Ok(()) => {
                            debug!(ticket, item = candidate, "item appended");
                            LoadOutcome::Appended(candidate)
                        }
                        Err(e) => {
                            self.failures += 1;
                            error!(ticket, error = %e, "Error appending item");
                            LoadOutcome::Failed
                        }
                    }
                }
            }
        };

        drop(guard);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    struct FailingSource;

    impl ItemSource for FailingSource {
        fn fetch(&self) -> impl Future<Output = Result<(), FetchError>> + Send {
            async { Err(FetchError::Unavailable("offline".to_string())) }
        }
    }

    struct PanickingSource;

    impl ItemSource for PanickingSource {
        fn fetch(&self) -> impl Future<Output = Result<(), FetchError>> + Send {
            async { panic!("source blew up") }
        }
    }

    #[test]
    fn test_flag_is_single_flight() {
        let flag = LoadingFlag::default();
        let guard = flag.try_acquire().expect("first acquire");
        assert!(flag.is_set());
        assert!(flag.try_acquire().is_none());
        drop(guard);
        assert!(!flag.is_set());
        assert!(flag.try_acquire().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_appends_next_item() {
        let (tx, mut rx) = unbounded_channel::<LoadEvent>();
        let mut loader = LoadController::new(SimulatedSource::default(), Threshold::Value(50));
        let mut seq = Sequence::new();

        assert!(loader.request_load(&tx));
        assert!(loader.is_loading());

        let event = rx.recv().await.expect("load event");
        assert_eq!(loader.complete(&mut seq, event), LoadOutcome::Appended(2));
        assert!(!loader.is_loading());
        assert_eq!(seq.as_slice(), &[1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_while_loading_is_noop() {
        let (tx, mut rx) = unbounded_channel::<LoadEvent>();
        let mut loader = LoadController::new(SimulatedSource::default(), Threshold::Value(50));
        let mut seq = Sequence::new();

        assert!(loader.request_load(&tx));
        assert!(!loader.request_load(&tx));
        assert_eq!(loader.loads_started(), 1);

        let event = rx.recv().await.expect("load event");
        loader.complete(&mut seq, event);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_is_swallowed_and_flag_released() {
        let (tx, mut rx) = unbounded_channel::<LoadEvent>();
        let mut loader = LoadController::new(FailingSource, Threshold::Value(50));
        let mut seq = Sequence::new();

        assert!(loader.request_load(&tx));
        let event = rx.recv().await.expect("load event");
        assert!(event.result.is_err());
        assert_eq!(loader.complete(&mut seq, event), LoadOutcome::Failed);
        assert!(!loader.is_loading());
        assert_eq!(loader.failures(), 1);
        assert_eq!(seq.len(), 1);
        assert!(loader.request_load(&tx));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_source_fails_every_nth() {
        let (tx, mut rx) = unbounded_channel::<LoadEvent>();
        let source = SimulatedSource::default().with_fail_every(2);
        let mut loader = LoadController::new(source, Threshold::Value(50));
        let mut seq = Sequence::new();

        let mut outcomes = Vec::new();
        for _ in 0..4 {
            assert!(loader.request_load(&tx));
            let event = rx.recv().await.expect("load event");
            outcomes.push(loader.complete(&mut seq, event));
        }
        assert_eq!(
            outcomes,
            vec![
                LoadOutcome::Appended(2),
                LoadOutcome::Failed,
                LoadOutcome::Appended(3),
                LoadOutcome::Failed,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_fetch_releases_flag() {
        let (tx, mut rx) = unbounded_channel::<LoadEvent>();
        let mut loader = LoadController::new(PanickingSource, Threshold::Value(50));

        assert!(loader.request_load(&tx));
        drop(tx);
        assert!(rx.recv().await.is_none());
        assert!(!loader.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_receiver_releases_flag() {
        let (tx, rx) = unbounded_channel::<LoadEvent>();
        let mut loader = LoadController::new(SimulatedSource::default(), Threshold::Value(50));
        drop(rx);

        assert!(loader.request_load(&tx));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!loader.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_finishes_at_max() {
        let (tx, mut rx) = unbounded_channel::<LoadEvent>();
        let mut loader = LoadController::new(SimulatedSource::default(), Threshold::Value(3));
        let mut seq = Sequence::new();

        for _ in 0..2 {
            assert!(loader.request_load(&tx));
            let event = rx.recv().await.expect("load event");
            loader.complete(&mut seq, event);
        }
        assert_eq!(seq.as_slice(), &[1, 2, 3]);
        assert!(loader.is_finished());
        assert!(!loader.request_load(&tx));
        assert_eq!(loader.loads_started(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_max_finishes_without_appending() {
        let (tx, mut rx) = unbounded_channel::<LoadEvent>();
        let mut loader =
            LoadController::new(SimulatedSource::default(), Threshold::Invalid("lots".into()));
        let mut seq = Sequence::new();

        assert!(!loader.is_finished());
        assert!(loader.request_load(&tx));
        let event = rx.recv().await.expect("load event");
        assert_eq!(loader.complete(&mut seq, event), LoadOutcome::Finished);
        assert!(loader.is_finished());
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_max_of_one_starts_finished() {
        let loader = LoadController::new(SimulatedSource::default(), Threshold::Value(1));
        assert!(loader.is_finished());
    }
}
