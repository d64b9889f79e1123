//! Lazily built documentation index with single-flight loading.
//!
//! The first caller starts the build; everyone who arrives while it runs
//! awaits the same build. A finished index is published once and read
//! without locking. A failed or timed-out build is remembered until the
//! next caller retries it.

use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::QuireError;
use crate::indexer::IndexSnapshot;
use crate::tree::DocumentNode;

/// Produces a fresh snapshot. Runs on the blocking thread pool.
pub trait IndexLoader: Send + Sync + 'static {
    fn load(&self) -> Result<IndexSnapshot, QuireError>;
}

/// Lifecycle of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    NotLoaded,
    Loading,
    Ready,
    Failed,
}

type BuildOutcome = Result<Arc<IndexSnapshot>, Arc<QuireError>>;
type SharedBuild = Shared<BoxFuture<'static, BuildOutcome>>;
type LoadTask = JoinHandle<Result<IndexSnapshot, QuireError>>;

#[derive(Default)]
struct LoadSlot {
    /// Build in progress, tagged with its attempt number.
    inflight: Option<(u64, SharedBuild)>,
    /// Blocking load abandoned by a timed-out build. The next build awaits
    /// it instead of starting another load.
    orphan: Option<LoadTask>,
    last_error: Option<Arc<QuireError>>,
    attempts: u64,
}

/// Read-only view of the document roots of a built index.
#[derive(Debug, Clone)]
pub struct Documents(Arc<IndexSnapshot>);

impl Documents {
    pub fn snapshot(&self) -> &IndexSnapshot {
        &self.0
    }
}

impl Deref for Documents {
    type Target = [DocumentNode];

    fn deref(&self) -> &[DocumentNode] {
        &self.0.roots
    }
}

/// The documentation index.
pub struct DocIndex {
    loader: Arc<dyn IndexLoader>,
    build_timeout: Duration,
    ready: OnceLock<Arc<IndexSnapshot>>,
    slot: Arc<Mutex<LoadSlot>>,
}

impl DocIndex {
    pub fn new(loader: impl IndexLoader, build_timeout: Duration) -> Self {
        Self {
            loader: Arc::new(loader),
            build_timeout,
            ready: OnceLock::new(),
            slot: Arc::new(Mutex::new(LoadSlot::default())),
        }
    }

    pub fn state(&self) -> IndexState {
        let slot = self.lock_slot();
        if self.ready.get().is_some() {
            return IndexState::Ready;
        }
        match (&slot.inflight, &slot.last_error) {
            (Some(_), _) => IndexState::Loading,
            (None, Some(_)) => IndexState::Failed,
            (None, None) => IndexState::NotLoaded,
        }
    }

    /// Error of the most recent failed build, if the index is not ready.
    pub fn last_error(&self) -> Option<Arc<QuireError>> {
        self.lock_slot().last_error.clone()
    }

    /// Number of builds started so far.
    pub fn build_attempts(&self) -> u64 {
        self.lock_slot().attempts
    }

    /// Make sure the index is built, building it at most once at a time.
    pub async fn ensure_ready(&self) -> Result<Arc<IndexSnapshot>, QuireError> {
        if let Some(snapshot) = self.ready.get() {
            return Ok(Arc::clone(snapshot));
        }

        let (attempt, build) = {
            let mut slot = self.lock_slot();
            if let Some(snapshot) = self.ready.get() {
                return Ok(Arc::clone(snapshot));
            }
            let joined = slot
                .inflight
                .as_ref()
                .map(|(attempt, build)| (*attempt, build.clone()));
            match joined {
                Some((attempt, build)) => {
                    debug!("Joining index build #{attempt}");
                    (attempt, build)
                }
                None => self.start_build(&mut slot),
            }
        };

        let outcome = build.await;
        self.settle(attempt, &outcome);
        outcome.map_err(QuireError::Unavailable)
    }

    /// Full document tree.
    pub async fn documents(&self) -> Result<Documents, QuireError> {
        self.ensure_ready().await.map(Documents)
    }

    fn start_build(&self, slot: &mut LoadSlot) -> (u64, SharedBuild) {
        slot.attempts += 1;
        let attempt = slot.attempts;
        info!("Building documentation index (attempt #{attempt})");

        let mut task = match slot.orphan.take() {
            Some(task) => {
                debug!("Index build #{attempt} resumes a timed-out load");
                task
            }
            None => {
                let loader = Arc::clone(&self.loader);
                tokio::task::spawn_blocking(move || loader.load())
            }
        };

        let orphans = Arc::clone(&self.slot);
        let limit = self.build_timeout;
        let build = async move {
            let started = Instant::now();

            let finished = tokio::time::timeout(limit, &mut task).await;
            let outcome = match finished {
                Ok(Ok(Ok(snapshot))) => Ok(Arc::new(snapshot)),
                Ok(Ok(Err(e))) => Err(e),
                Ok(Err(join_err)) => Err(QuireError::Index(format!(
                    "Index build task failed: {join_err}"
                ))),
                Err(_) => {
                    // Still running on the blocking pool
                    lock(&orphans).orphan = Some(task);
                    Err(QuireError::Timeout(limit))
                }
            };

            let elapsed = started.elapsed().as_millis();
            match &outcome {
                Ok(_) => debug!("Index build #{attempt} finished in {elapsed} ms"),
                Err(QuireError::Timeout(_)) => {
                    debug!("Index build #{attempt} timed out after {elapsed} ms")
                }
                Err(_) => debug!("Index build #{attempt} failed after {elapsed} ms"),
            }
            outcome.map_err(Arc::new)
        }
        .boxed()
        .shared();

        slot.inflight = Some((attempt, build.clone()));
        (attempt, build)
    }

    /// Publish the outcome of `attempt`. Only the first waiter to get here
    /// does anything; the rest find the slot already cleared.
    fn settle(&self, attempt: u64, outcome: &BuildOutcome) {
        let mut slot = self.lock_slot();
        match &slot.inflight {
            Some((current, _)) if *current == attempt => {}
            _ => return,
        }
        slot.inflight = None;

        match outcome {
            Ok(snapshot) => {
                slot.last_error = None;
                // Unset until now: only a settled build publishes, under the lock.
                let _ = self.ready.set(Arc::clone(snapshot));
                info!(
                    "Documentation index ready: {} sections, {} failures",
                    snapshot.roots.len(),
                    snapshot.failures.len()
                );
            }
            Err(e) => {
                warn!("Documentation index build #{attempt} failed: {e}");
                slot.last_error = Some(Arc::clone(e));
            }
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, LoadSlot> {
        lock(&self.slot)
    }
}

fn lock(slot: &Mutex<LoadSlot>) -> MutexGuard<'_, LoadSlot> {
    // The slot is consistent at every point a holder could panic
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    use chrono::Utc;

    use crate::frontmatter::DocMetadata;
    use crate::tree::{build, SourceRecord, TreeOptions};

    fn sample_snapshot() -> IndexSnapshot {
        let records = ["getting-started", "database/01-overview", "database/02-mongo"]
            .iter()
            .map(|path| SourceRecord {
                path: path.to_string(),
                metadata: DocMetadata::default(),
                rendered_content: format!("content of {path}"),
            })
            .collect();
        IndexSnapshot {
            roots: build(records, &TreeOptions::default()),
            failures: Vec::new(),
            drafts: 0,
            built_at: Utc::now(),
        }
    }

    /// Counts builds; optionally slow, optionally failing the first few.
    struct CountingLoader {
        calls: Arc<AtomicUsize>,
        delay: Duration,
        fail_first: usize,
    }

    impl CountingLoader {
        fn new(calls: &Arc<AtomicUsize>) -> Self {
            Self {
                calls: Arc::clone(calls),
                delay: Duration::ZERO,
                fail_first: 0,
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn failing(mut self, times: usize) -> Self {
            self.fail_first = times;
            self
        }
    }

    impl IndexLoader for CountingLoader {
        fn load(&self) -> Result<IndexSnapshot, QuireError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            if call < self.fail_first {
                Err(QuireError::Source("docs directory unreadable".into()))
            } else {
                Ok(sample_snapshot())
            }
        }
    }

    /// Blocks inside `load` until the test lets it go.
    struct GatedLoader {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl IndexLoader for GatedLoader {
        fn load(&self) -> Result<IndexSnapshot, QuireError> {
            let gate = self.gate.lock().unwrap();
            gate.recv().unwrap();
            Ok(sample_snapshot())
        }
    }

    /// Records how many loads overlap.
    struct OverlapLoader {
        calls: Arc<AtomicUsize>,
        active: AtomicUsize,
        peak: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl IndexLoader for OverlapLoader {
        fn load(&self) -> Result<IndexSnapshot, QuireError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(sample_snapshot())
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn sequential_calls_build_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let index = DocIndex::new(CountingLoader::new(&calls), TIMEOUT);
        assert_eq!(index.state(), IndexState::NotLoaded);

        let first = index.ensure_ready().await.unwrap();
        for _ in 0..5 {
            let again = index.ensure_ready().await.unwrap();
            assert!(Arc::ptr_eq(&first, &again));
            assert_eq!(first.roots, again.roots);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(index.build_attempts(), 1);
        assert_eq!(index.state(), IndexState::Ready);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_build() {
        let calls = Arc::new(AtomicUsize::new(0));
        let index = Arc::new(DocIndex::new(
            CountingLoader::new(&calls).slow(Duration::from_millis(200)),
            TIMEOUT,
        ));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let index = Arc::clone(&index);
                tokio::spawn(async move { index.ensure_ready().await })
            })
            .collect();

        let mut snapshots = Vec::new();
        for handle in handles {
            snapshots.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(snapshots.iter().all(|s| Arc::ptr_eq(s, &snapshots[0])));
        assert_eq!(index.state(), IndexState::Ready);
    }

    #[tokio::test]
    async fn concurrent_futures_on_one_task_share_one_build() {
        let calls = Arc::new(AtomicUsize::new(0));
        let index = DocIndex::new(
            CountingLoader::new(&calls).slow(Duration::from_millis(50)),
            TIMEOUT,
        );

        let results =
            futures::future::join_all((0..16).map(|_| index.ensure_ready())).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reports_loading_while_build_runs() {
        let (release, gate) = mpsc::channel();
        let index = Arc::new(DocIndex::new(
            GatedLoader {
                gate: Mutex::new(gate),
            },
            TIMEOUT,
        ));

        let waiter = {
            let index = Arc::clone(&index);
            tokio::spawn(async move { index.ensure_ready().await })
        };

        while index.state() != IndexState::Loading {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        release.send(()).unwrap();
        waiter.await.unwrap().unwrap();
        assert_eq!(index.state(), IndexState::Ready);
    }

    #[tokio::test]
    async fn failed_build_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let index = DocIndex::new(CountingLoader::new(&calls).failing(1), TIMEOUT);

        let err = index.ensure_ready().await.unwrap_err();
        match err {
            QuireError::Unavailable(inner) => {
                assert!(matches!(*inner, QuireError::Source(_)));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
        assert_eq!(index.state(), IndexState::Failed);
        assert!(index.last_error().is_some());

        let docs = index.documents().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(index.state(), IndexState::Ready);
        assert!(index.last_error().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failure_is_shared_by_all_waiters() {
        let calls = Arc::new(AtomicUsize::new(0));
        let index = Arc::new(DocIndex::new(
            CountingLoader::new(&calls)
                .slow(Duration::from_millis(100))
                .failing(usize::MAX),
            TIMEOUT,
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let index = Arc::clone(&index);
                tokio::spawn(async move { index.ensure_ready().await })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(matches!(result, Err(QuireError::Unavailable(_))));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(index.state(), IndexState::Failed);
    }

    #[tokio::test]
    async fn slow_build_times_out() {
        let calls = Arc::new(AtomicUsize::new(0));
        let index = DocIndex::new(
            CountingLoader::new(&calls).slow(Duration::from_millis(500)),
            Duration::from_millis(50),
        );

        let err = index.ensure_ready().await.unwrap_err();
        match err {
            QuireError::Unavailable(inner) => {
                assert!(matches!(*inner, QuireError::Timeout(_)));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
        assert_eq!(index.state(), IndexState::Failed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn retry_after_timeout_waits_for_running_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let index = DocIndex::new(
            OverlapLoader {
                calls: Arc::clone(&calls),
                active: AtomicUsize::new(0),
                peak: Arc::clone(&peak),
                delay: Duration::from_millis(300),
            },
            Duration::from_millis(100),
        );

        let err = index.ensure_ready().await.unwrap_err();
        assert!(
            matches!(&err, QuireError::Unavailable(inner) if matches!(**inner, QuireError::Timeout(_)))
        );

        let mut snapshot = None;
        for _ in 0..20 {
            if let Ok(ready) = index.ensure_ready().await {
                snapshot = Some(ready);
                break;
            }
        }

        assert!(snapshot.is_some());
        assert!(index.build_attempts() >= 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(index.state(), IndexState::Ready);
    }

    #[tokio::test]
    async fn empty_index_is_not_a_failure() {
        struct EmptyLoader;

        impl IndexLoader for EmptyLoader {
            fn load(&self) -> Result<IndexSnapshot, QuireError> {
                Ok(IndexSnapshot {
                    roots: Vec::new(),
                    failures: Vec::new(),
                    drafts: 0,
                    built_at: Utc::now(),
                })
            }
        }

        let index = DocIndex::new(EmptyLoader, TIMEOUT);
        let docs = index.documents().await.unwrap();
        assert!(docs.is_empty());
        assert_eq!(index.state(), IndexState::Ready);
    }
}
