use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetwatch::errors::BuildError;
use assetwatch::tasks::{BuildTask, RunFuture};
use assetwatch::types::TaskId;
use tokio::sync::Semaphore;

/// One entry of a shared execution trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Started(TaskId),
    Finished(TaskId),
}

/// Trace shared between several fake tasks, so cross-task ordering is visible.
pub type Trace = Arc<Mutex<Vec<TraceEvent>>>;

pub fn new_trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

/// A scriptable [`BuildTask`].
///
/// - records `Started`/`Finished` into a shared [`Trace`]
/// - optionally fails its first N runs
/// - optionally blocks each run on a semaphore permit (`gated`), so a test
///   decides exactly when a run finishes
/// - tracks the peak number of concurrent runs
pub struct FakeTask {
    id: TaskId,
    trace: Trace,
    fail_first: usize,
    gate: Option<Arc<Semaphore>>,
    delay: Option<Duration>,
    runs: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTask {
    pub fn new(id: TaskId, trace: Trace) -> Self {
        Self {
            id,
            trace,
            fail_first: 0,
            gate: None,
            delay: None,
            runs: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Each run waits for one permit of `gate` before finishing.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Runs started so far.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, event: TraceEvent) {
        self.trace.lock().unwrap().push(event);
    }
}

impl BuildTask for FakeTask {
    fn id(&self) -> TaskId {
        self.id
    }

    fn run(&self) -> RunFuture<'_> {
        Box::pin(async move {
            let n = self.runs.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.record(TraceEvent::Started(self.id));

            if let Some(gate) = &self.gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.record(TraceEvent::Finished(self.id));

            if n < self.fail_first {
                Err(BuildError::new(self.id, format!("scripted failure #{}", n + 1)))
            } else {
                Ok(())
            }
        })
    }
}
