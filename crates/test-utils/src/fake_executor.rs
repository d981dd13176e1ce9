use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use assetwatch::engine::{RuntimeEvent, TaskOutcome};
use assetwatch::errors::{BuildError, Result};
use assetwatch::exec::ExecutorBackend;
use assetwatch::types::TaskId;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which tasks were "run"
/// - immediately reports `RunCompleted` for each, with a scripted outcome
///   (success unless [`FakeExecutor::fail_next`] queued a failure).
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<TaskId>>>,
    failures: HashMap<TaskId, VecDeque<String>>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, executed: Arc<Mutex<Vec<TaskId>>>) -> Self {
        Self {
            runtime_tx,
            executed,
            failures: HashMap::new(),
        }
    }

    /// The next run of `task` fails with `message`.
    pub fn fail_next(mut self, task: TaskId, message: &str) -> Self {
        self.failures
            .entry(task)
            .or_default()
            .push_back(message.to_string());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_run(
        &mut self,
        task: TaskId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let outcome = match self.failures.get_mut(&task).and_then(VecDeque::pop_front) {
            Some(message) => TaskOutcome::Failed(BuildError::new(task, message)),
            None => TaskOutcome::Success,
        };

        Box::pin(async move {
            executed.lock().unwrap().push(task);

            tx.send(RuntimeEvent::RunCompleted { task, outcome })
                .await
                .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }
}
