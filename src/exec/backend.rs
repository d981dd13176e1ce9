// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of spawning runners
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation in [`RegistryExecutor`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::Result;
use crate::tasks::TaskRegistry;
use crate::types::TaskId;

/// Trait abstracting how a task run is started.
///
/// `spawn_run` must not wait for the run to finish: it starts the run and
/// returns, and the completion later arrives as
/// [`RuntimeEvent::RunCompleted`].
pub trait ExecutorBackend: Send {
    fn spawn_run(
        &mut self,
        task: TaskId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production backend: looks the runner up in the registry and runs it on
/// its own Tokio task.
pub struct RegistryExecutor {
    registry: Arc<TaskRegistry>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl RegistryExecutor {
    pub fn new(registry: Arc<TaskRegistry>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            registry,
            runtime_tx,
        }
    }
}

impl ExecutorBackend for RegistryExecutor {
    fn spawn_run(
        &mut self,
        task: TaskId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let runner = self.registry.get(task);
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            let runner = runner?;

            tokio::spawn(async move {
                let outcome = TaskOutcome::from(runner.run().await);
                debug!(task = %task, ?outcome, "task run finished");

                if tx
                    .send(RuntimeEvent::RunCompleted { task, outcome })
                    .await
                    .is_err()
                {
                    warn!(task = %task, "runtime gone; dropping completion");
                }
            });

            Ok(())
        })
    }
}
