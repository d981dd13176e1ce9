// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::reload::ReloadNotifier;
use crate::types::TaskId;

use super::core::{CoordinatorCommand, CoordinatorStep, RebuildCoordinator};
use super::observer::BuildObserver;
use super::RuntimeEvent;

/// What the runtime loop leaves behind when it exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks whose initial build failed.
    pub initial_failures: Vec<TaskId>,
}

/// Drives the [`RebuildCoordinator`] in response to `RuntimeEvent`s, and
/// delegates task execution to an `ExecutorBackend`.
///
/// This is a pure IO shell: all scheduling semantics live in the coordinator.
/// Events are handled one at a time from a single loop, which is what makes
/// each task's state transitions atomic.
pub struct Runtime<E: ExecutorBackend> {
    core: RebuildCoordinator,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    notifier: ReloadNotifier,
    observer: Box<dyn BuildObserver>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: RebuildCoordinator,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        executor: E,
        notifier: ReloadNotifier,
        observer: Box<dyn BuildObserver>,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
            notifier,
            observer,
        }
    }

    /// Main event loop.
    ///
    /// - Starts the initial build.
    /// - Consumes `RuntimeEvent`s from `event_rx` and feeds them to the
    ///   coordinator.
    /// - Executes the commands it returns (spawn runs, reload, report).
    pub async fn run(mut self) -> Result<RunSummary> {
        info!("assetwatch runtime started");

        let step = self.core.start();
        let mut keep_running = self.apply(step).await?;

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            keep_running = self.apply(step).await?;

            if !keep_running {
                info!("coordinator requested exit; stopping runtime");
            }
        }

        info!("runtime exiting");
        Ok(RunSummary {
            initial_failures: self.core.initial_failures().to_vec(),
        })
    }

    async fn apply(&mut self, step: CoordinatorStep) -> Result<bool> {
        for command in step.commands {
            self.execute_command(command).await?;
        }
        Ok(step.keep_running)
    }

    /// Execute a single command from the coordinator.
    async fn execute_command(&mut self, command: CoordinatorCommand) -> Result<()> {
        match command {
            CoordinatorCommand::Execute(task) => {
                debug!(task = %task, "dispatching task run");
                self.executor.spawn_run(task).await?;
            }
            CoordinatorCommand::Reload(task) => {
                self.notifier.task_succeeded(task);
            }
            CoordinatorCommand::Report(report) => {
                self.observer.report(&report);
            }
        }
        Ok(())
    }
}
