// src/engine/mod.rs

//! Rebuild orchestration engine for assetwatch.
//!
//! This module ties together:
//! - the per-task run state machine ([`state`])
//! - the rebuild coordinator that sequences the initial build and coalesces
//!   watch-triggered requests ([`core`])
//! - the async runtime loop that reacts to:
//!   - run requests from the change router
//!   - task completion events from the executor
//!   - shutdown signals
//!
//! The coordinator is a pure, synchronous state machine; all IO happens in
//! [`runtime`]. Because the runtime feeds it from a single loop, every
//! transition of a task is atomic with respect to requests and completions of
//! that same task, and no lock is held across tasks.

use crate::errors::BuildError;
use crate::types::TaskId;

/// Outcome of a single task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(BuildError),
}

impl From<std::result::Result<(), BuildError>> for TaskOutcome {
    fn from(res: std::result::Result<(), BuildError>) -> Self {
        match res {
            Ok(()) => TaskOutcome::Success,
            Err(err) => TaskOutcome::Failed(err),
        }
    }
}

/// Why a run was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Requested explicitly (API call or test).
    Manual,
    /// A watched file changed.
    FileWatch,
}

/// Runtime options used by both the coordinator and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit once the initial build is done and every task is idle
    /// (used for `--once`). The watcher is not armed in this mode.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the router, executors, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task should run.
    RunRequested { task: TaskId, reason: TriggerReason },
    /// A task run finished.
    RunCompleted { task: TaskId, outcome: TaskOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod observer;
pub mod runtime;
pub mod state;

pub use self::core::{BuildReport, CoordinatorCommand, CoordinatorStep, Phase, RebuildCoordinator};
pub use observer::{BuildObserver, TracingObserver};
pub use runtime::{RunSummary, Runtime};
pub use state::{TaskRunState, TaskState};
