// src/engine/core.rs

//! Pure rebuild coordinator.
//!
//! This module contains a synchronous, deterministic state machine that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated per-task run state
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - handing `Execute` commands to the executor backend
//! - forwarding reloads and reports to the notifier and observer
//!
//! The coordinator has no channels, no Tokio types, and performs no IO, so it
//! is unit tested directly.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::engine::state::{CompletionOutcome, RequestOutcome, TaskRunState, TaskState};
use crate::engine::{RuntimeEvent, RuntimeOptions, TaskOutcome, TriggerReason};
use crate::errors::BuildError;
use crate::types::TaskId;

/// Lifecycle phase of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started yet.
    Created,
    /// Running every task once, in order. `cursor` indexes the task
    /// currently building.
    InitialBuild { cursor: usize },
    /// Accepting watch-triggered runs.
    Watching,
    /// Shutdown requested; waiting for in-flight runs to finish.
    Draining,
}

/// Something worth telling the observer about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildReport {
    StateChanged {
        task: TaskId,
        state: TaskRunState,
    },
    BuildSucceeded {
        task: TaskId,
        initial: bool,
    },
    BuildFailed {
        task: TaskId,
        error: BuildError,
        initial: bool,
    },
    /// The initial pass is over; `failed` lists tasks with no first output.
    InitialBuildFinished {
        failed: Vec<TaskId>,
    },
}

/// Command produced by the coordinator, executed by the IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorCommand {
    /// Start one execution of this task's runner.
    Execute(TaskId),
    /// The task's output changed; ask the notifier to refresh browsers.
    Reload(TaskId),
    /// Forward to the observer.
    Report(BuildReport),
}

/// Result of handling a single event.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorStep {
    pub commands: Vec<CoordinatorCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoordinatorStep {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }

    fn execute(&mut self, task: TaskId) {
        self.commands.push(CoordinatorCommand::Execute(task));
    }

    fn report(&mut self, report: BuildReport) {
        self.commands.push(CoordinatorCommand::Report(report));
    }

    fn state_changed(&mut self, task: TaskId, state: TaskRunState) {
        self.report(BuildReport::StateChanged { task, state });
    }

    /// Tasks the shell must execute, in order.
    pub fn executions(&self) -> Vec<TaskId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                CoordinatorCommand::Execute(t) => Some(*t),
                _ => None,
            })
            .collect()
    }
}

/// Owns the run state of every registered task.
///
/// Guarantees:
/// - at most one in-flight execution per task;
/// - requests while a task runs collapse into exactly one follow-up run;
/// - every registered task runs once, in build order, before any
///   watch-triggered run starts; requests during that pass are queued.
#[derive(Debug)]
pub struct RebuildCoordinator {
    order: Vec<TaskId>,
    states: BTreeMap<TaskId, TaskState>,
    phase: Phase,
    /// Requests received during the initial build, replayed afterwards.
    queued: BTreeSet<TaskId>,
    initial_failures: Vec<TaskId>,
    options: RuntimeOptions,
}

impl RebuildCoordinator {
    /// `tasks` are the registered tasks; they are built initially in
    /// [`TaskId::BUILD_ORDER`] regardless of the order given here.
    pub fn new(tasks: impl IntoIterator<Item = TaskId>, options: RuntimeOptions) -> Self {
        let states: BTreeMap<TaskId, TaskState> =
            tasks.into_iter().map(|t| (t, TaskState::new())).collect();
        let order = TaskId::BUILD_ORDER
            .iter()
            .copied()
            .filter(|t| states.contains_key(t))
            .collect();

        Self {
            order,
            states,
            phase: Phase::Created,
            queued: BTreeSet::new(),
            initial_failures: Vec::new(),
            options,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state_of(&self, task: TaskId) -> Option<TaskRunState> {
        self.states.get(&task).map(TaskState::state)
    }

    /// Executions started for `task` so far (initial run included).
    pub fn runs_started(&self, task: TaskId) -> u64 {
        self.states.get(&task).map_or(0, TaskState::runs_started)
    }

    pub fn initial_failures(&self) -> &[TaskId] {
        &self.initial_failures
    }

    pub fn queued(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.queued.iter().copied()
    }

    /// Whether no task is running or owed a follow-up.
    pub fn is_idle(&self) -> bool {
        self.states.values().all(|s| !s.is_running())
    }

    /// Begin the initial full build.
    pub fn start(&mut self) -> CoordinatorStep {
        let mut step = CoordinatorStep::new();

        if self.phase != Phase::Created {
            warn!(phase = ?self.phase, "coordinator already started");
            return step;
        }

        info!(order = ?self.order, "starting initial build");
        self.phase = Phase::InitialBuild { cursor: 0 };
        self.begin_initial(0, &mut step);
        self.finish_step(&mut step);
        step
    }

    /// Handle a single runtime event.
    pub fn step(&mut self, event: RuntimeEvent) -> CoordinatorStep {
        let mut step = CoordinatorStep::new();

        match event {
            RuntimeEvent::RunRequested { task, reason } => {
                self.handle_request(task, reason, &mut step);
            }
            RuntimeEvent::RunCompleted { task, outcome } => {
                self.handle_completion(task, outcome, &mut step);
            }
            RuntimeEvent::ShutdownRequested => {
                self.handle_shutdown(&mut step);
            }
        }

        self.finish_step(&mut step);
        step
    }

    /// Request a run of `task` (watch phase semantics).
    pub fn request_run(&mut self, task: TaskId) -> CoordinatorStep {
        self.step(RuntimeEvent::RunRequested {
            task,
            reason: TriggerReason::Manual,
        })
    }

    fn handle_request(&mut self, task: TaskId, reason: TriggerReason, step: &mut CoordinatorStep) {
        if !self.states.contains_key(&task) {
            warn!(task = %task, "run requested for unregistered task; ignoring");
            return;
        }

        match self.phase {
            Phase::Created | Phase::InitialBuild { .. } => {
                if self.queued.insert(task) {
                    debug!(task = %task, ?reason, "initial build in progress; request queued");
                }
            }
            Phase::Draining => {
                debug!(task = %task, "shutting down; ignoring run request");
            }
            Phase::Watching => self.apply_request(task, step),
        }
    }

    fn apply_request(&mut self, task: TaskId, step: &mut CoordinatorStep) {
        let Some(state) = self.states.get_mut(&task) else {
            return;
        };

        match state.request() {
            RequestOutcome::Start => {
                debug!(task = %task, "task idle; starting run");
                step.state_changed(task, TaskRunState::Running);
                step.execute(task);
            }
            RequestOutcome::Coalesced => {
                debug!(task = %task, "task running; follow-up run owed");
                step.state_changed(task, TaskRunState::Pending);
            }
            RequestOutcome::AlreadyPending => {
                debug!(task = %task, "follow-up already owed; request coalesced");
            }
        }
    }

    fn handle_completion(&mut self, task: TaskId, outcome: TaskOutcome, step: &mut CoordinatorStep) {
        let initial = matches!(
            self.phase,
            Phase::InitialBuild { cursor } if self.order.get(cursor) == Some(&task)
        );

        let Some(state) = self.states.get_mut(&task) else {
            warn!(task = %task, "completion for unregistered task; ignoring");
            return;
        };

        let transition = state.complete();
        if transition == CompletionOutcome::NotRunning {
            warn!(task = %task, "completion for a task that is not running; ignoring");
            return;
        }

        match outcome {
            TaskOutcome::Success => {
                info!(task = %task, initial, "build succeeded");
                if !initial && self.phase != Phase::Draining {
                    step.commands.push(CoordinatorCommand::Reload(task));
                }
                step.report(BuildReport::BuildSucceeded { task, initial });
            }
            TaskOutcome::Failed(error) => {
                if initial {
                    self.initial_failures.push(task);
                }
                step.report(BuildReport::BuildFailed {
                    task,
                    error,
                    initial,
                });
            }
        }

        match transition {
            CompletionOutcome::Rerun => {
                debug!(task = %task, "running owed follow-up");
                step.state_changed(task, TaskRunState::Running);
                step.execute(task);
            }
            _ => step.state_changed(task, TaskRunState::Idle),
        }

        if initial {
            if let Phase::InitialBuild { cursor } = self.phase {
                self.begin_initial(cursor + 1, step);
            }
        }
    }

    /// Start the initial run at `cursor`, or leave the initial phase when
    /// every task has had its turn.
    fn begin_initial(&mut self, cursor: usize, step: &mut CoordinatorStep) {
        let Some(&task) = self.order.get(cursor) else {
            self.finish_initial(step);
            return;
        };

        self.phase = Phase::InitialBuild { cursor };
        if let Some(state) = self.states.get_mut(&task) {
            state.request();
        }
        debug!(task = %task, "initial build of task");
        step.state_changed(task, TaskRunState::Running);
        step.execute(task);
    }

    fn finish_initial(&mut self, step: &mut CoordinatorStep) {
        self.phase = Phase::Watching;

        if self.initial_failures.is_empty() {
            info!("initial build complete");
        } else {
            warn!(failed = ?self.initial_failures, "initial build complete with failures");
        }
        step.report(BuildReport::InitialBuildFinished {
            failed: self.initial_failures.clone(),
        });

        let queued = std::mem::take(&mut self.queued);
        for task in queued {
            debug!(task = %task, "replaying request queued during initial build");
            self.apply_request(task, step);
        }
    }

    fn handle_shutdown(&mut self, step: &mut CoordinatorStep) {
        info!("shutdown requested; letting in-flight runs finish");
        self.phase = Phase::Draining;
        self.queued.clear();

        for (task, state) in self.states.iter_mut() {
            if state.drop_pending() {
                debug!(task = %task, "dropping owed follow-up run");
                step.state_changed(*task, TaskRunState::Running);
            }
        }
    }

    fn finish_step(&self, step: &mut CoordinatorStep) {
        let stop = match self.phase {
            Phase::Draining => self.is_idle(),
            Phase::Watching => self.options.exit_when_idle && self.is_idle(),
            Phase::Created | Phase::InitialBuild { .. } => false,
        };
        if stop {
            step.keep_running = false;
        }
    }
}
