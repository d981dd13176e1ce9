// src/engine/state.rs

//! Per-task run state.
//!
//! ```text
//! Idle --request--> Running --complete--> Idle
//!                     |  ^
//!             request |  | complete (re-run once)
//!                     v  |
//!                   Pending --request--> Pending
//! ```
//!
//! `Pending` means "running, and one more run is owed". Any number of
//! requests while running collapse into that single flag.

/// Public view of a task's run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    Idle,
    Running,
    Pending,
}

/// What a run request did to the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Task was idle; a run must start now.
    Start,
    /// Task was running; a follow-up run is now owed.
    Coalesced,
    /// A follow-up was already owed; nothing changes.
    AlreadyPending,
}

/// What a run completion did to the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// No follow-up owed; task is idle.
    Idle,
    /// A follow-up was owed; the task must run again now.
    Rerun,
    /// Completion for a task that was not running (ignored).
    NotRunning,
}

/// State machine for a single task.
#[derive(Debug, Clone)]
pub struct TaskState {
    state: TaskRunState,
    runs_started: u64,
}

impl Default for TaskState {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskState {
    pub fn new() -> Self {
        Self {
            state: TaskRunState::Idle,
            runs_started: 0,
        }
    }

    pub fn state(&self) -> TaskRunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, TaskRunState::Idle)
    }

    /// Number of executions started since construction.
    pub fn runs_started(&self) -> u64 {
        self.runs_started
    }

    pub fn request(&mut self) -> RequestOutcome {
        match self.state {
            TaskRunState::Idle => {
                self.state = TaskRunState::Running;
                self.runs_started += 1;
                RequestOutcome::Start
            }
            TaskRunState::Running => {
                self.state = TaskRunState::Pending;
                RequestOutcome::Coalesced
            }
            TaskRunState::Pending => RequestOutcome::AlreadyPending,
        }
    }

    pub fn complete(&mut self) -> CompletionOutcome {
        match self.state {
            TaskRunState::Idle => CompletionOutcome::NotRunning,
            TaskRunState::Running => {
                self.state = TaskRunState::Idle;
                CompletionOutcome::Idle
            }
            TaskRunState::Pending => {
                // Cleared and immediately re-entered in one transition.
                self.state = TaskRunState::Running;
                self.runs_started += 1;
                CompletionOutcome::Rerun
            }
        }
    }

    /// Forget an owed follow-up; the in-flight run is left alone.
    pub fn drop_pending(&mut self) -> bool {
        if self.state == TaskRunState::Pending {
            self.state = TaskRunState::Running;
            true
        } else {
            false
        }
    }
}
