// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::TaskId;

#[derive(Error, Debug)]
pub enum AssetwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A task runner failed.
///
/// Build errors are recovered by the coordinator: they are reported and the
/// task goes back to idle, so the next change is still honoured.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("task '{task}' failed: {message}")]
pub struct BuildError {
    pub task: TaskId,
    pub message: String,
    /// Exit code of the underlying process, when the runner was a command.
    pub exit_code: Option<i32>,
}

impl BuildError {
    pub fn new(task: TaskId, message: impl Into<String>) -> Self {
        Self {
            task,
            message: message.into(),
            exit_code: None,
        }
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }
}

pub type Result<T> = std::result::Result<T, AssetwatchError>;

/// Shorthand for building a [`AssetwatchError::ConfigError`].
pub fn config_error(msg: impl Into<String>) -> AssetwatchError {
    AssetwatchError::ConfigError(msg.into())
}
