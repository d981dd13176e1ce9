// src/exec/command.rs

//! External compiler commands.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::BuildError;
use crate::tasks::{BuildTask, RunFuture};
use crate::types::TaskId;

/// Number of trailing stderr lines kept for the failure message.
const STDERR_TAIL: usize = 8;

/// A task whose runner is a shell command, e.g. a script bundler or a style
/// preprocessor.
///
/// The command runs in the project root. A non-zero exit status is a
/// [`BuildError`] carrying the exit code and the last lines of stderr.
#[derive(Debug, Clone)]
pub struct CommandTask {
    id: TaskId,
    cmd: String,
    cwd: PathBuf,
}

impl CommandTask {
    pub fn new(id: TaskId, cmd: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            id,
            cmd: cmd.into(),
            cwd: cwd.into(),
        }
    }
}

impl BuildTask for CommandTask {
    fn id(&self) -> TaskId {
        self.id
    }

    fn run(&self) -> RunFuture<'_> {
        Box::pin(run_command(self))
    }
}

async fn run_command(task: &CommandTask) -> std::result::Result<(), BuildError> {
    info!(task = %task.id, cmd = %task.cmd, "starting task process");

    let (status, stderr_tail) = spawn_and_wait(task)
        .await
        .map_err(|err| BuildError::new(task.id, format!("{err:#}")))?;

    let code = status.code().unwrap_or(-1);
    info!(
        task = %task.id,
        exit_code = code,
        success = status.success(),
        "task process exited"
    );

    if status.success() {
        return Ok(());
    }

    let mut message = format!("`{}` exited with code {code}", task.cmd);
    if !stderr_tail.is_empty() {
        message.push_str(":\n");
        message.push_str(&stderr_tail.join("\n"));
    }
    Err(BuildError::new(task.id, message).with_exit_code(code))
}

async fn spawn_and_wait(task: &CommandTask) -> Result<(ExitStatus, Vec<String>)> {
    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&task.cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&task.cmd);
        c
    };

    cmd.current_dir(&task.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", task.id))?;

    let stdout = child.stdout.take().map(|s| tokio::spawn(drain_lines(task.id, "stdout", s)));
    let stderr = child.stderr.take().map(|s| tokio::spawn(drain_lines(task.id, "stderr", s)));

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{}'", task.id))?;

    if let Some(handle) = stdout {
        let _ = handle.await;
    }
    let stderr_lines = match stderr {
        Some(handle) => handle.await.unwrap_or_default(),
        None => Vec::new(),
    };

    let skip = stderr_lines.len().saturating_sub(STDERR_TAIL);
    Ok((status, stderr_lines.into_iter().skip(skip).collect()))
}

/// Log every line of a child stream at debug and return them.
async fn drain_lines<R>(task: TaskId, stream: &'static str, reader: R) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut seen = Vec::new();

    while let Ok(Some(line)) = lines.next_line().await {
        debug!(task = %task, stream, "{}", line);
        seen.push(line);
    }

    seen
}
