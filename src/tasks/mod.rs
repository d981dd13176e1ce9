// src/tasks/mod.rs

//! Build tasks and their registry.
//!
//! - [`registry`] holds every task together with the watch rules that
//!   trigger it.
//! - [`concat`] and [`sprite`] are the built-in runners for `concats` and
//!   `svgs`; `scripts` and `styles` always delegate to an external command
//!   (see [`crate::exec::command`]).

pub mod concat;
pub mod registry;
pub mod sprite;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::model::{ConfigFile, RunnerSpec};
use crate::errors::{BuildError, Result};
use crate::exec::command::CommandTask;
use crate::fs::FileSystem;
use crate::types::TaskId;

pub use concat::ConcatTask;
pub use registry::{TaskRegistry, WatchRule};
pub use sprite::SpriteTask;

/// Future returned by [`BuildTask::run`].
pub type RunFuture<'a> = Pin<Box<dyn Future<Output = std::result::Result<(), BuildError>> + Send + 'a>>;

/// A named, idempotent build operation.
///
/// Running a task twice on unchanged input must leave its output unchanged.
pub trait BuildTask: Send + Sync {
    fn id(&self) -> TaskId;

    fn run(&self) -> RunFuture<'_>;
}

/// Build the registry for a validated config.
///
/// Paths in the config are relative to `root`.
pub fn build_registry(cfg: &ConfigFile, root: &Path, fs: Arc<dyn FileSystem>) -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();

    for spec in &cfg.tasks {
        let runner: Arc<dyn BuildTask> = match &spec.runner {
            RunnerSpec::Command(cmd) => Arc::new(CommandTask::new(spec.id, cmd.clone(), root)),
            RunnerSpec::Concat(entries) => {
                Arc::new(ConcatTask::new(root, entries.clone(), Arc::clone(&fs)))
            }
            RunnerSpec::Sprite { src_dir, outfile } => Arc::new(SpriteTask::new(
                root,
                src_dir.clone(),
                outfile.clone(),
                Arc::clone(&fs),
            )),
        };

        registry.register(runner, vec![WatchRule::new(spec.id, spec.watch.clone())])?;
    }

    Ok(registry)
}

/// Run blocking filesystem work for a task off the async threads.
pub(crate) async fn run_blocking<F>(task: TaskId, work: F) -> std::result::Result<(), BuildError>
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(BuildError::new(task, format!("{err:#}"))),
        Err(join_err) => Err(BuildError::new(task, format!("runner panicked: {join_err}"))),
    }
}
