// src/engine/observer.rs

use tracing::{debug, error, info, warn};

use super::core::BuildReport;

/// Receives every [`BuildReport`] the coordinator produces.
///
/// Build failures reach the developer through this channel; without it a
/// failed rebuild would just look like "no reload happened".
pub trait BuildObserver: Send {
    fn report(&mut self, report: &BuildReport);
}

/// Default observer: writes reports to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BuildObserver for TracingObserver {
    fn report(&mut self, report: &BuildReport) {
        match report {
            BuildReport::StateChanged { task, state } => {
                debug!(task = %task, ?state, "task state changed");
            }
            BuildReport::BuildSucceeded { task, initial } => {
                debug!(task = %task, initial, "task output updated");
            }
            BuildReport::BuildFailed {
                task,
                error,
                initial: true,
            } => {
                error!(
                    task = %task,
                    error = %error,
                    "INITIAL BUILD FAILED: '{task}' has produced no output; pages depending on it will be broken until its next successful run"
                );
            }
            BuildReport::BuildFailed {
                task,
                error,
                initial: false,
            } => {
                warn!(
                    task = %task,
                    error = %error,
                    "rebuild failed; previous output left in place"
                );
            }
            BuildReport::InitialBuildFinished { failed } if failed.is_empty() => {
                info!("initial build finished; watching for changes");
            }
            BuildReport::InitialBuildFinished { failed } => {
                error!(?failed, "initial build finished with failed tasks; watching for changes");
            }
        }
    }
}
