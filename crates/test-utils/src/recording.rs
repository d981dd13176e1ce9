use std::sync::{Arc, Mutex};

use assetwatch::engine::{BuildObserver, BuildReport};
use assetwatch::reload::{LiveReload, ReloadMessage};
use assetwatch::types::TaskId;

/// [`LiveReload`] that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingReload {
    messages: Arc<Mutex<Vec<ReloadMessage>>>,
}

impl RecordingReload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<ReloadMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn full_reloads(&self) -> usize {
        self.messages()
            .iter()
            .filter(|m| **m == ReloadMessage::Reload)
            .count()
    }
}

impl LiveReload for RecordingReload {
    fn reload(&self) {
        self.messages.lock().unwrap().push(ReloadMessage::Reload);
    }

    fn refresh(&self, pattern: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(ReloadMessage::Refresh(pattern.to_string()));
    }
}

/// [`BuildObserver`] that records every report.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    reports: Arc<Mutex<Vec<BuildReport>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<BuildReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<(TaskId, bool)> {
        self.reports()
            .into_iter()
            .filter_map(|r| match r {
                BuildReport::BuildFailed { task, initial, .. } => Some((task, initial)),
                _ => None,
            })
            .collect()
    }

    pub fn initial_build_finished(&self) -> Option<Vec<TaskId>> {
        self.reports().into_iter().find_map(|r| match r {
            BuildReport::InitialBuildFinished { failed } => Some(failed),
            _ => None,
        })
    }
}

impl BuildObserver for RecordingObserver {
    fn report(&mut self, report: &BuildReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}
