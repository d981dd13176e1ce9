// src/watch/router.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::errors::Result;
use crate::tasks::TaskRegistry;
use crate::types::{ChangeEvent, TaskId};
use crate::watch::patterns::PatternSet;

/// Maps change events to the tasks that must run.
///
/// Routing looks at the path only: the kind of change (including deletion)
/// and the file contents never matter. Each task appears at most once per
/// event even when several of its patterns match.
#[derive(Debug, Clone)]
pub struct ChangeRouter {
    registry: Arc<TaskRegistry>,
    views: PatternSet,
}

impl ChangeRouter {
    /// `view_patterns` are templates whose changes reload the page without
    /// running a task. They are compiled here, so a bad glob fails at startup.
    pub fn new(registry: Arc<TaskRegistry>, view_patterns: &[String]) -> Result<Self> {
        Ok(Self {
            registry,
            views: PatternSet::new(view_patterns)?,
        })
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn route(&self, event: &ChangeEvent) -> BTreeSet<TaskId> {
        self.registry.tasks_for(&event.path)
    }

    pub fn is_view_change(&self, path: &str) -> bool {
        !self.views.is_empty() && self.views.is_match(path)
    }

    /// Every pattern the watcher must observe: task rules plus views.
    pub fn watch_patterns(&self) -> Vec<String> {
        let mut patterns = self.registry.patterns();
        for view in self.views.patterns() {
            if !patterns.contains(view) {
                patterns.push(view.clone());
            }
        }
        patterns
    }
}
