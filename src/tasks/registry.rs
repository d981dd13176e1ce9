// src/tasks/registry.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{config_error, AssetwatchError, Result};
use crate::tasks::BuildTask;
use crate::types::TaskId;
use crate::watch::patterns::PatternSet;

/// Association between a task and the path patterns that trigger it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRule {
    pub task: TaskId,
    pub patterns: Vec<String>,
}

impl WatchRule {
    pub fn new<I, S>(task: TaskId, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            task,
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }
}

struct RegisteredTask {
    runner: Arc<dyn BuildTask>,
    rules: Vec<PatternSet>,
}

/// Every build task and its compiled watch rules.
///
/// Filled once at startup; read-only afterwards, so it is shared as
/// `Arc<TaskRegistry>` between the router and the executor.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskId, RegisteredTask>,
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a runner and its watch rules.
    ///
    /// Fails on duplicate registration, on a rule naming another task, on a
    /// rule with no patterns, and on a pattern that does not compile.
    pub fn register(&mut self, runner: Arc<dyn BuildTask>, rules: Vec<WatchRule>) -> Result<()> {
        let id = runner.id();

        if self.tasks.contains_key(&id) {
            return Err(config_error(format!("task '{id}' registered twice")));
        }

        let mut compiled = Vec::with_capacity(rules.len());
        for rule in &rules {
            if rule.task != id {
                return Err(config_error(format!(
                    "watch rule for task '{}' passed while registering '{id}'",
                    rule.task
                )));
            }
            if rule.patterns.is_empty() {
                return Err(config_error(format!(
                    "watch rule for task '{id}' has no patterns"
                )));
            }
            compiled.push(PatternSet::new(&rule.patterns)?);
        }

        debug!(task = %id, rules = compiled.len(), "registered task");
        self.tasks.insert(
            id,
            RegisteredTask {
                runner,
                rules: compiled,
            },
        );
        Ok(())
    }

    /// Tasks with at least one rule matching `path`.
    pub fn tasks_for(&self, path: &str) -> BTreeSet<TaskId> {
        self.tasks
            .iter()
            .filter(|(_, t)| t.rules.iter().any(|rule| rule.is_match(path)))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn get(&self, task: TaskId) -> Result<Arc<dyn BuildTask>> {
        self.tasks
            .get(&task)
            .map(|t| Arc::clone(&t.runner))
            .ok_or(AssetwatchError::TaskNotFound(task))
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.tasks.contains_key(&task)
    }

    /// Registered task ids, in build order.
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.keys().copied().collect()
    }

    /// Patterns of every rule of `task`.
    pub fn patterns_for(&self, task: TaskId) -> Vec<String> {
        self.tasks
            .get(&task)
            .map(|t| {
                t.rules
                    .iter()
                    .flat_map(|r| r.patterns().iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Union of every registered pattern, deduplicated, in first-seen order.
    pub fn patterns(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for id in self.tasks.keys() {
            for pat in self.patterns_for(*id) {
                if seen.insert(pat.clone()) {
                    out.push(pat);
                }
            }
        }
        out
    }
}
