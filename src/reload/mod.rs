// src/reload/mod.rs

//! Browser refresh notifications.
//!
//! After a task completes successfully (or a view template changes), the
//! orchestrator asks a [`LiveReload`] service to refresh connected clients.
//! The transport itself (websocket, SSE, an external dev server) lives
//! behind the trait; this module only decides *what kind* of refresh to ask
//! for.

pub mod broadcast;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::types::{ReloadKind, TaskId};

pub use broadcast::{BroadcastReload, LogReload, ReloadMessage};

/// Live-reload service the notifier talks to.
///
/// Calls are fire-and-forget: having no connected clients is not an error,
/// so nothing is returned.
pub trait LiveReload: Send + Sync {
    /// Reload every connected page.
    fn reload(&self);

    /// Refresh assets matching `pattern` in place.
    fn refresh(&self, pattern: &str);
}

/// Which refresh each task's successful completion requests.
///
/// Tasks without an explicit entry request a full reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadPolicy {
    kinds: BTreeMap<TaskId, ReloadKind>,
}

impl ReloadPolicy {
    pub fn set(&mut self, task: TaskId, kind: ReloadKind) {
        self.kinds.insert(task, kind);
    }

    pub fn with(mut self, task: TaskId, kind: ReloadKind) -> Self {
        self.set(task, kind);
        self
    }

    pub fn kind_for(&self, task: TaskId) -> ReloadKind {
        self.kinds
            .get(&task)
            .cloned()
            .unwrap_or(ReloadKind::FullReload)
    }
}

/// Translates completions and view changes into [`LiveReload`] calls.
#[derive(Clone)]
pub struct ReloadNotifier {
    service: Arc<dyn LiveReload>,
    policy: ReloadPolicy,
}

impl std::fmt::Debug for ReloadNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadNotifier")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ReloadNotifier {
    pub fn new(service: Arc<dyn LiveReload>, policy: ReloadPolicy) -> Self {
        Self { service, policy }
    }

    pub fn policy(&self) -> &ReloadPolicy {
        &self.policy
    }

    /// Forward a refresh request. `task` is only used for logging; view
    /// changes pass `None`.
    pub fn notify(&self, kind: &ReloadKind, task: Option<TaskId>) {
        match kind {
            ReloadKind::FullReload => {
                debug!(task = ?task, "requesting full reload");
                self.service.reload();
            }
            ReloadKind::AssetRefresh(pattern) => {
                debug!(task = ?task, %pattern, "requesting asset refresh");
                self.service.refresh(pattern);
            }
        }
    }

    /// Notify for a successful run of `task`, using the configured policy.
    pub fn task_succeeded(&self, task: TaskId) {
        let kind = self.policy.kind_for(task);
        self.notify(&kind, Some(task));
    }

    /// A view template changed; reload the page.
    pub fn view_changed(&self, path: &str) {
        debug!(%path, "view changed");
        self.notify(&ReloadKind::FullReload, None);
    }
}
