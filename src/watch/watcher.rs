// src/watch/watcher.rs

use std::fmt;
use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::types::{ChangeEvent, ChangeKind};
use crate::watch::patterns::{normalize, PatternSet};

/// Source of filesystem change events.
///
/// `watch` arms the watcher for `patterns` and pushes every matching change
/// into `sink` until the returned [`Subscription`] is cancelled or dropped.
pub trait WatchService: Send {
    fn watch(
        &mut self,
        patterns: &[String],
        sink: mpsc::UnboundedSender<ChangeEvent>,
    ) -> Result<Subscription>;
}

/// Keeps a watch alive. Cancelling (or dropping) stops event delivery.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// [`WatchService`] backed by `notify`, watching `root` recursively.
///
/// Paths handed out are relative to `root`, `/`-separated.
#[derive(Debug, Clone)]
pub struct NotifyWatchService {
    root: PathBuf,
}

impl NotifyWatchService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Collapse a notify event kind into ours. Access and metadata-less events
/// are dropped.
fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        _ => None,
    }
}

fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let rel = normalize(&rel.to_string_lossy());
    (!rel.is_empty()).then_some(rel)
}

impl WatchService for NotifyWatchService {
    fn watch(
        &mut self,
        patterns: &[String],
        sink: mpsc::UnboundedSender<ChangeEvent>,
    ) -> Result<Subscription> {
        // Canonicalize once so we have a stable base path.
        let root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| self.root.clone());
        let set = PatternSet::new(patterns)?;

        let callback_root = root.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(err) => {
                        warn!("file watch error: {err}");
                        return;
                    }
                };

                let Some(kind) = change_kind(&event.kind) else {
                    return;
                };

                for path in &event.paths {
                    let Some(rel) = relative_to(&callback_root, path) else {
                        continue;
                    };
                    if !set.is_match(&rel) {
                        continue;
                    }
                    debug!(path = %rel, ?kind, "file change");
                    if sink.send(ChangeEvent::new(rel, kind)).is_err() {
                        debug!("change sink closed; dropping event");
                        return;
                    }
                }
            },
            Config::default(),
        )
        .map_err(anyhow::Error::from)?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(anyhow::Error::from)?;

        info!("file watcher started on {:?}", root);

        Ok(Subscription::new(move || {
            drop(watcher);
            debug!("file watcher stopped");
        }))
    }
}
