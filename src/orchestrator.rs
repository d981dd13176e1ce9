// src/orchestrator.rs

//! Explicit top-level instance wiring router, coordinator runtime, executor
//! and notifier together.
//!
//! Nothing here is global: every piece of state belongs to an
//! [`Orchestrator`] and lives as long as the handle returned by
//! [`Orchestrator::start`].

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::{
    BuildObserver, RebuildCoordinator, RunSummary, Runtime, RuntimeEvent, RuntimeOptions,
    TracingObserver, TriggerReason,
};
use crate::errors::{AssetwatchError, Result};
use crate::exec::RegistryExecutor;
use crate::reload::ReloadNotifier;
use crate::tasks::TaskRegistry;
use crate::types::{ChangeEvent, TaskId};
use crate::watch::{ChangeRouter, Subscription, WatchService};

const RUNTIME_CHANNEL_CAPACITY: usize = 64;

/// Owns everything needed to run the watch → build → reload pipeline.
pub struct Orchestrator<W: WatchService> {
    router: ChangeRouter,
    watch_service: W,
    notifier: ReloadNotifier,
    options: RuntimeOptions,
    observer: Box<dyn BuildObserver>,
}

impl<W: WatchService> fmt::Debug for Orchestrator<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("router", &self.router)
            .field("notifier", &self.notifier)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<W: WatchService> Orchestrator<W> {
    /// Fails if a view pattern does not compile.
    pub fn new(
        registry: Arc<TaskRegistry>,
        view_patterns: &[String],
        watch_service: W,
        notifier: ReloadNotifier,
    ) -> Result<Self> {
        Ok(Self {
            router: ChangeRouter::new(registry, view_patterns)?,
            watch_service,
            notifier,
            options: RuntimeOptions::default(),
            observer: Box::new(TracingObserver),
        })
    }

    pub fn with_options(mut self, options: RuntimeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_observer(mut self, observer: impl BuildObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn router(&self) -> &ChangeRouter {
        &self.router
    }

    /// Spawn the runtime loop (which runs the initial build) and, unless in
    /// run-once mode, arm the watcher.
    ///
    /// The watcher is armed right away; changes seen before the initial build
    /// finishes are queued by the coordinator and replayed afterwards.
    pub fn start(mut self) -> Result<OrchestratorHandle> {
        let registry = Arc::clone(self.router.registry());
        let (runtime_tx, runtime_rx) = mpsc::channel(RUNTIME_CHANNEL_CAPACITY);

        // Arm first so a watch failure aborts before anything runs.
        let watch = if self.options.exit_when_idle {
            debug!("run-once mode; watcher not armed");
            None
        } else {
            let patterns = self.router.watch_patterns();
            info!(patterns = ?patterns, "arming watcher");
            let (change_tx, change_rx) = mpsc::unbounded_channel::<ChangeEvent>();
            let subscription = self.watch_service.watch(&patterns, change_tx)?;
            Some((subscription, change_rx))
        };

        let executor = RegistryExecutor::new(Arc::clone(&registry), runtime_tx.clone());
        let core = RebuildCoordinator::new(registry.task_ids(), self.options);
        let runtime = Runtime::new(
            core,
            runtime_rx,
            executor,
            self.notifier.clone(),
            self.observer,
        );
        let runtime_task = tokio::spawn(runtime.run());

        let (subscription, router_task) = match watch {
            Some((subscription, mut change_rx)) => {
                let router = self.router.clone();
                let notifier = self.notifier.clone();
                let tx = runtime_tx.clone();
                let router_task = tokio::spawn(async move {
                    while let Some(event) = change_rx.recv().await {
                        if !dispatch_change(&router, &notifier, &tx, &event).await {
                            break;
                        }
                    }
                    debug!("change router loop finished");
                });
                (Some(subscription), Some(router_task))
            }
            None => (None, None),
        };

        Ok(OrchestratorHandle {
            runtime_tx,
            runtime_task,
            router_task,
            subscription,
        })
    }
}

/// Route one change. Returns `false` once the runtime is gone.
async fn dispatch_change(
    router: &ChangeRouter,
    notifier: &ReloadNotifier,
    tx: &mpsc::Sender<RuntimeEvent>,
    event: &ChangeEvent,
) -> bool {
    if router.is_view_change(&event.path) {
        notifier.view_changed(&event.path);
    }

    let tasks = router.route(event);
    if tasks.is_empty() {
        debug!(path = %event.path, kind = ?event.kind, "change matched no task");
        return true;
    }

    for task in tasks {
        debug!(task = %task, path = %event.path, "change routed to task");
        let request = RuntimeEvent::RunRequested {
            task,
            reason: TriggerReason::FileWatch,
        };
        if tx.send(request).await.is_err() {
            return false;
        }
    }
    true
}

/// Handle on a started [`Orchestrator`].
pub struct OrchestratorHandle {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    runtime_task: JoinHandle<Result<RunSummary>>,
    router_task: Option<JoinHandle<()>>,
    subscription: Option<Subscription>,
}

impl fmt::Debug for OrchestratorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorHandle")
            .field("watching", &self.subscription.is_some())
            .finish_non_exhaustive()
    }
}

impl OrchestratorHandle {
    /// Ask for a graceful shutdown: in-flight runs finish, owed follow-ups
    /// are dropped.
    pub async fn stop(&self) {
        if self
            .runtime_tx
            .send(RuntimeEvent::ShutdownRequested)
            .await
            .is_err()
        {
            debug!("runtime already exited");
        }
    }

    /// Request a run of `task` as if one of its watched files changed.
    pub async fn request_run(&self, task: TaskId) -> Result<()> {
        self.runtime_tx
            .send(RuntimeEvent::RunRequested {
                task,
                reason: TriggerReason::Manual,
            })
            .await
            .map_err(|_| AssetwatchError::Other(anyhow::anyhow!("runtime is not running")))
    }

    /// Sender for wiring external shutdown sources (e.g. Ctrl-C).
    pub fn shutdown_sender(&self) -> mpsc::Sender<RuntimeEvent> {
        self.runtime_tx.clone()
    }

    /// Wait for the runtime loop to exit, then stop watching.
    pub async fn wait(mut self) -> Result<RunSummary> {
        let result = (&mut self.runtime_task).await;

        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        if let Some(router_task) = self.router_task.take() {
            router_task.abort();
        }

        match result {
            Ok(summary) => summary,
            Err(join_err) => {
                warn!("runtime task failed: {join_err}");
                Err(AssetwatchError::Other(anyhow::Error::from(join_err)))
            }
        }
    }
}
