use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use assetwatch::errors::Result;
use assetwatch::types::ChangeEvent;
use assetwatch::watch::{Subscription, WatchService};
use tokio::sync::mpsc;

/// Test-side handle of a [`ManualWatchService`]: emits events by hand.
#[derive(Clone, Default)]
pub struct ManualWatch {
    sink: Arc<Mutex<Option<mpsc::UnboundedSender<ChangeEvent>>>>,
    patterns: Arc<Mutex<Vec<String>>>,
    cancelled: Arc<AtomicBool>,
}

impl ManualWatch {
    /// Deliver `event` as if the filesystem reported it. Returns `false`
    /// when not subscribed (never armed, or cancelled).
    pub fn emit(&self, event: ChangeEvent) -> bool {
        match self.sink.lock().unwrap().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    pub fn modify(&self, path: &str) -> bool {
        self.emit(ChangeEvent::modified(path))
    }

    pub fn is_armed(&self) -> bool {
        self.sink.lock().unwrap().is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Patterns the service was armed with.
    pub fn patterns(&self) -> Vec<String> {
        self.patterns.lock().unwrap().clone()
    }
}

/// [`WatchService`] driven entirely by the test.
pub struct ManualWatchService {
    handle: ManualWatch,
    on_subscribe: Vec<ChangeEvent>,
}

impl ManualWatchService {
    pub fn new() -> (Self, ManualWatch) {
        let handle = ManualWatch::default();
        (
            Self {
                handle: handle.clone(),
                on_subscribe: Vec::new(),
            },
            handle,
        )
    }

    /// Deliver `events` synchronously inside `watch`, i.e. before the
    /// caller has even seen the subscription.
    pub fn firing_on_subscribe(mut self, events: Vec<ChangeEvent>) -> Self {
        self.on_subscribe = events;
        self
    }
}

impl WatchService for ManualWatchService {
    fn watch(
        &mut self,
        patterns: &[String],
        sink: mpsc::UnboundedSender<ChangeEvent>,
    ) -> Result<Subscription> {
        *self.handle.patterns.lock().unwrap() = patterns.to_vec();

        for event in self.on_subscribe.drain(..) {
            let _ = sink.send(event);
        }
        *self.handle.sink.lock().unwrap() = Some(sink);

        let handle = self.handle.clone();
        Ok(Subscription::new(move || {
            handle.cancelled.store(true, Ordering::SeqCst);
            handle.sink.lock().unwrap().take();
        }))
    }
}
