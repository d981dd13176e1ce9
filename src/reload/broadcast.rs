// src/reload/broadcast.rs

use tokio::sync::broadcast;
use tracing::{info, trace};

use super::LiveReload;

/// Message published to live-reload subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadMessage {
    Reload,
    Refresh(String),
}

/// In-process live-reload hub.
///
/// A transport (websocket or SSE endpoint) subscribes and forwards each
/// message to its clients. Sending with no subscribers is silently dropped.
#[derive(Debug, Clone)]
pub struct BroadcastReload {
    tx: broadcast::Sender<ReloadMessage>,
}

impl BroadcastReload {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    fn publish(&self, msg: ReloadMessage) {
        if self.tx.send(msg).is_err() {
            trace!("no live-reload subscribers connected");
        }
    }
}

impl Default for BroadcastReload {
    fn default() -> Self {
        Self::new(16)
    }
}

impl LiveReload for BroadcastReload {
    fn reload(&self) {
        self.publish(ReloadMessage::Reload);
    }

    fn refresh(&self, pattern: &str) {
        self.publish(ReloadMessage::Refresh(pattern.to_string()));
    }
}

/// Live-reload service that only logs; useful with `--once` or when the
/// browser is refreshed by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReload;

impl LiveReload for LogReload {
    fn reload(&self) {
        info!("reload: full page");
    }

    fn refresh(&self, pattern: &str) {
        info!(%pattern, "reload: refresh assets");
    }
}
