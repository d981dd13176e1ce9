use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

/// Identifier of one of the build tasks the orchestrator knows about.
///
/// The set is closed: every task the dev workflow can run is listed here, so
/// routing and registration can never name a task that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskId {
    Concats,
    Scripts,
    Styles,
    Svgs,
}

impl TaskId {
    /// Fixed order of the initial full build.
    ///
    /// Concatenated bundles must exist before the first page is served; the
    /// remaining tasks are independent of each other.
    pub const BUILD_ORDER: [TaskId; 4] = [
        TaskId::Concats,
        TaskId::Scripts,
        TaskId::Styles,
        TaskId::Svgs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskId::Concats => "concats",
            TaskId::Scripts => "scripts",
            TaskId::Styles => "styles",
            TaskId::Svgs => "svgs",
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "concats" => Ok(TaskId::Concats),
            "scripts" => Ok(TaskId::Scripts),
            "styles" => Ok(TaskId::Styles),
            "svgs" => Ok(TaskId::Svgs),
            other => Err(format!(
                "unknown task id: {other} (expected concats, scripts, styles or svgs)"
            )),
        }
    }
}

/// Kind of filesystem change reported by the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

/// A single change delivered by the watch service.
///
/// `path` is relative to the project root and uses forward slashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn modified(path: impl Into<String>) -> Self {
        Self::new(path, ChangeKind::Modified)
    }
}

/// Granularity of a browser refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadKind {
    /// Reload the whole page.
    FullReload,
    /// Swap assets matching this output pattern in place.
    AssetRefresh(String),
}

/// How the dev server serves pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMode {
    /// Proxy an existing backend at this URL.
    Proxy(String),
    /// Serve files from this directory.
    StaticDir(PathBuf),
}

impl fmt::Display for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMode::Proxy(url) => write!(f, "proxy {url}"),
            ServerMode::StaticDir(dir) => write!(f, "static dir {}", dir.display()),
        }
    }
}

/// Reload granularity requested after the concat task succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcatReloadPolicy {
    /// Concatenated bundles are referenced from views; reload the page.
    Full,
    /// Refresh the concatenated outfiles in place.
    Asset,
}

impl Default for ConcatReloadPolicy {
    fn default() -> Self {
        ConcatReloadPolicy::Full
    }
}
