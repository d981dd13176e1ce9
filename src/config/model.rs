// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::reload::ReloadPolicy;
use crate::types::{ConcatReloadPolicy, ServerMode, TaskId};

/// Template variables available to `{% paths.<key> %}` placeholders.
///
/// Keys are dotted, e.g. `paths.src` or `paths.scripts.dest`.
pub type PathVars = BTreeMap<String, String>;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [server]
/// proxy = "http://localhost:8000"
///
/// [paths]
/// src = "assets"
/// dest = "www"
/// views.src = "views/**/*.html"
/// scripts = { src = "assets/scripts", dest = "www/assets/scripts" }
///
/// [tasks.scripts]
/// cmd = "esbuild assets/scripts/app.js --bundle --outdir=www/assets/scripts"
///
/// [[tasks.concats.entries]]
/// includes = ["{% paths.src %}/vendors/*.js"]
/// outfile = "{% paths.scripts.dest %}/vendors.js"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    pub paths: PathsSection,

    #[serde(default)]
    pub reload: ReloadSection,

    #[serde(default)]
    pub tasks: TasksSection,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerSection {
    /// Backend URL to proxy. Absent or empty means "serve `paths.dest`".
    #[serde(default)]
    pub proxy: Option<String>,
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default)]
    pub src: Option<String>,

    /// Output root; also the static directory when no proxy is configured.
    pub dest: String,

    #[serde(default)]
    pub views: Option<ViewPaths>,

    #[serde(default)]
    pub scripts: Option<SourceDest>,

    #[serde(default)]
    pub styles: Option<SourceDest>,

    #[serde(default)]
    pub svgs: Option<SourceDest>,

    /// Any other string entry, usable from templates (`{% paths.vendors %}`).
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewPaths {
    /// Glob of view templates; a change reloads the page.
    pub src: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceDest {
    pub src: String,
    pub dest: String,
}

/// `[reload]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReloadSection {
    #[serde(default)]
    pub concats: ConcatReloadPolicy,
}

/// `[tasks]` section. A task is only registered when its table is present.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TasksSection {
    #[serde(default)]
    pub scripts: Option<CommandTaskConfig>,

    #[serde(default)]
    pub styles: Option<CommandTaskConfig>,

    #[serde(default)]
    pub svgs: Option<SvgTaskConfig>,

    #[serde(default)]
    pub concats: Option<ConcatTaskConfig>,
}

/// A task driven entirely by an external compiler command.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandTaskConfig {
    pub cmd: String,

    /// Replaces the default watch patterns for this task.
    #[serde(default)]
    pub watch: Option<Vec<String>>,
}

/// `[tasks.svgs]`: built-in spritesheet unless `cmd` is given.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SvgTaskConfig {
    #[serde(default)]
    pub cmd: Option<String>,

    /// File name of the generated spritesheet inside `paths.svgs.dest`.
    #[serde(default = "default_sprite_name")]
    pub sprite: String,

    #[serde(default)]
    pub watch: Option<Vec<String>>,
}

fn default_sprite_name() -> String {
    "sprite.svg".to_string()
}

/// `[tasks.concats]`: built-in concatenation unless `cmd` is given.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConcatTaskConfig {
    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
}

/// One concatenation bundle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    /// Ordered source globs; may contain `{% paths.<key> %}` placeholders.
    pub includes: Vec<String>,

    /// Output file; may contain placeholders.
    pub outfile: String,
}

impl ManifestEntry {
    pub fn new<I, S>(includes: I, outfile: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            includes: includes.into_iter().map(Into::into).collect(),
            outfile: outfile.into(),
        }
    }
}

/// Validated, immutable configuration.
///
/// Produced from [`RawConfigFile`] via `TryFrom`; all templates are rendered,
/// all globs are known to compile, and every task is resolved to a runner.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub server_mode: ServerMode,
    pub vars: PathVars,
    /// Patterns whose changes reload the page without running a task.
    pub view_patterns: Vec<String>,
    /// Registered tasks in build order.
    pub tasks: Vec<TaskSpec>,
    pub reload_policy: ReloadPolicy,
}

impl ConfigFile {
    pub fn task(&self, id: TaskId) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

/// A task resolved from config.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub id: TaskId,
    pub runner: RunnerSpec,
    /// Patterns that trigger this task, relative to the project root.
    pub watch: Vec<String>,
}

/// How a task produces its output.
#[derive(Debug, Clone)]
pub enum RunnerSpec {
    /// Shell command.
    Command(String),
    /// Built-in concatenation of rendered manifest entries.
    Concat(Vec<ManifestEntry>),
    /// Built-in SVG spritesheet.
    Sprite { src_dir: PathBuf, outfile: PathBuf },
}
