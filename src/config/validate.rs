// src/config/validate.rs

use std::path::PathBuf;

use crate::config::model::{
    CommandTaskConfig, ConfigFile, ManifestEntry, PathVars, RawConfigFile, RunnerSpec,
    SourceDest, TaskSpec,
};
use crate::errors::{config_error, AssetwatchError, Result};
use crate::reload::ReloadPolicy;
use crate::types::{ConcatReloadPolicy, ReloadKind, ServerMode, TaskId};
use crate::watch::patterns::{
    derive_concat_patterns, ensure_outfile_in_root, ensure_root_relative, join_pattern,
    PatternSet,
};
use crate::watch::template::{path_vars, render_template};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)
    }
}

/// Validate a raw config and resolve it into an immutable [`ConfigFile`].
pub fn validate_config(raw: &RawConfigFile) -> Result<ConfigFile> {
    let vars = path_vars(&raw.paths);

    let server_mode = server_mode(raw);
    let view_patterns = view_patterns(raw, &vars)?;
    let tasks = resolve_tasks(raw, &vars)?;

    if tasks.is_empty() {
        return Err(config_error(
            "config must contain at least one [tasks.<name>] section",
        ));
    }

    for task in &tasks {
        ensure_patterns(task.id, &task.watch)?;
    }

    let reload_policy = reload_policy(raw, &tasks, &vars);

    Ok(ConfigFile {
        server_mode,
        vars,
        view_patterns,
        tasks,
        reload_policy,
    })
}

fn server_mode(raw: &RawConfigFile) -> ServerMode {
    match raw.server.proxy.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => ServerMode::Proxy(url.to_string()),
        _ => ServerMode::StaticDir(PathBuf::from(&raw.paths.dest)),
    }
}

fn view_patterns(raw: &RawConfigFile, vars: &PathVars) -> Result<Vec<String>> {
    let Some(views) = &raw.paths.views else {
        return Ok(Vec::new());
    };
    let pattern = render_template(&views.src, vars)?;
    ensure_root_relative("views pattern", &pattern)?;
    PatternSet::new(std::slice::from_ref(&pattern))?;
    Ok(vec![pattern])
}

fn ensure_patterns(task: TaskId, patterns: &[String]) -> Result<()> {
    if patterns.is_empty() {
        return Err(config_error(format!(
            "task '{task}' has no watch patterns"
        )));
    }
    for pattern in patterns {
        ensure_root_relative(&format!("watch pattern of task '{task}'"), pattern)?;
    }
    PatternSet::new(patterns)?;
    Ok(())
}

fn require_paths<'a>(task: TaskId, paths: &'a Option<SourceDest>) -> Result<&'a SourceDest> {
    paths.as_ref().ok_or_else(|| {
        config_error(format!(
            "[tasks.{task}] requires [paths.{task}] with `src` and `dest`"
        ))
    })
}

fn require_cmd(task: TaskId, cmd: &str) -> Result<String> {
    let cmd = cmd.trim();
    if cmd.is_empty() {
        return Err(config_error(format!("[tasks.{task}].cmd must not be empty")));
    }
    Ok(cmd.to_string())
}

fn command_task(
    task: TaskId,
    cfg: &CommandTaskConfig,
    paths: &Option<SourceDest>,
    default_glob: &str,
) -> Result<TaskSpec> {
    let paths = require_paths(task, paths)?;
    let cmd = require_cmd(task, &cfg.cmd)?;
    let watch = cfg
        .watch
        .clone()
        .unwrap_or_else(|| vec![join_pattern(&paths.src, default_glob)]);

    Ok(TaskSpec {
        id: task,
        runner: RunnerSpec::Command(cmd),
        watch,
    })
}

/// Resolve every configured task, in build order.
fn resolve_tasks(raw: &RawConfigFile, vars: &PathVars) -> Result<Vec<TaskSpec>> {
    let mut tasks = Vec::new();

    if let Some(concats) = &raw.tasks.concats {
        if concats.entries.is_empty() {
            return Err(config_error(
                "[tasks.concats] must contain at least one [[tasks.concats.entries]]",
            ));
        }

        let mut entries = Vec::with_capacity(concats.entries.len());
        for (idx, entry) in concats.entries.iter().enumerate() {
            if entry.includes.is_empty() {
                return Err(config_error(format!(
                    "concat entry #{idx} has an empty `includes` list"
                )));
            }
            if entry.outfile.trim().is_empty() {
                return Err(config_error(format!(
                    "concat entry #{idx} has an empty `outfile`"
                )));
            }
            let outfile = render_template(&entry.outfile, vars)?;
            ensure_outfile_in_root(&outfile)?;
            entries.push(ManifestEntry {
                includes: entry
                    .includes
                    .iter()
                    .map(|inc| render_template(inc, vars))
                    .collect::<Result<Vec<_>>>()?,
                outfile,
            });
        }

        // Derived from the raw entries; one pattern per include per entry.
        let watch = derive_concat_patterns(&concats.entries, vars)?;
        let runner = match &concats.cmd {
            Some(cmd) => RunnerSpec::Command(require_cmd(TaskId::Concats, cmd)?),
            None => RunnerSpec::Concat(entries),
        };

        tasks.push(TaskSpec {
            id: TaskId::Concats,
            runner,
            watch,
        });
    }

    if let Some(scripts) = &raw.tasks.scripts {
        tasks.push(command_task(
            TaskId::Scripts,
            scripts,
            &raw.paths.scripts,
            "**/*.js",
        )?);
    }

    if let Some(styles) = &raw.tasks.styles {
        tasks.push(command_task(
            TaskId::Styles,
            styles,
            &raw.paths.styles,
            "**/*.scss",
        )?);
    }

    if let Some(svgs) = &raw.tasks.svgs {
        let paths = require_paths(TaskId::Svgs, &raw.paths.svgs)?;
        let runner = match &svgs.cmd {
            Some(cmd) => RunnerSpec::Command(require_cmd(TaskId::Svgs, cmd)?),
            None => {
                if svgs.sprite.trim().is_empty() {
                    return Err(config_error("[tasks.svgs].sprite must not be empty"));
                }
                RunnerSpec::Sprite {
                    src_dir: PathBuf::from(&paths.src),
                    outfile: PathBuf::from(join_pattern(&paths.dest, &svgs.sprite)),
                }
            }
        };
        let watch = svgs
            .watch
            .clone()
            .unwrap_or_else(|| vec![join_pattern(&paths.src, "*.svg")]);

        tasks.push(TaskSpec {
            id: TaskId::Svgs,
            runner,
            watch,
        });
    }

    Ok(tasks)
}

fn reload_policy(raw: &RawConfigFile, tasks: &[TaskSpec], vars: &PathVars) -> ReloadPolicy {
    let mut policy = ReloadPolicy::default();

    for task in tasks {
        let kind = match task.id {
            TaskId::Scripts => raw
                .paths
                .scripts
                .as_ref()
                .map(|p| ReloadKind::AssetRefresh(join_pattern(&p.dest, "*.js"))),
            TaskId::Styles => raw
                .paths
                .styles
                .as_ref()
                .map(|p| ReloadKind::AssetRefresh(join_pattern(&p.dest, "*.css"))),
            TaskId::Svgs => raw
                .paths
                .svgs
                .as_ref()
                .map(|p| ReloadKind::AssetRefresh(join_pattern(&p.dest, "*.svg"))),
            TaskId::Concats => Some(concat_reload_kind(raw, vars)),
        };

        if let Some(kind) = kind {
            policy.set(task.id, kind);
        }
    }

    policy
}

fn concat_reload_kind(raw: &RawConfigFile, vars: &PathVars) -> ReloadKind {
    // Outfiles were already rendered successfully while resolving tasks.
    let outfiles: Vec<String> = raw
        .tasks
        .concats
        .iter()
        .flat_map(|c| c.entries.iter())
        .filter_map(|e| render_template(&e.outfile, vars).ok())
        .collect();

    match raw.reload.concats {
        ConcatReloadPolicy::Asset if outfiles.len() == 1 => {
            ReloadKind::AssetRefresh(outfiles[0].clone())
        }
        ConcatReloadPolicy::Asset if !outfiles.is_empty() => {
            ReloadKind::AssetRefresh(format!("{{{}}}", outfiles.join(",")))
        }
        _ => ReloadKind::FullReload,
    }
}
