// src/tasks/concat.rs

//! Built-in runner for the `concats` task.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::config::model::ManifestEntry;
use crate::fs::{walk_files, FileSystem};
use crate::tasks::{run_blocking, BuildTask, RunFuture};
use crate::types::TaskId;
use crate::watch::patterns::{is_root_relative, normalize, PathPattern};

/// Concatenates the sources of every manifest entry into its outfile.
///
/// Each run overwrites the outfiles from scratch, so repeated runs on the
/// same sources produce byte-identical output.
#[derive(Debug, Clone)]
pub struct ConcatTask {
    root: PathBuf,
    entries: Vec<ManifestEntry>,
    fs: Arc<dyn FileSystem>,
}

impl ConcatTask {
    /// `entries` must already have their templates rendered.
    pub fn new(root: impl Into<PathBuf>, entries: Vec<ManifestEntry>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            entries,
            fs,
        }
    }
}

impl BuildTask for ConcatTask {
    fn id(&self) -> TaskId {
        TaskId::Concats
    }

    fn run(&self) -> RunFuture<'_> {
        let task = self.clone();
        Box::pin(run_blocking(TaskId::Concats, move || {
            for entry in &task.entries {
                concat_entry(task.fs.as_ref(), &task.root, entry)?;
            }
            Ok(())
        }))
    }
}

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

/// Leading segments of `pattern` that contain no glob syntax.
fn literal_prefix(pattern: &str) -> String {
    pattern
        .split('/')
        .take_while(|seg| !has_glob_meta(seg))
        .collect::<Vec<_>>()
        .join("/")
}

/// Files matched by one include, sorted by path.
///
/// Includes are resolved against `root`; one that escapes it is an error.
pub fn resolve_include(fs: &dyn FileSystem, root: &Path, include: &str) -> Result<Vec<PathBuf>> {
    let include = normalize(include);
    if !is_root_relative(&include) {
        bail!("concat include {include:?} is not relative to the project root");
    }

    if !has_glob_meta(&include) {
        let path = root.join(&include);
        return Ok(if fs.is_file(&path) { vec![path] } else { Vec::new() });
    }

    let pattern = PathPattern::new(&include)?;
    let prefix = literal_prefix(&include);
    let base = if prefix.is_empty() {
        root.to_path_buf()
    } else {
        root.join(&prefix)
    };

    let mut matched = Vec::new();
    for file in walk_files(fs, &base)? {
        let Ok(rel) = file.strip_prefix(root) else {
            continue;
        };
        if pattern.is_match(&rel.to_string_lossy()) {
            matched.push(file);
        }
    }
    Ok(matched)
}

/// Build one bundle and return the path written.
///
/// Sources are taken in include order; a file matched by several includes is
/// only added the first time.
pub fn concat_entry(fs: &dyn FileSystem, root: &Path, entry: &ManifestEntry) -> Result<PathBuf> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for include in &entry.includes {
        for file in resolve_include(fs, root, include)? {
            if seen.insert(file.clone()) {
                sources.push(file);
            }
        }
    }

    if !is_root_relative(&entry.outfile) {
        bail!("concat outfile {:?} is not relative to the project root", entry.outfile);
    }
    let outfile = root.join(normalize(&entry.outfile));
    if sources.is_empty() {
        warn!(outfile = ?outfile, includes = ?entry.includes, "concat entry matched no files; writing empty bundle");
    }

    let mut bundle = String::new();
    for src in &sources {
        // Never fold a previous bundle back into itself.
        if *src == outfile {
            continue;
        }
        let content = fs
            .read_to_string(src)
            .with_context(|| format!("reading concat source {:?}", src))?;
        debug!(source = ?src, "concat source");
        bundle.push_str(content.trim_end_matches('\n'));
        bundle.push('\n');
    }

    fs.write(&outfile, bundle.as_bytes())
        .with_context(|| format!("writing concat bundle {:?}", outfile))?;
    info!(outfile = ?outfile, sources = sources.len(), "concatenated bundle");
    Ok(outfile)
}
