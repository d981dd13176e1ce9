// src/tasks/sprite.rs

//! Built-in SVG spritesheet runner for the `svgs` task.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::info;

use crate::fs::FileSystem;
use crate::tasks::{run_blocking, BuildTask, RunFuture};
use crate::types::TaskId;

/// Merges every `*.svg` in a directory into a single `<symbol>` sheet.
#[derive(Debug, Clone)]
pub struct SpriteTask {
    root: PathBuf,
    src_dir: PathBuf,
    outfile: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl SpriteTask {
    pub fn new(
        root: impl Into<PathBuf>,
        src_dir: impl Into<PathBuf>,
        outfile: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            root: root.into(),
            src_dir: src_dir.into(),
            outfile: outfile.into(),
            fs,
        }
    }
}

impl BuildTask for SpriteTask {
    fn id(&self) -> TaskId {
        TaskId::Svgs
    }

    fn run(&self) -> RunFuture<'_> {
        let task = self.clone();
        Box::pin(run_blocking(TaskId::Svgs, move || {
            build_spritesheet(
                task.fs.as_ref(),
                &task.root.join(&task.src_dir),
                &task.root.join(&task.outfile),
            )
            .map(|_| ())
        }))
    }
}

type CachedRegex = OnceLock<std::result::Result<Regex, regex::Error>>;

fn cached(cell: &'static CachedRegex, pattern: &str) -> Result<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(|e| anyhow!("invalid regex {pattern:?}: {e}"))
}

fn svg_open_re() -> Result<&'static Regex> {
    static RE: CachedRegex = OnceLock::new();
    cached(&RE, r"(?s)<svg\b([^>]*)>")
}

fn view_box_re() -> Result<&'static Regex> {
    static RE: CachedRegex = OnceLock::new();
    cached(&RE, r#"viewBox\s*=\s*"([^"]*)""#)
}

/// Escape the characters that cannot appear inside a double-quoted attribute.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Turn one SVG document into a `<symbol>` with the given id.
///
/// The id is attribute-escaped, so any file stem yields a well-formed sheet.
pub fn to_symbol(id: &str, svg: &str) -> Result<String> {
    let open = svg_open_re()?
        .captures(svg)
        .ok_or_else(|| anyhow!("no <svg> element found"))?;
    let whole = open.get(0).ok_or_else(|| anyhow!("no <svg> element found"))?;
    let attrs = open.get(1).map_or("", |m| m.as_str());

    let body_start = whole.end();
    let body_end = svg
        .rfind("</svg>")
        .filter(|end| *end >= body_start)
        .ok_or_else(|| anyhow!("unterminated <svg> element"))?;
    let body = svg[body_start..body_end].trim();

    let view_box = view_box_re()?
        .captures(attrs)
        .and_then(|c| c.get(1))
        .map(|m| format!(r#" viewBox="{}""#, m.as_str()))
        .unwrap_or_default();

    let id = escape_attr(id);
    Ok(format!(r#"<symbol id="{id}"{view_box}>{body}</symbol>"#))
}

/// Write the spritesheet for `src_dir` to `outfile`; returns the symbol ids.
///
/// Sources are taken in file-name order and the sheet is rewritten in full,
/// so removed icons disappear and reruns are byte-identical.
pub fn build_spritesheet(fs: &dyn FileSystem, src_dir: &Path, outfile: &Path) -> Result<Vec<String>> {
    let mut sources: Vec<PathBuf> = if fs.is_dir(src_dir) {
        fs.read_dir(src_dir)?
            .into_iter()
            .filter(|p| fs.is_file(p))
            .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("svg")))
            .collect()
    } else {
        Vec::new()
    };
    sources.sort();

    let mut ids = Vec::with_capacity(sources.len());
    let mut sheet = String::from(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" style=\"display: none;\">\n",
    );

    for src in &sources {
        let Some(id) = src.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let content = fs
            .read_to_string(src)
            .with_context(|| format!("reading svg {:?}", src))?;
        let symbol = to_symbol(&id, &content).with_context(|| format!("parsing svg {:?}", src))?;
        sheet.push_str("  ");
        sheet.push_str(&symbol);
        sheet.push('\n');
        ids.push(id);
    }
    sheet.push_str("</svg>\n");

    fs.write(outfile, sheet.as_bytes())
        .with_context(|| format!("writing spritesheet {:?}", outfile))?;
    info!(outfile = ?outfile, symbols = ids.len(), "generated spritesheet");
    Ok(ids)
}
