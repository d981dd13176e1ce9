// src/watch/patterns.rs

use std::fmt;

use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::config::model::{ManifestEntry, PathVars};
use crate::errors::{config_error, Result};
use crate::watch::template::render_template;

/// Normalize a path or pattern to forward slashes without a leading `./`.
///
/// Patterns and event paths both go through this, so matching does not
/// depend on the platform separator.
pub fn normalize(path: &str) -> String {
    let mut s = path.replace('\\', "/");
    while s.contains("//") {
        s = s.replace("//", "/");
    }
    let mut rest = s.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}

/// Join a directory and a relative tail with a single `/`.
pub fn join_pattern(dir: &str, tail: &str) -> String {
    let dir = normalize(dir);
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        normalize(tail)
    } else {
        normalize(&format!("{dir}/{tail}"))
    }
}

fn build_glob(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(&normalize(pattern))
        .literal_separator(true)
        .build()
        .map_err(|e| config_error(format!("invalid glob pattern '{pattern}': {e}")))
}

/// A single compiled glob.
///
/// `*` stays within one path segment; `**` crosses segments.
#[derive(Clone)]
pub struct PathPattern {
    source: String,
    matcher: GlobMatcher,
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.source).finish()
    }
}

impl PathPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = build_glob(pattern)?;
        Ok(Self {
            source: normalize(pattern),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(normalize(path))
    }
}

/// Match `path` against an already compiled pattern.
pub fn matches(pattern: &PathPattern, path: &str) -> bool {
    pattern.is_match(path)
}

/// Whether a normalized path or pattern stays under the project root.
///
/// Absolute paths, drive prefixes and `..` segments all escape it, and the
/// watcher only reports root-relative paths.
pub fn is_root_relative(pattern: &str) -> bool {
    let pattern = normalize(pattern);
    if pattern.starts_with('/') {
        return false;
    }
    let bytes = pattern.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return false;
    }
    !pattern.split('/').any(|seg| seg == "..")
}

pub fn ensure_root_relative(what: &str, pattern: &str) -> Result<()> {
    if is_root_relative(pattern) {
        Ok(())
    } else {
        Err(config_error(format!(
            "{what} '{pattern}' must be relative to the project root"
        )))
    }
}

/// An ordered set of compiled globs matched as a union.
#[derive(Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    set: GlobSet,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSet")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl PatternSet {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pat in patterns {
            builder.add(build_glob(pat)?);
        }
        let set = builder
            .build()
            .map_err(|e| config_error(format!("building glob set: {e}")))?;
        Ok(Self {
            patterns: patterns.iter().map(|p| normalize(p)).collect(),
            set,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.set.is_match(normalize(path))
    }
}

/// Render every include of every manifest entry, flattened in entry order.
///
/// Duplicates are kept; routing is a set union so they are harmless.
pub fn expand(entries: &[ManifestEntry], vars: &PathVars) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for entry in entries {
        for include in &entry.includes {
            out.push(normalize(&render_template(include, vars)?));
        }
    }
    Ok(out)
}

/// Watch patterns for the concat task, derived once at registration.
///
/// Fails fast on a glob that does not compile or that points outside the
/// project root.
pub fn derive_concat_patterns(entries: &[ManifestEntry], vars: &PathVars) -> Result<Vec<String>> {
    let patterns = expand(entries, vars)?;
    for pat in &patterns {
        ensure_root_relative("concat include", pat)?;
        build_glob(pat)?;
    }
    Ok(patterns)
}

/// Reject a rendered concat outfile that would be written outside the root.
pub fn ensure_outfile_in_root(outfile: &str) -> Result<()> {
    ensure_root_relative("concat outfile", outfile)
}
