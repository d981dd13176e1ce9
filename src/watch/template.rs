// src/watch/template.rs

//! `{% paths.<key> %}` placeholder substitution for configured paths.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::config::model::{PathVars, PathsSection};
use crate::errors::{config_error, Result};

fn placeholder_re() -> Result<&'static Regex> {
    static RE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{%\s*([A-Za-z0-9_.\-]+)\s*%\}"))
        .as_ref()
        .map_err(|e| config_error(format!("invalid placeholder regex: {e}")))
}

/// Substitute every placeholder in `template` with its value from `vars`.
///
/// Unknown keys are a configuration error rather than being left in place,
/// since a literal `{% ... %}` would silently never match any file.
pub fn render_template(template: &str, vars: &PathVars) -> Result<String> {
    let mut missing: Option<String> = None;

    let rendered = placeholder_re()?.replace_all(template, |caps: &Captures<'_>| {
        let key = &caps[1];
        match vars.get(key) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| key.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(key) => Err(config_error(format!(
            "unknown template variable '{key}' in '{template}'"
        ))),
        None => Ok(rendered.into_owned()),
    }
}

/// Flatten the `[paths]` section into dotted template variables.
pub fn path_vars(paths: &PathsSection) -> PathVars {
    let mut vars = PathVars::new();

    if let Some(src) = &paths.src {
        vars.insert("paths.src".to_string(), src.clone());
    }
    vars.insert("paths.dest".to_string(), paths.dest.clone());

    if let Some(views) = &paths.views {
        vars.insert("paths.views.src".to_string(), views.src.clone());
    }

    for (name, sd) in [
        ("scripts", &paths.scripts),
        ("styles", &paths.styles),
        ("svgs", &paths.svgs),
    ] {
        if let Some(sd) = sd {
            vars.insert(format!("paths.{name}.src"), sd.src.clone());
            vars.insert(format!("paths.{name}.dest"), sd.dest.clone());
        }
    }

    for (key, value) in &paths.extra {
        vars.insert(format!("paths.{key}"), value.clone());
    }

    vars
}
