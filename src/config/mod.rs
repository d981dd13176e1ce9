// src/config/mod.rs

//! Configuration loading and validation for assetwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it and resolve every task to a runner and watch patterns
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{
    CommandTaskConfig, ConcatTaskConfig, ConfigFile, ManifestEntry, PathVars, PathsSection,
    RawConfigFile, ReloadSection, RunnerSpec, ServerSection, SourceDest, SvgTaskConfig,
    TaskSpec, TasksSection, ViewPaths,
};
pub use validate::validate_config;
