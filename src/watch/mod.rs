// src/watch/mod.rs

//! File watching and change routing.
//!
//! This module is responsible for:
//! - Compiling and matching glob patterns ([`patterns`]), including the
//!   `{% paths.<key> %}` templates used by concat manifests ([`template`]).
//! - Routing a change event to the tasks it affects ([`router`]).
//! - Wiring up a cross-platform filesystem watcher (`notify`) behind the
//!   [`WatchService`] trait ([`watcher`]).
//!
//! It does **not** know about run state or coalescing; it only turns
//! filesystem changes into task-level requests.

pub mod patterns;
pub mod router;
pub mod template;
pub mod watcher;

pub use patterns::{derive_concat_patterns, expand, matches, normalize, PathPattern, PatternSet};
pub use router::ChangeRouter;
pub use template::{path_vars, render_template};
pub use watcher::{NotifyWatchService, Subscription, WatchService};
