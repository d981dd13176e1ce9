// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RegistryExecutor` the runtime uses in production, which tests can
//!   replace with a fake implementation.
//! - [`command`] runs external compiler commands with
//!   `tokio::process::Command`.

pub mod backend;
pub mod command;

pub use backend::{ExecutorBackend, RegistryExecutor};
pub use command::CommandTask;
