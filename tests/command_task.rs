// tests/command_task.rs

#![cfg(unix)]

mod common;

use std::sync::Arc;

use assetwatch::config::ConfigFile;
use assetwatch::fs::RealFileSystem;
use assetwatch::tasks::{build_registry, BuildTask};
use assetwatch::exec::CommandTask;
use assetwatch::types::TaskId;
use assetwatch_test_utils::builders::ConfigBuilder;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::test]
async fn successful_command_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let task = CommandTask::new(TaskId::Scripts, "true", dir.path());
    assert_eq!(task.id(), TaskId::Scripts);
    task.run().await.unwrap();
}

#[tokio::test]
async fn non_zero_exit_is_a_build_error_with_code_and_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let task = CommandTask::new(TaskId::Styles, "echo 'Undefined variable $x' >&2; exit 3", dir.path());

    let err = task.run().await.unwrap_err();
    assert_eq!(err.task, TaskId::Styles);
    assert_eq!(err.exit_code, Some(3));
    assert!(err.message.contains("Undefined variable"), "{}", err.message);
}

#[tokio::test]
async fn command_runs_in_project_root() -> TestResult {
    let dir = tempfile::tempdir()?;
    let task = CommandTask::new(TaskId::Scripts, "mkdir -p www && echo built > www/app.js", dir.path());

    task.run().await?;
    assert_eq!(common::read_file(dir.path(), "www/app.js"), "built\n");
    Ok(())
}

#[tokio::test]
async fn registry_from_config_runs_commands_and_builtins() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    common::write_file(root, "assets/vendors/a.js", "a();\n");
    common::write_file(
        root,
        "assets/images/sprite/dot.svg",
        r#"<svg viewBox="0 0 1 1"><circle r="1"/></svg>"#,
    );

    let cfg: ConfigFile = ConfigBuilder::new()
        .styles("mkdir -p www/assets/styles && echo '.a{}' > www/assets/styles/main.css")
        .sprite("sprite.svg")
        .concat(&["assets/vendors/*.js"], "www/vendors.js")
        .build();
    let registry = build_registry(&cfg, root, Arc::new(RealFileSystem))?;
    assert_eq!(
        registry.task_ids(),
        vec![TaskId::Concats, TaskId::Styles, TaskId::Svgs]
    );

    for id in registry.task_ids() {
        registry.get(id)?.run().await?;
    }

    assert_eq!(common::read_file(root, "www/vendors.js"), "a();\n");
    assert_eq!(common::read_file(root, "www/assets/styles/main.css"), ".a{}\n");
    assert!(common::read_file(root, "www/assets/images/sprite/sprite.svg")
        .contains(r#"<symbol id="dot" viewBox="0 0 1 1"><circle r="1"/></symbol>"#));

    let tasks = registry.tasks_for("assets/styles/partials/_x.scss");
    assert!(tasks.contains(&TaskId::Styles));
    Ok(())
}
