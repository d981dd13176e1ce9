#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use assetwatch::tasks::{BuildTask, TaskRegistry, WatchRule};
use assetwatch_test_utils::fake_task::FakeTask;

/// Register each fake task with a single rule made of `patterns`.
pub fn registry_with(tasks: Vec<(Arc<FakeTask>, Vec<&str>)>) -> Arc<TaskRegistry> {
    let mut registry = TaskRegistry::new();
    for (task, patterns) in tasks {
        let id = task.id();
        let runner: Arc<dyn BuildTask> = task;
        registry
            .register(runner, vec![WatchRule::new(id, patterns)])
            .expect("fake task registration");
    }
    Arc::new(registry)
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(path, content).expect("write test file");
}

pub fn read_file(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel)).expect("read test file")
}
