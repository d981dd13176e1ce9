// tests/routing.rs

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use assetwatch::errors::AssetwatchError;
use assetwatch::tasks::{BuildTask, TaskRegistry, WatchRule};
use assetwatch::types::{ChangeEvent, ChangeKind, TaskId};
use assetwatch::watch::ChangeRouter;
use assetwatch_test_utils::fake_task::{new_trace, FakeTask};

use common::registry_with;

fn fake(id: TaskId) -> Arc<FakeTask> {
    Arc::new(FakeTask::new(id, new_trace()))
}

fn front_end_router() -> ChangeRouter {
    let registry = registry_with(vec![
        (fake(TaskId::Scripts), vec!["assets/scripts/**/*.js"]),
        (fake(TaskId::Styles), vec!["assets/styles/**/*.scss"]),
        (fake(TaskId::Svgs), vec!["assets/images/sprite/*.svg"]),
        (
            fake(TaskId::Concats),
            vec!["assets/vendors/*.js", "assets/scripts/legacy/*.js"],
        ),
    ]);
    ChangeRouter::new(registry, &["views/**/*.html".to_string()]).unwrap()
}

fn set(ids: &[TaskId]) -> BTreeSet<TaskId> {
    ids.iter().copied().collect()
}

#[test]
fn style_change_routes_to_styles_only() {
    let router = front_end_router();
    let routed = router.route(&ChangeEvent::modified("assets/styles/partials/_grid.scss"));
    assert_eq!(routed, set(&[TaskId::Styles]));
}

#[test]
fn path_matching_two_tasks_routes_to_both() {
    let router = front_end_router();
    let routed = router.route(&ChangeEvent::modified("assets/scripts/legacy/old.js"));
    assert_eq!(routed, set(&[TaskId::Concats, TaskId::Scripts]));
}

#[test]
fn task_matched_by_several_patterns_appears_once() {
    let registry = registry_with(vec![(fake(TaskId::Scripts), vec!["src/**/*.js", "src/*.js"])]);
    let router = ChangeRouter::new(registry, &[]).unwrap();

    let routed = router.route(&ChangeEvent::modified("src/app.js"));
    assert_eq!(routed, set(&[TaskId::Scripts]));
}

#[test]
fn deletion_routes_like_modification() {
    let router = front_end_router();
    let path = "assets/images/sprite/arrow.svg";

    let modified = router.route(&ChangeEvent::new(path, ChangeKind::Modified));
    let deleted = router.route(&ChangeEvent::new(path, ChangeKind::Deleted));
    let created = router.route(&ChangeEvent::new(path, ChangeKind::Created));

    assert_eq!(modified, set(&[TaskId::Svgs]));
    assert_eq!(deleted, modified);
    assert_eq!(created, modified);
}

#[test]
fn unmatched_path_routes_nowhere() {
    let router = front_end_router();
    assert!(router.route(&ChangeEvent::modified("README.md")).is_empty());
    // `*` does not descend into sub-directories.
    assert!(router
        .route(&ChangeEvent::modified("assets/images/sprite/old/arrow.svg"))
        .is_empty());
}

#[test]
fn windows_separators_route_like_forward_slashes() {
    let router = front_end_router();
    let routed = router.route(&ChangeEvent::modified("assets\\styles\\main.scss"));
    assert_eq!(routed, set(&[TaskId::Styles]));
}

#[test]
fn view_change_is_detected_without_task() {
    let router = front_end_router();
    assert!(router.is_view_change("views/pages/index.html"));
    assert!(router.route(&ChangeEvent::modified("views/pages/index.html")).is_empty());
    assert!(!router.is_view_change("assets/styles/main.scss"));
}

#[test]
fn watch_patterns_union_tasks_and_views() {
    let router = front_end_router();
    let patterns = router.watch_patterns();

    for expected in [
        "assets/scripts/**/*.js",
        "assets/styles/**/*.scss",
        "assets/images/sprite/*.svg",
        "assets/vendors/*.js",
        "views/**/*.html",
    ] {
        assert!(patterns.iter().any(|p| p == expected), "missing {expected}");
    }
}

#[test]
fn registry_get_unknown_task_is_not_found() {
    let registry = registry_with(vec![(fake(TaskId::Styles), vec!["a/*.scss"])]);
    match registry.get(TaskId::Scripts) {
        Err(AssetwatchError::TaskNotFound(TaskId::Scripts)) => {}
        Err(other) => panic!("expected TaskNotFound, got {other:?}"),
        Ok(_) => panic!("expected TaskNotFound"),
    }
    assert!(registry.get(TaskId::Styles).is_ok());
}

#[test]
fn registry_rejects_bad_registrations() {
    let mut registry = TaskRegistry::new();
    let styles: Arc<dyn BuildTask> = fake(TaskId::Styles);

    let err = registry
        .register(Arc::clone(&styles), vec![WatchRule::new(TaskId::Styles, Vec::<String>::new())])
        .unwrap_err();
    assert!(matches!(err, AssetwatchError::ConfigError(_)));

    let err = registry
        .register(Arc::clone(&styles), vec![WatchRule::new(TaskId::Scripts, ["a/*.js"])])
        .unwrap_err();
    assert!(matches!(err, AssetwatchError::ConfigError(_)));

    let err = registry
        .register(Arc::clone(&styles), vec![WatchRule::new(TaskId::Styles, ["a/[x"])])
        .unwrap_err();
    assert!(matches!(err, AssetwatchError::ConfigError(_)));

    registry
        .register(Arc::clone(&styles), vec![WatchRule::new(TaskId::Styles, ["a/*.scss"])])
        .unwrap();
    let err = registry
        .register(styles, vec![WatchRule::new(TaskId::Styles, ["b/*.scss"])])
        .unwrap_err();
    assert!(matches!(err, AssetwatchError::ConfigError(_)));

    assert_eq!(registry.task_ids(), vec![TaskId::Styles]);
}

#[test]
fn registry_task_ids_are_in_build_order() {
    let registry = registry_with(vec![
        (fake(TaskId::Svgs), vec!["s/*.svg"]),
        (fake(TaskId::Scripts), vec!["j/*.js"]),
        (fake(TaskId::Concats), vec!["c/*.js"]),
    ]);
    assert_eq!(
        registry.task_ids(),
        vec![TaskId::Concats, TaskId::Scripts, TaskId::Svgs]
    );
}
