// tests/config_validation.rs

use std::path::PathBuf;

use assetwatch::config::{load_and_validate, load_from_str, ConfigFile, RunnerSpec};
use assetwatch::errors::AssetwatchError;
use assetwatch::types::{ReloadKind, ServerMode, TaskId};
use assetwatch_test_utils::builders::ConfigBuilder;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn validate(toml: &str) -> Result<ConfigFile, AssetwatchError> {
    ConfigFile::try_from(load_from_str(toml)?)
}

fn expect_config_error(toml: &str, needle: &str) {
    match validate(toml) {
        Err(AssetwatchError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} should mention {needle:?}")
        }
        Err(other) => panic!("expected ConfigError, got {other:?}"),
        Ok(cfg) => panic!("expected ConfigError, got {cfg:?}"),
    }
}

#[test]
fn full_config_resolves_tasks_in_build_order() {
    let cfg = ConfigBuilder::new()
        .scripts("esbuild app.js")
        .styles("sass in:out")
        .sprite("sprite.svg")
        .concat(&["{% paths.src %}/vendors/*.js"], "{% paths.scripts.dest %}/vendors.js")
        .build();

    let ids: Vec<TaskId> = cfg.tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, TaskId::BUILD_ORDER.to_vec());

    let scripts = cfg.task(TaskId::Scripts).unwrap();
    assert_eq!(scripts.watch, vec!["assets/scripts/**/*.js".to_string()]);
    assert!(matches!(&scripts.runner, RunnerSpec::Command(cmd) if cmd == "esbuild app.js"));

    let styles = cfg.task(TaskId::Styles).unwrap();
    assert_eq!(styles.watch, vec!["assets/styles/**/*.scss".to_string()]);

    let svgs = cfg.task(TaskId::Svgs).unwrap();
    assert_eq!(svgs.watch, vec!["assets/images/sprite/*.svg".to_string()]);
    match &svgs.runner {
        RunnerSpec::Sprite { src_dir, outfile } => {
            assert_eq!(src_dir, &PathBuf::from("assets/images/sprite"));
            assert_eq!(outfile, &PathBuf::from("www/assets/images/sprite/sprite.svg"));
        }
        other => panic!("expected built-in sprite runner, got {other:?}"),
    }

    let concats = cfg.task(TaskId::Concats).unwrap();
    assert_eq!(concats.watch, vec!["assets/vendors/*.js".to_string()]);
    match &concats.runner {
        RunnerSpec::Concat(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].includes, vec!["assets/vendors/*.js".to_string()]);
            assert_eq!(entries[0].outfile, "www/assets/scripts/vendors.js");
        }
        other => panic!("expected built-in concat runner, got {other:?}"),
    }
}

#[test]
fn reload_policy_defaults() {
    let cfg = ConfigBuilder::new()
        .scripts("true")
        .styles("true")
        .sprite("sprite.svg")
        .concat(&["a.js"], "www/bundle.js")
        .build();

    let policy = &cfg.reload_policy;
    assert_eq!(
        policy.kind_for(TaskId::Scripts),
        ReloadKind::AssetRefresh("www/assets/scripts/*.js".into())
    );
    assert_eq!(
        policy.kind_for(TaskId::Styles),
        ReloadKind::AssetRefresh("www/assets/styles/*.css".into())
    );
    assert_eq!(
        policy.kind_for(TaskId::Svgs),
        ReloadKind::AssetRefresh("www/assets/images/sprite/*.svg".into())
    );
    assert_eq!(policy.kind_for(TaskId::Concats), ReloadKind::FullReload);
}

#[test]
fn concat_asset_reload_uses_outfiles() {
    let one = ConfigBuilder::new()
        .concat(&["a.js"], "www/a.js")
        .concat_reload("asset")
        .build();
    assert_eq!(
        one.reload_policy.kind_for(TaskId::Concats),
        ReloadKind::AssetRefresh("www/a.js".into())
    );

    let two = ConfigBuilder::new()
        .concat(&["a.js"], "www/a.js")
        .concat(&["b.js"], "www/b.js")
        .concat_reload("asset")
        .build();
    assert_eq!(
        two.reload_policy.kind_for(TaskId::Concats),
        ReloadKind::AssetRefresh("{www/a.js,www/b.js}".into())
    );
}

#[test]
fn server_mode_proxy_or_static_dir() {
    let proxied = ConfigBuilder::new()
        .proxy("http://localhost:8000")
        .scripts("true")
        .build();
    assert_eq!(proxied.server_mode, ServerMode::Proxy("http://localhost:8000".into()));

    let empty_proxy = ConfigBuilder::new().proxy("  ").scripts("true").build();
    assert_eq!(empty_proxy.server_mode, ServerMode::StaticDir(PathBuf::from("www")));

    let no_proxy = ConfigBuilder::new().scripts("true").build();
    assert_eq!(no_proxy.server_mode, ServerMode::StaticDir(PathBuf::from("www")));
}

#[test]
fn views_are_rendered_and_kept_out_of_tasks() {
    let cfg = ConfigBuilder::new()
        .views("views/**/*.html")
        .scripts("true")
        .build();
    assert_eq!(cfg.view_patterns, vec!["views/**/*.html".to_string()]);
    assert_eq!(cfg.tasks.len(), 1);
}

#[test]
fn extra_path_keys_are_template_variables() {
    let cfg = ConfigBuilder::new()
        .path("vendors", "node_modules")
        .concat(&["{% paths.vendors %}/svg4everybody/dist/*.js"], "www/v.js")
        .build();
    let concats = cfg.task(TaskId::Concats).unwrap();
    assert_eq!(concats.watch, vec!["node_modules/svg4everybody/dist/*.js".to_string()]);
    assert_eq!(cfg.vars.get("paths.vendors").map(String::as_str), Some("node_modules"));
}

#[test]
fn concat_with_cmd_still_watches_includes() {
    let cfg = ConfigBuilder::new()
        .concat_cmd("make bundles")
        .concat(&["lib/*.js"], "www/lib.js")
        .build();
    let concats = cfg.task(TaskId::Concats).unwrap();
    assert!(matches!(&concats.runner, RunnerSpec::Command(cmd) if cmd == "make bundles"));
    assert_eq!(concats.watch, vec!["lib/*.js".to_string()]);
}

#[test]
fn svgs_cmd_replaces_builtin_sprite() {
    let cfg = ConfigBuilder::new().svgs_cmd("svgo -f in").build();
    let svgs = cfg.task(TaskId::Svgs).unwrap();
    assert!(matches!(&svgs.runner, RunnerSpec::Command(cmd) if cmd == "svgo -f in"));
}

#[test]
fn empty_command_is_rejected() {
    let toml = ConfigBuilder::new().scripts("   ").to_toml();
    expect_config_error(&toml, "cmd");
}

#[test]
fn config_without_tasks_is_rejected() {
    let toml = ConfigBuilder::new().to_toml();
    expect_config_error(&toml, "at least one");
}

#[test]
fn concat_entry_without_includes_is_rejected() {
    let toml = ConfigBuilder::new().concat(&[], "www/a.js").to_toml();
    expect_config_error(&toml, "includes");
}

#[test]
fn concat_entry_without_outfile_is_rejected() {
    let toml = ConfigBuilder::new().concat(&["a.js"], "").to_toml();
    expect_config_error(&toml, "outfile");
}

#[test]
fn concats_table_without_entries_is_rejected() {
    let toml = "[paths]\ndest = \"www\"\n\n[tasks.concats]\n";
    expect_config_error(toml, "entries");
}

#[test]
fn unknown_template_key_is_rejected() {
    let toml = ConfigBuilder::new()
        .concat(&["{% paths.missing %}/*.js"], "www/a.js")
        .to_toml();
    expect_config_error(&toml, "paths.missing");
}

#[test]
fn bad_glob_is_rejected_at_load() {
    let toml = ConfigBuilder::new()
        .concat(&["lib/[broken.js"], "www/a.js")
        .to_toml();
    expect_config_error(&toml, "lib/[broken.js");
}

#[test]
fn task_without_its_paths_is_rejected() {
    let toml = "[paths]\ndest = \"www\"\n\n[tasks.styles]\ncmd = \"sass\"\n";
    expect_config_error(toml, "paths.styles");
}

#[test]
fn explicit_watch_replaces_default_patterns() {
    let toml = format!(
        "{}\n[tasks.scripts]\ncmd = \"true\"\nwatch = [\"src/**/*.ts\"]\n",
        ConfigBuilder::new().to_toml()
    );
    let cfg = validate(&toml).unwrap();
    let scripts = cfg.task(TaskId::Scripts).unwrap();
    assert_eq!(scripts.watch, vec!["src/**/*.ts".to_string()]);
}

#[test]
fn explicit_watch_outside_root_is_rejected() {
    let toml = format!(
        "{}\n[tasks.scripts]\ncmd = \"true\"\nwatch = [\"../shared/**/*.ts\"]\n",
        ConfigBuilder::new().to_toml()
    );
    expect_config_error(&toml, "task 'scripts'");
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let err = load_from_str("[paths\ndest = ").unwrap_err();
    assert!(matches!(err, AssetwatchError::TomlError(_)), "got {err:?}");
}

#[test]
fn load_and_validate_reads_from_disk() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Assetwatch.toml");
    std::fs::write(&path, ConfigBuilder::new().styles("sass").to_toml())?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.tasks.len(), 1);
    assert_eq!(cfg.tasks[0].id, TaskId::Styles);
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, AssetwatchError::IoError(_)), "got {err:?}");
}

#[test]
fn concat_include_outside_root_is_rejected() {
    let toml = ConfigBuilder::new()
        .concat(&["/tmp/lib/*.js"], "www/lib.js")
        .to_toml();
    expect_config_error(&toml, "project root");

    let toml = ConfigBuilder::new()
        .concat(&["../shared/*.js"], "www/lib.js")
        .to_toml();
    expect_config_error(&toml, "project root");
}

#[test]
fn concat_outfile_outside_root_is_rejected() {
    let toml = ConfigBuilder::new()
        .concat(&["lib/*.js"], "../www/lib.js")
        .to_toml();
    expect_config_error(&toml, "concat outfile");
}
