// tests/patterns.rs

use assetwatch::config::{ManifestEntry, PathVars};
use assetwatch::errors::AssetwatchError;
use assetwatch::watch::patterns::{is_root_relative, join_pattern};
use assetwatch::watch::{
    derive_concat_patterns, expand, matches, normalize, render_template, PathPattern, PatternSet,
};

fn vars() -> PathVars {
    let mut vars = PathVars::new();
    vars.insert("paths.src".into(), "assets".into());
    vars.insert("paths.scripts.dest".into(), "www/assets/scripts".into());
    vars.insert("paths.vendors".into(), "node_modules".into());
    vars
}

#[test]
fn single_star_stays_within_one_segment() {
    let styles = PathPattern::new("assets/styles/*.scss").unwrap();
    assert!(matches(&styles, "assets/styles/main.scss"));
    assert!(!matches(&styles, "assets/styles/partials/_grid.scss"));
}

#[test]
fn double_star_crosses_segments() {
    let pat = PathPattern::new("assets/scripts/**/*.js").unwrap();
    assert!(pat.is_match("assets/scripts/app.js"));
    assert!(pat.is_match("assets/scripts/components/nav/menu.js"));
    assert!(!pat.is_match("assets/styles/app.js"));
    assert!(!pat.is_match("assets/scripts/app.ts"));
}

#[test]
fn backslash_and_dot_prefix_are_normalized() {
    assert_eq!(normalize(".\\assets\\scripts\\app.js"), "assets/scripts/app.js");
    assert_eq!(normalize("./assets//styles/main.scss"), "assets/styles/main.scss");

    let nested = PathPattern::new("assets/scripts/**/*.js").unwrap();
    assert!(matches(&nested, "assets\\scripts\\lib\\a.js"));
    let dotted = PathPattern::new("./assets/scripts/*.js").unwrap();
    assert!(matches(&dotted, "assets/scripts/a.js"));
}

#[test]
fn join_pattern_handles_trailing_slash_and_dot() {
    assert_eq!(join_pattern("assets/scripts/", "**/*.js"), "assets/scripts/**/*.js");
    assert_eq!(join_pattern(".", "*.svg"), "*.svg");
}

#[test]
fn invalid_glob_is_a_config_error() {
    let err = PathPattern::new("assets/[scripts/*.js").unwrap_err();
    assert!(matches!(err, AssetwatchError::ConfigError(_)), "got {err:?}");

    let err = PatternSet::new(&["ok/*.js".to_string(), "bad/{a,b".to_string()]).unwrap_err();
    assert!(matches!(err, AssetwatchError::ConfigError(_)), "got {err:?}");
}

#[test]
fn pattern_set_matches_union() {
    let set = PatternSet::new(&["a/*.js".to_string(), "b/**/*.css".to_string()]).unwrap();
    assert!(set.is_match("a/x.js"));
    assert!(set.is_match("b/deep/x.css"));
    assert!(!set.is_match("c/x.js"));
    assert_eq!(set.patterns().len(), 2);
}

#[test]
fn render_template_substitutes_dotted_keys() {
    let rendered = render_template("{% paths.src %}/vendors/*.js", &vars()).unwrap();
    assert_eq!(rendered, "assets/vendors/*.js");

    let rendered = render_template("{%paths.scripts.dest%}/vendors.js", &vars()).unwrap();
    assert_eq!(rendered, "www/assets/scripts/vendors.js");

    assert_eq!(render_template("no/placeholders", &vars()).unwrap(), "no/placeholders");
}

#[test]
fn render_template_rejects_unknown_keys() {
    let err = render_template("{% paths.nope %}/a.js", &vars()).unwrap_err();
    match err {
        AssetwatchError::ConfigError(msg) => assert!(msg.contains("paths.nope"), "{msg}"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn expand_flattens_entries_in_order_keeping_duplicates() {
    let entries = vec![
        ManifestEntry::new(
            ["{% paths.src %}/vendors/*.js", "{% paths.vendors %}/svg4everybody.js"],
            "{% paths.scripts.dest %}/vendors.js",
        ),
        ManifestEntry::new(["{% paths.src %}/vendors/*.js"], "www/other.js"),
    ];

    let expanded = expand(&entries, &vars()).unwrap();
    assert_eq!(
        expanded,
        vec![
            "assets/vendors/*.js".to_string(),
            "node_modules/svg4everybody.js".to_string(),
            "assets/vendors/*.js".to_string(),
        ]
    );
}

#[test]
fn derive_concat_patterns_fails_fast_on_bad_glob() {
    let entries = vec![ManifestEntry::new(["{% paths.src %}/[oops.js"], "out.js")];
    let err = derive_concat_patterns(&entries, &vars()).unwrap_err();
    assert!(matches!(err, AssetwatchError::ConfigError(_)));
}

#[test]
fn root_relative_rejects_absolute_and_parent_paths() {
    assert!(is_root_relative("assets/vendors/*.js"));
    assert!(is_root_relative("./assets/a..b.js"));
    assert!(!is_root_relative("/tmp/lib/*.js"));
    assert!(!is_root_relative("C:\\lib\\*.js"));
    assert!(!is_root_relative("../lib/*.js"));
    assert!(!is_root_relative("assets/../../lib/*.js"));
}

#[test]
fn derive_concat_patterns_rejects_includes_outside_root() {
    for include in ["/tmp/lib/*.js", "../shared/*.js", "{% paths.src %}/../../x.js"] {
        let entries = vec![ManifestEntry::new([include], "out.js")];
        let err = derive_concat_patterns(&entries, &vars()).unwrap_err();
        assert!(
            matches!(&err, AssetwatchError::ConfigError(msg) if msg.contains("project root")),
            "{include}: {err:?}"
        );
    }
}
