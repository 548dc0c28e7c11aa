//! Tests for the sitegate configuration system.

use std::sync::Mutex;

use sitegate_core::config::{CliOverrides, RunConfiguration, RunFlags, SiteGateConfig};
use sitegate_core::errors::ConfigError;
use sitegate_core::types::{LayerId, RunMode};

/// Global mutex to serialize tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ENV_KEYS: [&str; 6] = [
    "SITEGATE_RUN_TIMEOUT_SECS",
    "SITEGATE_RUN_MAX_WARNINGS",
    "SITEGATE_RUN_WORKERS",
    "SITEGATE_FETCH_MAX_PAGES",
    "SITEGATE_LINKS_CHECK_EXTERNAL",
    "SITEGATE_FACTS_SHEET",
];

/// Clear all SITEGATE_ env vars and point HOME at an empty directory so a
/// developer's user config cannot leak into the tests.
fn isolate_env(home: &std::path::Path) {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
    std::env::set_var("HOME", home);
}

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

#[test]
fn test_four_layer_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempdir();
    isolate_env(home.path());

    let user_dir = home.path().join(".sitegate");
    std::fs::create_dir_all(&user_dir).unwrap();
    std::fs::write(
        user_dir.join("config.toml"),
        "[run]\nworkers = 2\nmax_warnings = 9\n[content]\nmax_examples = 7\n",
    )
    .unwrap();

    let project = tempdir();
    std::fs::write(
        project.path().join("sitegate.toml"),
        r#"
[run]
workers = 4
timeout_secs = 60

[fetch]
max_pages = 50
"#,
    )
    .unwrap();

    std::env::set_var("SITEGATE_RUN_TIMEOUT_SECS", "120");

    let cli = CliOverrides {
        workers: Some(16),
        ..Default::default()
    };
    let config = SiteGateConfig::load(None, project.path(), Some(&cli)).unwrap();

    // CLI beats project and user
    assert_eq!(config.run.workers, Some(16));
    // env beats project
    assert_eq!(config.run.timeout_secs, Some(120));
    // project beats user/defaults
    assert_eq!(config.fetch.max_pages, Some(50));
    // user beats defaults
    assert_eq!(config.run.max_warnings, Some(9));
    assert_eq!(config.content.effective_max_examples(), 7);

    isolate_env(home.path());
}

#[test]
fn test_load_without_files_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempdir();
    isolate_env(home.path());

    let dir = tempdir();
    let config = SiteGateConfig::load(None, dir.path(), None).unwrap();
    assert_eq!(config.run.effective_workers(), 8);
    assert_eq!(config.run.effective_max_warnings(), 5);
    assert_eq!(config.run.effective_timeout_secs(), 300);
    assert_eq!(config.fetch.effective_max_pages(), 200);
    assert!(config.links.effective_check_external());
    assert!(config.facts.sheet.is_none());
}

#[test]
fn test_explicit_config_must_exist() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempdir();
    isolate_env(home.path());

    let dir = tempdir();
    let missing = dir.path().join("nope.toml");
    let err = SiteGateConfig::load(Some(&missing), dir.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempdir();
    isolate_env(home.path());

    let dir = tempdir();
    std::fs::write(dir.path().join("sitegate.toml"), "[run\nworkers = ").unwrap();
    let err = SiteGateConfig::load(None, dir.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn test_unparseable_env_value_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempdir();
    isolate_env(home.path());

    std::env::set_var("SITEGATE_RUN_WORKERS", "many");
    let dir = tempdir();
    let err = SiteGateConfig::load(None, dir.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { .. }));

    isolate_env(home.path());
}

#[test]
fn test_validation_rejects_zero_values() {
    for toml in [
        "[run]\nworkers = 0",
        "[run]\ntimeout_secs = 0",
        "[fetch]\nmax_pages = 0",
        "[run]\nlayers = [\"security\", \"spelling\"]",
    ] {
        let config = SiteGateConfig::from_toml(toml).unwrap();
        assert!(
            SiteGateConfig::validate(&config).is_err(),
            "expected validation failure for {toml}"
        );
    }
}

#[test]
fn test_layer_subset_sorted_into_sequence() {
    let config =
        SiteGateConfig::from_toml("[run]\nlayers = [\"facts\", \"security\", \"facts\"]").unwrap();
    assert_eq!(
        config.enabled_layers().unwrap(),
        vec![LayerId::Security, LayerId::FactConsistency]
    );
}

#[test]
fn test_unknown_keys_ignored() {
    let config = SiteGateConfig::from_toml(
        "[run]\nworkers = 3\nfuture_option = true\n[telemetry]\nenabled = true\n",
    )
    .unwrap();
    assert_eq!(config.run.workers, Some(3));
}

#[test]
fn test_toml_round_trip_preserves_values() {
    let config = SiteGateConfig::from_toml(
        "[links]\ncheck_external = false\nmax_depth = 3\n[facts]\nsheet = \"facts.txt\"\nrequired = true\n",
    )
    .unwrap();
    let again = SiteGateConfig::from_toml(&config.to_toml().unwrap()).unwrap();
    assert_eq!(again.links.check_external, Some(false));
    assert_eq!(again.links.effective_max_depth(), 3);
    assert!(again.facts.effective_required());
}

#[test]
fn test_run_configuration_layer_subset_and_skips() {
    let settings = SiteGateConfig::from_toml("[run]\nlayers = [\"links\", \"structural\"]").unwrap();
    let config = RunConfiguration::from_flags(
        RunFlags {
            target: Some("./public".into()),
            no_links: true,
            ..Default::default()
        },
        settings,
    )
    .unwrap();
    assert_eq!(config.mode, RunMode::Normal);
    assert_eq!(config.active_layers(), vec![LayerId::Structural]);
}
