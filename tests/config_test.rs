//! Integration tests for Settings loading with layered precedence.
//!
//! These tests use temp directories for the local layer only; a global
//! config on the test machine would sit underneath them.

use std::env;
use std::fs;
use std::sync::{Mutex, MutexGuard};

use tempfile::TempDir;

use jobad::application::services::ChangeScope;
use jobad::application::ApplicationError;
use jobad::config::{local_config_path, Settings};
use jobad::domain::ComparisonPolicy;
use jobad::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

const ENV_VARS: [&str; 3] = [
    "JOBAD_COMPARISON",
    "JOBAD_CHANGE_SCOPE",
    "JOBAD_STRICT_EXPRESSIONS",
];

// Settings::load reads process-wide env vars; tests in this file run one at a time
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    let guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    for var in ENV_VARS {
        env::remove_var(var);
    }
    guard
}

#[test]
fn given_local_config_when_loading_then_overrides_fields_it_sets() {
    let _env = env_lock();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".jobad.toml"),
        "comparison = \"lexical\"\nstrict_expressions = true\n",
    )
    .unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert_eq!(settings.comparison, ComparisonPolicy::Lexical);
    assert!(settings.strict_expressions);
}

#[test]
fn given_directory_without_config_when_loading_then_succeeds() {
    let _env = env_lock();
    let dir = TempDir::new().unwrap();
    assert!(Settings::load(Some(dir.path())).is_ok());
}

#[test]
fn given_invalid_local_config_when_loading_then_reports_config_error() {
    let _env = env_lock();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".jobad.toml"), "change_scope = \"galaxy\"\n").unwrap();

    let err = Settings::load(Some(dir.path())).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_document_scope_in_local_config_when_loading_then_applies() {
    let _env = env_lock();
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "change_scope = \"document\"\n").unwrap();

    let settings = Settings::load(Some(dir.path())).unwrap();

    assert_eq!(settings.change_scope, ChangeScope::Document);
}

#[test]
fn given_env_override_when_loading_then_wins_over_local_config() {
    let _env = env_lock();
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "comparison = \"lexical\"\nchange_scope = \"subtree\"\n",
    )
    .unwrap();
    env::set_var("JOBAD_COMPARISON", "numeric");
    env::set_var("JOBAD_CHANGE_SCOPE", "Document");
    env::set_var("JOBAD_STRICT_EXPRESSIONS", "true");

    let settings = Settings::load(Some(dir.path()));

    for var in ENV_VARS {
        env::remove_var(var);
    }
    let settings = settings.unwrap();
    assert_eq!(settings.comparison, ComparisonPolicy::Numeric);
    assert_eq!(settings.change_scope, ChangeScope::Document);
    assert!(settings.strict_expressions);
}

#[test]
fn given_unknown_env_comparison_when_loading_then_reports_config_error() {
    let _env = env_lock();
    env::set_var("JOBAD_COMPARISON", "fuzzy");

    let result = Settings::load(None);

    env::remove_var("JOBAD_COMPARISON");
    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains("JOBAD_COMPARISON")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn given_unknown_env_scope_when_loading_then_reports_config_error() {
    let _env = env_lock();
    env::set_var("JOBAD_CHANGE_SCOPE", "galaxy");

    let result = Settings::load(None);

    env::remove_var("JOBAD_CHANGE_SCOPE");
    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains("JOBAD_CHANGE_SCOPE")),
        other => panic!("unexpected result: {:?}", other),
    }
}
