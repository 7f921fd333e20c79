//! Test plan for the `parley-config` crate.
//!
//! These tests exercise the configuration loader across default handling,
//! file discovery, environment overrides, and validation behaviour.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use parley_config::{load, load_from, AppConfig};

const ENV_VARS_TO_RESET: &[&str] = &[
    "PARLEY_CONFIG",
    "PARLEY__AUTH__JWT_SECRET",
    "PARLEY__AUTH__ISSUER",
    "PARLEY__AUTH__ACCESS_TOKEN_TTL_SECONDS",
    "PARLEY__AUTH__REFRESH_TOKEN_TTL_SECONDS",
    "PARLEY__AUTH__PASSWORD_HASH__MEMORY_KIB",
    "PARLEY__AUTH__PASSWORD_HASH__ITERATIONS",
    "PARLEY__AUTH__PASSWORD_HASH__PARALLELISM",
    "PARLEY__CHAT__DEFAULT_PAGE_SIZE",
    "PARLEY__CHAT__MAX_PAGE_SIZE",
    "PARLEY__CHAT__MAX_MESSAGE_LENGTH",
    "PARLEY__CHAT__MAX_CHAT_NAME_LENGTH",
];

struct TestContext {
    vars: Vec<(String, Option<String>)>,
    original_dir: Option<PathBuf>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            vars: Vec::new(),
            original_dir: None,
        }
    }

    fn reset_environment(&mut self) {
        for key in ENV_VARS_TO_RESET {
            self.remove_var(key);
        }
    }

    fn set_var(&mut self, key: &str, value: impl AsRef<str>) {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value.as_ref());
        self.vars.push((key.to_string(), previous));
    }

    fn remove_var(&mut self, key: &str) {
        let previous = std::env::var(key).ok();
        std::env::remove_var(key);
        self.vars.push((key.to_string(), previous));
    }

    fn set_current_dir(&mut self, dir: &Path) {
        if self.original_dir.is_none() {
            self.original_dir =
                Some(std::env::current_dir().expect("failed to capture current directory"));
        }
        std::env::set_current_dir(dir).expect("failed to set current directory");
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Some(original) = self.original_dir.take() {
            let _ = std::env::set_current_dir(original);
        }

        while let Some((key, value)) = self.vars.pop() {
            match value {
                Some(val) => std::env::set_var(&key, val),
                None => std::env::remove_var(&key),
            }
        }
    }
}

fn write_config_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create config directories");
    }
    fs::write(path, contents).expect("failed to write config file");
}

#[test]
#[serial]
fn load_uses_default_values_when_no_files_found() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    let config = load().expect("configuration load should succeed without files");
    let defaults = AppConfig::default();

    assert!(config.auth.jwt_secret.is_none());
    assert_eq!(config.auth.issuer, defaults.auth.issuer);
    assert_eq!(config.auth.access_token_ttl_seconds, 900);
    assert_eq!(config.auth.refresh_token_ttl_seconds, 604_800);
    assert_eq!(
        config.auth.password_hash.memory_kib,
        defaults.auth.password_hash.memory_kib
    );
    assert_eq!(config.chat.default_page_size, 50);
    assert_eq!(config.chat.max_page_size, 100);
}

#[test]
#[serial]
fn load_picks_first_available_file_in_search_order() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "parley.toml",
        r#"
        [auth]
        issuer = "first"
        "#,
    );
    write_config_file(
        temp_dir.path(),
        "config/parley.toml",
        r#"
        [auth]
        issuer = "second"
        "#,
    );

    let config = load().expect("configuration load should pick the first file");
    assert_eq!(config.auth.issuer, "first");
}

#[test]
#[serial]
fn load_merges_partial_file_with_defaults() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "config/parley.toml",
        r#"
        [auth]
        jwt_secret = "file-secret-that-is-at-least-32-bytes"

        [chat]
        max_message_length = 280
        "#,
    );

    let config = load().expect("configuration load should succeed");
    let defaults = AppConfig::default();

    assert_eq!(
        config.auth.jwt_secret.as_deref(),
        Some("file-secret-that-is-at-least-32-bytes")
    );
    assert_eq!(config.chat.max_message_length, 280);
    assert_eq!(config.chat.max_page_size, defaults.chat.max_page_size);
    assert_eq!(
        config.auth.access_token_ttl_seconds,
        defaults.auth.access_token_ttl_seconds
    );
}

#[test]
#[serial]
fn load_applies_environment_overrides_over_file() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "parley.toml",
        r#"
        [auth]
        access_token_ttl_seconds = 120
        "#,
    );
    ctx.set_var("PARLEY__AUTH__ACCESS_TOKEN_TTL_SECONDS", "60");
    ctx.set_var("PARLEY__AUTH__JWT_SECRET", "env-secret-that-is-at-least-32-bytes");

    let config = load().expect("configuration load should succeed");
    assert_eq!(config.auth.access_token_ttl_seconds, 60);
    assert_eq!(
        config.auth.jwt_secret.as_deref(),
        Some("env-secret-that-is-at-least-32-bytes")
    );
}

#[test]
#[serial]
fn load_honours_explicit_config_path() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "parley.toml",
        r#"
        [auth]
        issuer = "discovered"
        "#,
    );
    write_config_file(
        temp_dir.path(),
        "custom/elsewhere.toml",
        r#"
        [auth]
        issuer = "explicit"
        "#,
    );
    ctx.set_var(
        "PARLEY_CONFIG",
        temp_dir.path().join("custom/elsewhere.toml").display().to_string(),
    );

    let config = load().expect("configuration load should use PARLEY_CONFIG");
    assert_eq!(config.auth.issuer, "explicit");
}

#[test]
#[serial]
fn load_clamps_default_page_size_to_maximum() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    ctx.set_var("PARLEY__CHAT__DEFAULT_PAGE_SIZE", "500");
    ctx.set_var("PARLEY__CHAT__MAX_PAGE_SIZE", "200");

    let config = load().expect("configuration load should succeed");
    assert_eq!(config.chat.default_page_size, 200);
}

#[test]
#[serial]
fn load_rejects_zero_max_page_size() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    ctx.set_var("PARLEY__CHAT__MAX_PAGE_SIZE", "0");

    assert!(load().is_err());
}

#[test]
#[serial]
fn load_treats_blank_secret_as_missing() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    ctx.set_var("PARLEY__AUTH__JWT_SECRET", "   ");

    let config = load().expect("configuration load should succeed");
    assert!(config.auth.jwt_secret.is_none());
}

#[test]
fn debug_output_redacts_secret() {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = Some("super-secret-value".to_string());

    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("super-secret-value"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
#[serial]
fn load_from_prefers_explicit_path_over_environment() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "env.toml",
        r#"
        [auth]
        issuer = "from-env-path"
        "#,
    );
    write_config_file(
        temp_dir.path(),
        "flag.toml",
        r#"
        [auth]
        issuer = "from-flag"
        "#,
    );
    ctx.set_var(
        "PARLEY_CONFIG",
        temp_dir.path().join("env.toml").display().to_string(),
    );

    let config = load_from(Some(&temp_dir.path().join("flag.toml")))
        .expect("configuration load should use the explicit path");
    assert_eq!(config.auth.issuer, "from-flag");
}

#[test]
#[serial]
fn load_from_rejects_missing_explicit_path() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    assert!(load_from(Some(&temp_dir.path().join("absent.toml"))).is_err());
}
