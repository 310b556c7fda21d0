//! Load configuration from XDG `config.toml` and project `.env`, then apply to the process
//! environment with priority: **existing env > .env > XDG**.
//!
//! [`Settings::from_env`] then reads the sqlgraph keys (database path, model, loop
//! bounds) from the resulting environment.

mod dotenv;
mod settings;
mod xdg_toml;

use std::path::Path;
use thiserror::Error;

pub use settings::{Settings, SettingsError, DEFAULT_DB_PATH, DEFAULT_MODEL};

/// Application name used for the XDG config directory.
pub const APP_NAME: &str = "sqlgraph";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    Dotenv(String),
}

/// Loads config from XDG `config.toml` and optional project `.env`, then sets environment
/// variables only for keys that are **not** already set (so existing env has highest priority).
///
/// Order of precedence when a key is missing in the process environment:
/// 1. Value from project `.env` (current directory or `override_dir` if given)
/// 2. Value from `$XDG_CONFIG_HOME/<app_name>/config.toml` `[env]` table
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv::load_env_map(override_dir)?;

    let mut keys: std::collections::HashSet<&String> = xdg_map.keys().collect();
    keys.extend(dotenv_map.keys());

    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        if let Some(v) = dotenv_map.get(key).or_else(|| xdg_map.get(key)) {
            std::env::set_var(key, v);
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    /// Serializes tests that mutate the process environment.
    pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn restore_var(key: &str, prev: Option<String>) {
        match prev {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }
    }

    /// Points XDG at a temp dir holding `sqlgraph/config.toml` with `body`.
    fn xdg_with(body: &str) -> tempfile::TempDir {
        let xdg_dir = tempfile::tempdir().unwrap();
        let app_dir = xdg_dir.path().join(APP_NAME);
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.toml"), body).unwrap();
        xdg_dir
    }

    #[test]
    fn existing_env_wins() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dotenv_dir.path().join(".env"),
            "CONFIG_TEST_EXISTING=from_dotenv\n",
        )
        .unwrap();
        env::set_var("CONFIG_TEST_EXISTING", "from_env");
        load_and_apply("config-crate-nonexistent-app-xyz", Some(dotenv_dir.path())).unwrap();
        assert_eq!(env::var("CONFIG_TEST_EXISTING").as_deref(), Ok("from_env"));
        env::remove_var("CONFIG_TEST_EXISTING");
    }

    #[test]
    fn dotenv_overrides_xdg() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let xdg_dir = xdg_with("[env]\nCONFIG_TEST_PRIORITY = \"from_xdg\"\n");
        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dotenv_dir.path().join(".env"),
            "CONFIG_TEST_PRIORITY=from_dotenv\n",
        )
        .unwrap();

        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
        env::remove_var("CONFIG_TEST_PRIORITY");

        let result = load_and_apply(APP_NAME, Some(dotenv_dir.path()));
        let val = env::var("CONFIG_TEST_PRIORITY");
        env::remove_var("CONFIG_TEST_PRIORITY");
        restore_var("XDG_CONFIG_HOME", prev_xdg);

        result.unwrap();
        assert_eq!(val.as_deref(), Ok("from_dotenv"));
    }

    #[test]
    fn xdg_applied_when_no_dotenv() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let xdg_dir = xdg_with("[env]\nCONFIG_TEST_XDG_ONLY = \"from_xdg\"\n");
        let empty_dir = tempfile::tempdir().unwrap();

        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
        env::remove_var("CONFIG_TEST_XDG_ONLY");

        let result = load_and_apply(APP_NAME, Some(empty_dir.path()));
        let val = env::var("CONFIG_TEST_XDG_ONLY");
        env::remove_var("CONFIG_TEST_XDG_ONLY");
        restore_var("XDG_CONFIG_HOME", prev_xdg);

        result.unwrap();
        assert_eq!(val.as_deref(), Ok("from_xdg"));
    }

    #[test]
    fn invalid_xdg_toml_fails_with_xdg_parse_error() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let xdg_dir = xdg_with("invalid [[[\n");
        let empty_dir = tempfile::tempdir().unwrap();

        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
        let result = load_and_apply(APP_NAME, Some(empty_dir.path()));
        restore_var("XDG_CONFIG_HOME", prev_xdg);

        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }
}
