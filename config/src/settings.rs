//! Typed view of the sqlgraph environment keys.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = "sqlgraph.db";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_QUERY_ATTEMPTS: u32 = 8;

#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("invalid {key}={value:?}: {message}")]
    Invalid {
        key: &'static str,
        value: String,
        message: String,
    },
}

/// Runtime settings, read after [`load_and_apply`](crate::load_and_apply).
///
/// | key | default |
/// |-----|---------|
/// | `SQL_DB_PATH` | `sqlgraph.db` |
/// | `OPENAI_MODEL` | `gpt-4o-mini` |
/// | `OPENAI_API_KEY` | unset (client reads its own default) |
/// | `OPENAI_BASE_URL` | unset (api.openai.com) |
/// | `LLM_TEMPERATURE` | `0.0` |
/// | `MAX_QUERY_ATTEMPTS` | `8` |
/// | `RUN_TIMEOUT_SECS` | unset (no timeout) |
/// | `PROMPTS_DIR` | unset (embedded prompts) |
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_query_attempts: u32,
    pub run_timeout: Option<Duration>,
    pub prompts_dir: Option<PathBuf>,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            db_path: get("SQL_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL"),
            temperature: parse(get("LLM_TEMPERATURE"), "LLM_TEMPERATURE")?.unwrap_or(0.0),
            max_query_attempts: parse(get("MAX_QUERY_ATTEMPTS"), "MAX_QUERY_ATTEMPTS")?
                .unwrap_or(DEFAULT_MAX_QUERY_ATTEMPTS),
            run_timeout: parse::<u64>(get("RUN_TIMEOUT_SECS"), "RUN_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            prompts_dir: get("PROMPTS_DIR").map(PathBuf::from),
        })
    }
}

fn parse<T>(value: Option<String>, key: &'static str) -> Result<Option<T>, SettingsError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|e| SettingsError::Invalid {
                key,
                value: v.clone(),
                message: e.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.db_path, PathBuf::from("sqlgraph.db"));
        assert_eq!(s.model, "gpt-4o-mini");
        assert_eq!(s.api_key, None);
        assert_eq!(s.base_url, None);
        assert_eq!(s.temperature, 0.0);
        assert_eq!(s.max_query_attempts, 8);
        assert_eq!(s.run_timeout, None);
        assert_eq!(s.prompts_dir, None);
    }

    #[test]
    fn reads_every_key() {
        let s = settings(&[
            ("SQL_DB_PATH", "/data/shop.db"),
            ("OPENAI_MODEL", "llama3"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:11434/v1"),
            ("LLM_TEMPERATURE", "0.2"),
            ("MAX_QUERY_ATTEMPTS", " 3 "),
            ("RUN_TIMEOUT_SECS", "90"),
            ("PROMPTS_DIR", "./prompts"),
        ])
        .unwrap();
        assert_eq!(s.db_path, PathBuf::from("/data/shop.db"));
        assert_eq!(s.model, "llama3");
        assert_eq!(s.api_key.as_deref(), Some("sk-test"));
        assert_eq!(s.base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(s.temperature, 0.2);
        assert_eq!(s.max_query_attempts, 3);
        assert_eq!(s.run_timeout, Some(Duration::from_secs(90)));
        assert_eq!(s.prompts_dir, Some(PathBuf::from("./prompts")));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let s = settings(&[("OPENAI_API_KEY", ""), ("MAX_QUERY_ATTEMPTS", "  ")]).unwrap();
        assert_eq!(s.api_key, None);
        assert_eq!(s.max_query_attempts, 8);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = settings(&[("MAX_QUERY_ATTEMPTS", "many")]).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid { key: "MAX_QUERY_ATTEMPTS", .. }
        ));
        assert!(settings(&[("RUN_TIMEOUT_SECS", "-1")]).is_err());
        assert!(settings(&[("LLM_TEMPERATURE", "warm")]).is_err());
    }
}
