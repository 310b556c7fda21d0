//! Load SQL agent prompts from a directory and merge them over the embedded defaults.
//!
//! **Canonical source**: default prompt text lives in `sqlgraph/prompts/sql.yaml`; it is
//! embedded at compile time and used when no `PROMPTS_DIR` or directory is present.

use std::path::{Path, PathBuf};

use super::{SqlPrompts, SqlPromptsFile};

/// Embedded default YAML (canonical source: `sqlgraph/prompts/*.yaml`).
macro_rules! embed_prompt_yaml {
    ($name:literal) => {
        include_str!(concat!("../../prompts/", $name))
    };
}
const EMBED_SQL: &str = embed_prompt_yaml!("sql.yaml");

/// Error when loading prompts from a directory (missing dir, invalid YAML).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("prompts directory not found or not readable: {0}")]
    DirNotFound(String),
    #[error("failed to read prompts file {path}: {message}")]
    ReadFile { path: String, message: String },
    #[error("failed to parse YAML in {path}: {message}")]
    ParseYaml { path: String, message: String },
}

const SQL_FILE: &str = "sql.yaml";

/// Default directory name when `PROMPTS_DIR` is not set.
const DEFAULT_PROMPTS_DIR: &str = "prompts";

/// `dir` if `Some`, else `PROMPTS_DIR` env, else `./prompts`.
fn prompts_dir(dir: Option<&Path>) -> PathBuf {
    dir.map(PathBuf::from).unwrap_or_else(|| {
        std::env::var("PROMPTS_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPTS_DIR))
    })
}

fn embedded_file() -> SqlPromptsFile {
    serde_yaml::from_str(EMBED_SQL).unwrap_or_default()
}

/// Reads `sql.yaml` from `dir`. A missing file is `Ok(None)`.
fn read_yaml_file(dir: &Path) -> Result<Option<SqlPromptsFile>, LoadError> {
    let path = dir.join(SQL_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(LoadError::ReadFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };
    let value = serde_yaml::from_str(&content).map_err(|e| LoadError::ParseYaml {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(Some(value))
}

/// Loads prompts from a directory: keys present in `sql.yaml` override the embedded defaults.
///
/// If `dir` is `None`, uses `PROMPTS_DIR` env or `./prompts`. A missing `sql.yaml`
/// keeps every default. Errors only when the directory is missing or the file is invalid.
pub fn load(dir: Option<&Path>) -> Result<SqlPrompts, LoadError> {
    let base = prompts_dir(dir);
    if !base.is_dir() {
        return Err(LoadError::DirNotFound(base.display().to_string()));
    }
    let file = read_yaml_file(&base)?.unwrap_or_default();
    tracing::debug!(dir = %base.display(), "loaded prompts");
    Ok(SqlPrompts::from(file.or(embedded_file())))
}

/// Default prompts parsed from the embedded YAML.
pub fn default_from_embedded() -> SqlPrompts {
    SqlPrompts::from(embedded_file())
}

/// Loads prompts from `dir` if it exists; otherwise the embedded defaults.
pub fn load_or_default(dir: Option<&Path>) -> SqlPrompts {
    load(dir).unwrap_or_else(|_| default_from_embedded())
}
