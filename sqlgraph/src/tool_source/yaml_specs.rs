//! YAML-backed tool specs.
//!
//! Each tool has one file under `sqlgraph/tools/*.yaml`, embedded at compile time
//! via `include_str!` and parsed on demand. Add a line to `TOOL_YAML_FILES` when
//! adding a tool YAML.

use thiserror::Error;

use crate::tool_source::ToolSpec;

macro_rules! embed_tool_yaml {
    ($($path:literal),+ $(,)?) => {
        &[ $( include_str!($path) ),+ ]
    };
}

const TOOL_YAML_FILES: &[&str] = embed_tool_yaml!(
    "../../tools/sql_db_list_tables.yaml",
    "../../tools/sql_db_schema.yaml",
    "../../tools/db_query_tool.yaml",
    "../../tools/submit_final_answer.yaml",
);

/// Errors from loading embedded tool specs.
#[derive(Debug, Error)]
pub enum YamlSpecError {
    #[error("failed to parse tool YAML ({name}): {message}")]
    Parse { name: String, message: String },
    #[error("no tool spec named {0}")]
    Missing(String),
}

/// Parses every embedded tool spec.
pub fn load_tool_specs() -> Result<Vec<ToolSpec>, YamlSpecError> {
    let mut specs = Vec::with_capacity(TOOL_YAML_FILES.len());
    for (i, yaml_str) in TOOL_YAML_FILES.iter().enumerate() {
        let spec: ToolSpec = serde_yaml::from_str(yaml_str).map_err(|e| YamlSpecError::Parse {
            name: format!("file_{}", i),
            message: e.to_string(),
        })?;
        specs.push(spec);
    }
    Ok(specs)
}

/// One embedded spec by tool name.
pub fn tool_spec(name: &str) -> Result<ToolSpec, YamlSpecError> {
    load_tool_specs()?
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| YamlSpecError::Missing(name.to_string()))
}
