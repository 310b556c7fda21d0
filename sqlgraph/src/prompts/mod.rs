//! SQL agent prompts loaded from YAML (optional override for the embedded defaults).
//!
//! See [`SqlPrompts`] and [`load`]. Placeholders use `{name}` and are filled by the
//! `SqlPrompts` helpers, never by the nodes directly.

mod load;

use serde::Deserialize;

pub use load::{default_from_embedded, load, load_or_default, LoadError};

/// YAML shape of `prompts/sql.yaml`. All keys optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SqlPromptsFile {
    pub query_checker_system: Option<String>,
    pub query_generator_system: Option<String>,
    pub final_answer_system: Option<String>,
    pub tool_error_template: Option<String>,
    pub wrong_tool_template: Option<String>,
    pub no_answer_fallback: Option<String>,
}

impl SqlPromptsFile {
    /// Fields set in `self` win; the rest come from `base`.
    fn or(self, base: SqlPromptsFile) -> SqlPromptsFile {
        SqlPromptsFile {
            query_checker_system: self.query_checker_system.or(base.query_checker_system),
            query_generator_system: self.query_generator_system.or(base.query_generator_system),
            final_answer_system: self.final_answer_system.or(base.final_answer_system),
            tool_error_template: self.tool_error_template.or(base.tool_error_template),
            wrong_tool_template: self.wrong_tool_template.or(base.wrong_tool_template),
            no_answer_fallback: self.no_answer_fallback.or(base.no_answer_fallback),
        }
    }
}

/// Resolved prompt set used by the nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct SqlPrompts {
    pub query_checker_system: String,
    pub query_generator_system: String,
    pub final_answer_system: String,
    pub tool_error_template: String,
    pub wrong_tool_template: String,
    pub no_answer_fallback: String,
}

impl Default for SqlPrompts {
    fn default() -> Self {
        default_from_embedded()
    }
}

impl From<SqlPromptsFile> for SqlPrompts {
    fn from(file: SqlPromptsFile) -> Self {
        Self {
            query_checker_system: file.query_checker_system.unwrap_or_default(),
            query_generator_system: file.query_generator_system.unwrap_or_default(),
            final_answer_system: file.final_answer_system.unwrap_or_default(),
            tool_error_template: file.tool_error_template.unwrap_or_default(),
            wrong_tool_template: file.wrong_tool_template.unwrap_or_default(),
            no_answer_fallback: file.no_answer_fallback.unwrap_or_default(),
        }
    }
}

/// Fills `{name}` placeholders in one pass; substituted text is never rescanned.
/// Unknown placeholders and stray braces are kept as written.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = vars
            .iter()
            .find(|(name, _)| tail.starts_with(*name) && tail[name.len()..].starts_with('}'));
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

impl SqlPrompts {
    /// System prompt for `generate_query` with the schema filled in.
    pub fn query_generator(&self, table_info: &str) -> String {
        fill(&self.query_generator_system, &[("table_info", table_info)])
    }

    /// System prompt for `give_final_answer`.
    pub fn final_answer(&self, question: &str, sql_result: &str) -> String {
        fill(
            &self.final_answer_system,
            &[("question", question), ("sql_result", sql_result)],
        )
    }

    /// Content of a fallback tool message for a raised tool error.
    pub fn tool_error(&self, error: &str) -> String {
        fill(&self.tool_error_template, &[("error", error)])
    }

    /// Content of the error tool message for a call to anything but the final-answer tool.
    pub fn wrong_tool(&self, tool_name: &str) -> String {
        fill(&self.wrong_tool_template, &[("tool_name", tool_name)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_generator_fills_table_info() {
        let p = SqlPrompts::default();
        let s = p.query_generator("CREATE TABLE customers (id INTEGER)");
        assert!(s.contains("CREATE TABLE customers (id INTEGER)"));
        assert!(!s.contains("{table_info}"));
        assert!(s.contains("DO NOT call any tool besides SubmitFinalAnswer"));
    }

    #[test]
    fn final_answer_fills_question_and_result() {
        let p = SqlPrompts::default();
        let s = p.final_answer("How many customers are there?", "42");
        assert!(s.contains("Question: How many customers are there?"));
        assert!(s.contains("SQL Result: 42"));
    }

    /// **Scenario**: placeholder text inside a filled value stays literal.
    #[test]
    fn final_answer_does_not_rescan_the_question() {
        let p = SqlPrompts::default();
        let s = p.final_answer("what does {sql_result} mean?", "42");
        assert!(s.contains("Question: what does {sql_result} mean?"), "{}", s);
        assert!(s.contains("SQL Result: 42"), "{}", s);
    }

    #[test]
    fn fill_keeps_unknown_placeholders_and_stray_braces() {
        assert_eq!(
            fill("{a} {b} {a", &[("a", "1"), ("b", "{a}")]),
            "1 {a} {a"
        );
        assert_eq!(fill("{}{ a}", &[("a", "x")]), "{}{ a}");
        assert_eq!(fill("{ab}", &[("a", "x")]), "{ab}");
    }

    /// **Scenario**: error templates render the exact texts the model is trained on by the prompt.
    #[test]
    fn error_templates_render_exact_text() {
        let p = SqlPrompts::default();
        assert_eq!(
            p.tool_error("no such table: x"),
            "Error: no such table: x\n please fix your mistakes."
        );
        assert_eq!(
            p.wrong_tool("db_query_tool"),
            "Error: The wrong tool was called: db_query_tool. Please fix your mistakes. \
             Remember to only call SubmitFinalAnswer to submit the final answer. \
             Generated queries should be outputted WITHOUT a tool call."
        );
    }

    #[test]
    fn file_fields_override_base() {
        let over = SqlPromptsFile {
            final_answer_system: Some("short".into()),
            ..Default::default()
        };
        let base = SqlPromptsFile {
            final_answer_system: Some("long".into()),
            query_checker_system: Some("check".into()),
            ..Default::default()
        };
        let merged = SqlPrompts::from(over.or(base));
        assert_eq!(merged.final_answer_system, "short");
        assert_eq!(merged.query_checker_system, "check");
        assert_eq!(merged.tool_error_template, "");
    }
}
