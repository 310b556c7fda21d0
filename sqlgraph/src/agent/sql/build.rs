//! Wires the SQL agent nodes into a compiled state graph.

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::{
    CompilationError, CompiledStateGraph, StateGraph, DEFAULT_RECURSION_LIMIT, END, START,
};
use crate::llm::LlmClient;
use crate::prompts::SqlPrompts;
use crate::state::SqlAgentState;
use crate::tool_source::{
    ToolSource, TOOL_DB_QUERY, TOOL_SQL_DB_LIST_TABLES, TOOL_SQL_DB_SCHEMA,
};

use super::{
    route_after_generate_query, CorrectQueryNode, FirstToolCallNode, GenerateQueryNode,
    GetSchemaNode, GiveFinalAnswerNode, IterationLimitPolicy, Route, ToolNode, CORRECT_QUERY,
    DEFAULT_MAX_QUERY_ATTEMPTS, EXECUTE_QUERY, FIRST_TOOL_CALL, GENERATE_QUERY, GET_SCHEMA,
    GET_SCHEMA_TOOL, GIVE_FINAL_ANSWER, LIST_TABLES_TOOL,
};

/// Loop bounds for one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlGraphOptions {
    /// `generate_query` executions before `iteration_policy` applies.
    pub max_query_attempts: u32,
    pub iteration_policy: IterationLimitPolicy,
    /// Node executions per run before `AgentError::RecursionLimit`.
    pub recursion_limit: usize,
}

impl Default for SqlGraphOptions {
    fn default() -> Self {
        Self {
            max_query_attempts: DEFAULT_MAX_QUERY_ATTEMPTS,
            iteration_policy: IterationLimitPolicy::default(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

/// Builds and compiles the SQL agent graph.
///
/// `tools` backs all three tool nodes, each bound to one tool name; `table_info` is baked into the
/// `generate_query` system prompt, so build one graph per run to pick up schema
/// changes.
pub fn build_sql_agent_graph(
    llm: Arc<dyn LlmClient>,
    tools: Arc<dyn ToolSource>,
    prompts: Arc<SqlPrompts>,
    table_info: impl Into<String>,
    options: SqlGraphOptions,
) -> Result<CompiledStateGraph<SqlAgentState>, CompilationError> {
    let tool_node = |id: &str, tool: &str| -> Arc<ToolNode> {
        Arc::new(ToolNode::new(id, tools.clone(), &[tool], prompts.clone()))
    };

    let generate_query = GenerateQueryNode::new(llm.clone(), prompts.clone(), table_info)
        .with_max_attempts(options.max_query_attempts)
        .with_policy(options.iteration_policy);

    let mut graph =
        StateGraph::<SqlAgentState>::new().with_recursion_limit(options.recursion_limit);
    graph
        .add_node(FIRST_TOOL_CALL, Arc::new(FirstToolCallNode))
        .add_node(LIST_TABLES_TOOL, tool_node(LIST_TABLES_TOOL, TOOL_SQL_DB_LIST_TABLES))
        .add_node(GET_SCHEMA, Arc::new(GetSchemaNode::new(llm.clone())))
        .add_node(GET_SCHEMA_TOOL, tool_node(GET_SCHEMA_TOOL, TOOL_SQL_DB_SCHEMA))
        .add_node(GENERATE_QUERY, Arc::new(generate_query))
        .add_node(
            CORRECT_QUERY,
            Arc::new(CorrectQueryNode::new(llm.clone(), prompts.clone())),
        )
        .add_node(EXECUTE_QUERY, tool_node(EXECUTE_QUERY, TOOL_DB_QUERY))
        .add_node(
            GIVE_FINAL_ANSWER,
            Arc::new(GiveFinalAnswerNode::new(llm, prompts.clone())),
        );

    let path_map: HashMap<String, String> = [
        Route::CorrectQuery,
        Route::GenerateQuery,
        Route::GiveFinalAnswer,
    ]
    .iter()
    .map(|r| (r.as_str().to_string(), r.as_str().to_string()))
    .collect();

    graph
        .add_edge(START, FIRST_TOOL_CALL)
        .add_edge(FIRST_TOOL_CALL, LIST_TABLES_TOOL)
        .add_edge(LIST_TABLES_TOOL, GET_SCHEMA)
        .add_edge(GET_SCHEMA, GET_SCHEMA_TOOL)
        .add_edge(GET_SCHEMA_TOOL, GENERATE_QUERY)
        .add_conditional_edges(
            GENERATE_QUERY,
            Arc::new(|s: &SqlAgentState| route_after_generate_query(s).as_str().to_string()),
            Some(path_map),
        )
        .add_edge(CORRECT_QUERY, EXECUTE_QUERY)
        .add_edge(EXECUTE_QUERY, GENERATE_QUERY)
        .add_edge(GIVE_FINAL_ANSWER, END);

    graph.compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::tool_source::MockToolSource;

    #[test]
    fn graph_compiles_with_every_node() {
        let graph = build_sql_agent_graph(
            Arc::new(MockLlm::with_no_tool_calls("")),
            Arc::new(MockToolSource::new(&[], "")),
            Arc::new(SqlPrompts::default()),
            "",
            SqlGraphOptions::default(),
        )
        .unwrap();
        assert_eq!(graph.entry(), "first_tool_call");
        assert_eq!(
            graph.node_ids(),
            vec![
                "correct_query",
                "execute_query",
                "first_tool_call",
                "generate_query",
                "get_schema",
                "get_schema_tool",
                "give_final_answer",
                "list_tables_tool",
            ]
        );
    }

    #[test]
    fn default_options() {
        let options = SqlGraphOptions::default();
        assert_eq!(options.max_query_attempts, 8);
        assert_eq!(options.recursion_limit, 50);
        assert_eq!(options.iteration_policy, IterationLimitPolicy::BestEffort);
    }
}
