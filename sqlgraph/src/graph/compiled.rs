//! Compiled state graph: immutable, supports invoke and stream.
//!
//! Built by `StateGraph::compile`. Holds nodes, the entry node id and, per node,
//! either its fixed successor or its conditional router.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::stream::StreamEvent;

use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_node_state, log_routing, log_state_update, log_stream_closed,
};
use super::state_graph::END;
use super::{GraphState, NextEntry, Node};

/// Compiled graph: immutable structure, runs from the entry node until END.
///
/// Each run owns its state; the graph itself can be shared by concurrent runs.
#[derive(Clone)]
pub struct CompiledStateGraph<S: GraphState> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// First node to run (from START).
    pub(super) first_node_id: String,
    /// Map from node id to how to get next: Unconditional(to_id) or Conditional(router).
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    /// Maximum node executions per run.
    pub(super) recursion_limit: usize,
}

impl<S: GraphState> CompiledStateGraph<S> {
    /// Id of the node that runs first.
    pub fn entry(&self) -> &str {
        &self.first_node_id
    }

    /// Registered node ids, sorted.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    fn resolve_next(&self, current_id: &str, state: &S) -> Result<String, AgentError> {
        match self.next_map.get(current_id) {
            Some(NextEntry::Conditional(router)) => {
                let target = router.resolve_next(state);
                if target != END && !self.nodes.contains_key(&target) {
                    return Err(AgentError::ExecutionFailed(format!(
                        "router after {} returned unknown node: {}",
                        current_id, target
                    )));
                }
                log_routing(current_id, &target, true);
                Ok(target)
            }
            Some(NextEntry::Unconditional(target)) => {
                log_routing(current_id, target, false);
                Ok(target.clone())
            }
            None => Err(AgentError::ExecutionFailed(format!(
                "no outgoing edge from {}",
                current_id
            ))),
        }
    }

    /// Shared run loop used by invoke() and stream(): steps through nodes until END.
    ///
    /// Returns the number of node executions. With `tx`, a failed send means the
    /// receiver is gone and the run stops there.
    async fn run_loop_inner(
        &self,
        state: &mut S,
        tx: Option<&mpsc::Sender<StreamEvent<S>>>,
    ) -> Result<usize, AgentError> {
        let mut current_id = self.first_node_id.clone();
        let mut steps = 0usize;
        log_graph_start(&current_id);

        loop {
            if steps >= self.recursion_limit {
                return Err(AgentError::RecursionLimit(self.recursion_limit));
            }
            steps += 1;

            let node = self.nodes.get(&current_id).cloned().ok_or_else(|| {
                AgentError::ExecutionFailed(format!("node not found: {}", current_id))
            })?;

            log_node_start(&current_id, steps);
            log_node_state(&current_id, state);
            if let Some(tx) = tx {
                let sent = tx
                    .send(StreamEvent::TaskStart {
                        node_id: current_id.clone(),
                    })
                    .await;
                if sent.is_err() {
                    log_stream_closed(&current_id, steps - 1);
                    return Ok(steps - 1);
                }
            }

            let update = node.run(state).await?;
            log_node_complete(&current_id, &update);

            state.apply(update);
            log_state_update(&current_id);

            if let Some(tx) = tx {
                let sent = tx
                    .send(StreamEvent::Updates {
                        node_id: current_id.clone(),
                        state: state.clone(),
                    })
                    .await;
                if sent.is_err() {
                    log_stream_closed(&current_id, steps);
                    return Ok(steps);
                }
            }

            let next_id = self.resolve_next(&current_id, state)?;
            if next_id == END {
                break;
            }
            current_id = next_id;
        }

        log_graph_complete(steps);
        Ok(steps)
    }

    /// Runs the graph to completion and returns the final state.
    ///
    /// Any node error aborts the run and is returned unchanged.
    pub async fn invoke(&self, state: S) -> Result<S, AgentError> {
        if self.nodes.is_empty() {
            return Err(AgentError::ExecutionFailed("empty graph".into()));
        }
        let mut state = state;
        match self.run_loop_inner(&mut state, None).await {
            Ok(_) => Ok(state),
            Err(e) => {
                log_graph_error(&e);
                Err(e)
            }
        }
    }

    /// Streams graph execution, emitting events via channel-backed Stream.
    ///
    /// The run happens on a spawned task. Dropping the stream stops the run before
    /// the next node starts; a node already running finishes first.
    pub fn stream(&self, state: S) -> ReceiverStream<StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();

        tokio::spawn(async move {
            let mut state = state;
            if graph.nodes.is_empty() {
                let _ = tx.send(StreamEvent::Error("empty graph".into())).await;
                return;
            }
            if let Err(e) = graph.run_loop_inner(&mut state, Some(&tx)).await {
                log_graph_error(&e);
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
            }
        });

        ReceiverStream::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{StateGraph, START};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_stream::StreamExt;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Counter(i32);

    impl GraphState for Counter {
        type Update = i32;

        fn apply(&mut self, update: i32) {
            self.0 += update;
        }
    }

    struct AddNode {
        id: &'static str,
        delta: i32,
    }

    #[async_trait]
    impl Node<Counter> for AddNode {
        fn id(&self) -> &str {
            self.id
        }

        async fn run(&self, _state: &Counter) -> Result<i32, AgentError> {
            Ok(self.delta)
        }
    }

    struct FailNode;

    #[async_trait]
    impl Node<Counter> for FailNode {
        fn id(&self) -> &str {
            "fail"
        }

        async fn run(&self, _state: &Counter) -> Result<i32, AgentError> {
            Err(AgentError::InvalidState("boom".into()))
        }
    }

    struct TickNode {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Node<Counter> for TickNode {
        fn id(&self) -> &str {
            "tick"
        }

        async fn run(&self, _state: &Counter) -> Result<i32, AgentError> {
            tokio::task::yield_now().await;
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    fn add(id: &'static str, delta: i32) -> Arc<dyn Node<Counter>> {
        Arc::new(AddNode { id, delta })
    }

    /// **Scenario**: With no nodes, invoke returns ExecutionFailed("empty graph").
    #[tokio::test]
    async fn invoke_empty_graph_returns_execution_failed() {
        let graph = CompiledStateGraph::<Counter> {
            nodes: HashMap::new(),
            first_node_id: String::new(),
            next_map: HashMap::new(),
            recursion_limit: 10,
        };
        match graph.invoke(Counter::default()).await {
            Err(AgentError::ExecutionFailed(msg)) => assert!(msg.contains("empty graph")),
            other => panic!("expected empty graph error, got {:?}", other),
        }
    }

    /// **Scenario**: a linear chain applies every update in order.
    #[tokio::test]
    async fn invoke_linear_chain_applies_updates() {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("first", add("first", 1))
            .add_node("second", add("second", 2))
            .add_edge(START, "first")
            .add_edge("first", "second")
            .add_edge("second", END);
        let compiled = graph.compile().expect("graph compiles");
        let out = compiled.invoke(Counter(0)).await.unwrap();
        assert_eq!(out, Counter(3));
    }

    /// **Scenario**: Graph with conditional edges loops until the router sends it to END.
    #[tokio::test]
    async fn invoke_conditional_edges_routes_by_state() {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("inc", add("inc", 1))
            .add_edge(START, "inc")
            .add_conditional_edges(
                "inc",
                Arc::new(|s: &Counter| {
                    if s.0 >= 5 {
                        "done".to_string()
                    } else {
                        "again".to_string()
                    }
                }),
                Some(
                    [
                        ("done".to_string(), END.to_string()),
                        ("again".to_string(), "inc".to_string()),
                    ]
                    .into(),
                ),
            );
        let compiled = graph.compile().expect("graph compiles");
        assert_eq!(compiled.invoke(Counter(0)).await.unwrap(), Counter(5));
    }

    /// **Scenario**: a loop that never exits stops at the recursion limit.
    #[tokio::test]
    async fn invoke_stops_at_recursion_limit() {
        let mut graph = StateGraph::<Counter>::new().with_recursion_limit(4);
        graph
            .add_node("spin", add("spin", 1))
            .add_edge(START, "spin")
            .add_conditional_edges("spin", Arc::new(|_: &Counter| "spin".to_string()), None);
        let compiled = graph.compile().expect("graph compiles");
        match compiled.invoke(Counter(0)).await {
            Err(AgentError::RecursionLimit(4)) => {}
            other => panic!("expected RecursionLimit(4), got {:?}", other),
        }
    }

    /// **Scenario**: a router key that names no node aborts the run.
    #[tokio::test]
    async fn invoke_fails_on_unknown_router_target() {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("a", add("a", 1))
            .add_edge(START, "a")
            .add_conditional_edges("a", Arc::new(|_: &Counter| "nowhere".to_string()), None);
        let compiled = graph.compile().expect("graph compiles");
        match compiled.invoke(Counter(0)).await {
            Err(AgentError::ExecutionFailed(msg)) => assert!(msg.contains("nowhere"), "{}", msg),
            other => panic!("expected ExecutionFailed, got {:?}", other),
        }
    }

    /// **Scenario**: node errors propagate unchanged.
    #[tokio::test]
    async fn invoke_propagates_node_error() {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("fail", Arc::new(FailNode))
            .add_edge(START, "fail")
            .add_edge("fail", END);
        let compiled = graph.compile().expect("graph compiles");
        assert!(matches!(
            compiled.invoke(Counter(0)).await,
            Err(AgentError::InvalidState(_))
        ));
    }

    /// **Scenario**: stream emits TaskStart then Updates per node, with merged state.
    #[tokio::test]
    async fn stream_emits_task_start_and_updates() {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("first", add("first", 1))
            .add_node("second", add("second", 2))
            .add_edge(START, "first")
            .add_edge("first", "second")
            .add_edge("second", END);
        let compiled = graph.compile().expect("graph compiles");
        let events: Vec<_> = compiled.stream(Counter(0)).collect().await;
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], StreamEvent::TaskStart { node_id } if node_id == "first"));
        assert!(
            matches!(&events[3], StreamEvent::Updates { node_id, state } if node_id == "second" && *state == Counter(3))
        );
    }

    /// **Scenario**: a failing node ends the stream with an Error event.
    #[tokio::test]
    async fn stream_ends_with_error_event() {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("fail", Arc::new(FailNode))
            .add_edge(START, "fail")
            .add_edge("fail", END);
        let compiled = graph.compile().expect("graph compiles");
        let events: Vec<_> = compiled.stream(Counter(0)).collect().await;
        assert!(matches!(events.last(), Some(StreamEvent::Error(msg)) if msg.contains("boom")));
    }

    /// **Scenario**: dropping the stream stops an endless loop instead of letting it
    /// run to the recursion limit in the background.
    #[tokio::test]
    async fn dropping_stream_stops_the_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut graph = StateGraph::<Counter>::new().with_recursion_limit(10_000);
        graph
            .add_node("tick", Arc::new(TickNode { runs: runs.clone() }))
            .add_edge(START, "tick")
            .add_conditional_edges("tick", Arc::new(|_: &Counter| "tick".to_string()), None);
        let compiled = graph.compile().expect("graph compiles");

        let mut stream = compiled.stream(Counter(0));
        assert!(matches!(
            stream.next().await,
            Some(StreamEvent::TaskStart { node_id }) if node_id == "tick"
        ));
        drop(stream);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let settled = runs.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), settled);
        // Bounded by the channel buffer, far below the recursion limit.
        assert!(settled <= 128, "ran {} nodes after the consumer left", settled);
    }
}
