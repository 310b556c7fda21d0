//! State types for the SQL agent graph.
//!
//! # Main types
//!
//! - [`SqlAgentState`]: messages, the captured question and the query attempt counter.
//! - [`StateUpdate`]: the closed set of partial updates nodes return.
//!
//! # Example
//!
//! ```rust
//! use sqlgraph::{Message, SqlAgentState};
//!
//! let state = SqlAgentState::from_history(vec![Message::user("How many customers are there?")]);
//! assert_eq!(state.last_user_message(), Some("How many customers are there?"));
//! ```

pub mod sql_agent_state;

pub use sql_agent_state::{SqlAgentState, StateUpdate};
