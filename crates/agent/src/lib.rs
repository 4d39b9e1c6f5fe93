//! # Triage Agent
//!
//! Tool adapters and the reasoning loop that drives them.
//!
//! Each [`Tool`] exposes one local capability under a stable name and a
//! schemars-derived argument schema. Tool handlers never raise: every
//! failure is returned as a descriptive observation string, because the
//! consumer is an autonomous loop that can only reason over text it
//! receives. The [`AgentExecutor`] owns the loop mechanics — send the
//! task, dispatch requested tool calls, feed observations back — and
//! relays the model's final text answer to the caller.

mod error;
mod executor;
mod tool;
pub mod tools;

pub use error::{AgentError, Result};
pub use executor::{AgentConfig, AgentExecutor, AgentOutcome};
pub use tool::Tool;
