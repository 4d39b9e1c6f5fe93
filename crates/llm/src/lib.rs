//! # Triage LLM
//!
//! Client for the hosted chat model behind the review pipelines.
//!
//! [`LlmClient`] is the seam every orchestrator talks through: one call per
//! request, optionally streamed. Streamed completions deliver text
//! fragments to a callback in arrival order — a finite sequence, consumed
//! once, never restartable. The bundled [`AnthropicClient`] speaks the
//! messages API with SSE streaming, native tool-use blocks and bounded
//! retry on transient failures.

mod anthropic;
mod error;
mod retry;
mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use error::{LlmError, Result};
pub use types::{
    ChatRequest, ChatResponse, ContentBlock, LlmClient, Message, MessageRole, StreamDeltaHandler,
    ToolDefinition,
};
