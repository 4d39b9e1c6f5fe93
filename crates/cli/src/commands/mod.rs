use crate::config::RunConfig;
use triage_llm::{ChatRequest, Message};
use triage_prompt::RenderedPrompt;

pub mod agents;
pub mod analyze;
pub mod ask;
pub mod index;
pub mod scan;

/// A rendered prompt as a single-turn chat request.
pub(crate) fn chat_request(config: &RunConfig, rendered: &RenderedPrompt) -> ChatRequest {
    let mut messages = Vec::new();
    if let Some(system) = &rendered.system {
        messages.push(Message::system(system.clone()));
    }
    messages.push(Message::user(rendered.user.clone()));
    ChatRequest {
        model: config.model.clone(),
        messages,
        max_tokens: config.max_tokens,
        temperature: Some(config.temperature),
        tools: Vec::new(),
    }
}
