use crate::error::{LlmError, Result};
use crate::retry::{is_retryable_error, parse_retry_after_ms, retry_delay_ms, should_retry_status};
use crate::types::{
    ChatRequest, ChatResponse, ContentBlock, LlmClient, Message, MessageRole, StreamDeltaHandler,
    ToolDefinition,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4_096;

/// Connection settings for the messages API.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Base URL; override to point at a gateway
    pub api_base: String,
    pub api_key: String,
    pub timeout: Duration,
    pub max_retries: usize,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(120),
            max_retries: 3,
        }
    }
}

/// Messages-API client with SSE streaming and bounded retry.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(config.api_key.trim())
                .map_err(|err| LlmError::invalid(format!("invalid API key header: {err}")))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.config.api_base.trim_end_matches('/'))
    }

    /// POST with retry on 408/429/5xx and transient transport failures.
    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        let url = self.messages_url();
        let mut attempt = 0usize;

        loop {
            let outcome = self.client.post(&url).json(body).send().await;
            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let retry_after = parse_retry_after_ms(response.headers());
                    let raw = response.text().await.unwrap_or_default();
                    if attempt < self.config.max_retries && should_retry_status(status.as_u16()) {
                        let delay = retry_delay_ms(attempt, retry_after);
                        log::warn!(
                            "model call returned {status}, retrying in {delay}ms (attempt {})",
                            attempt + 1
                        );
                        sleep(Duration::from_millis(delay)).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(LlmError::HttpStatus {
                        status: status.as_u16(),
                        body: raw,
                    });
                }
                Err(error) => {
                    if attempt < self.config.max_retries && is_retryable_error(&error) {
                        let delay = retry_delay_ms(attempt, None);
                        log::warn!(
                            "model call failed ({error}), retrying in {delay}ms (attempt {})",
                            attempt + 1
                        );
                        sleep(Duration::from_millis(delay)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(LlmError::Http(error));
                }
            }
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse> {
        let body = build_request_body(&request, false);
        let response = self.send(&body).await?;
        let raw = response.text().await?;
        parse_response(&raw)
    }

    async fn complete_streaming(
        &self,
        request: ChatRequest,
        on_delta: StreamDeltaHandler,
    ) -> Result<ChatResponse> {
        let body = build_request_body(&request, true);
        let response = self.send(&body).await?;

        let mut state = StreamState::default();
        let mut stream = response.bytes_stream();
        let mut line_buffer = String::new();
        let mut data = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let fragment = std::str::from_utf8(chunk.as_ref()).map_err(|err| {
                LlmError::invalid(format!("invalid UTF-8 in event stream: {err}"))
            })?;
            line_buffer.push_str(fragment);

            while let Some(pos) = line_buffer.find('\n') {
                let line = line_buffer[..pos].trim_end_matches('\r').to_string();
                line_buffer.drain(..=pos);

                if line.is_empty() {
                    if !data.trim().is_empty() {
                        state.apply_event(data.trim(), &on_delta)?;
                    }
                    data.clear();
                    continue;
                }
                if let Some(rest) = line.strip_prefix("data:") {
                    if !data.is_empty() {
                        data.push('\n');
                    }
                    data.push_str(rest.trim());
                }
                // `event:` lines are redundant with the payload's own type.
            }
        }

        if !data.trim().is_empty() {
            state.apply_event(data.trim(), &on_delta)?;
        }

        state.finish()
    }
}

fn build_request_body(request: &ChatRequest, stream: bool) -> Value {
    let system = request
        .messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(Message::text_content)
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut body = json!({
        "model": request.model,
        "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "messages": to_wire_messages(&request.messages),
    });

    if !system.is_empty() {
        body["system"] = json!(system);
    }
    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }
    if !request.tools.is_empty() {
        body["tools"] = to_wire_tools(&request.tools);
    }
    if stream {
        body["stream"] = json!(true);
    }

    body
}

fn to_wire_messages(messages: &[Message]) -> Value {
    let wire: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|message| {
            let role = match message.role {
                MessageRole::Assistant => "assistant",
                _ => "user",
            };
            let content: Vec<Value> = message
                .content
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => json!({ "type": "text", "text": text }),
                    ContentBlock::ToolCall {
                        id,
                        name,
                        arguments,
                    } => json!({
                        "type": "tool_use",
                        "id": id,
                        "name": name,
                        "input": arguments,
                    }),
                    ContentBlock::ToolResult {
                        tool_call_id,
                        content,
                    } => json!({
                        "type": "tool_result",
                        "tool_use_id": tool_call_id,
                        "content": content,
                    }),
                })
                .collect();
            json!({ "role": role, "content": content })
        })
        .collect();
    Value::Array(wire)
}

fn to_wire_tools(tools: &[ToolDefinition]) -> Value {
    Value::Array(
        tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "input_schema": tool.parameters,
                })
            })
            .collect(),
    )
}

fn parse_response(raw: &str) -> Result<ChatResponse> {
    let payload: Value = serde_json::from_str(raw)?;
    let content = payload
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| LlmError::invalid("response has no content array"))?;

    let mut blocks = Vec::new();
    for block in content {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => {
                let text = block
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                blocks.push(ContentBlock::Text { text });
            }
            Some("tool_use") => {
                let id = block
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| LlmError::invalid("tool_use block has no id"))?
                    .to_string();
                let name = block
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| LlmError::invalid("tool_use block has no name"))?
                    .to_string();
                let arguments = block.get("input").cloned().unwrap_or_else(|| json!({}));
                blocks.push(ContentBlock::ToolCall {
                    id,
                    name,
                    arguments,
                });
            }
            _ => {}
        }
    }

    Ok(ChatResponse {
        message: Message {
            role: MessageRole::Assistant,
            content: blocks,
        },
        stop_reason: payload
            .get("stop_reason")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Accumulates one streamed reply: text deltas plus tool-use blocks whose
/// arguments arrive as JSON fragments.
#[derive(Default)]
struct StreamState {
    text: String,
    tools: Vec<ToolAccumulator>,
    stop_reason: Option<String>,
}

struct ToolAccumulator {
    index: u64,
    id: String,
    name: String,
    json: String,
}

impl StreamState {
    fn apply_event(&mut self, data: &str, on_delta: &StreamDeltaHandler) -> Result<()> {
        let payload: Value = serde_json::from_str(data)
            .map_err(|err| LlmError::invalid(format!("bad stream chunk: {err}")))?;
        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();

        match kind {
            "content_block_start" => {
                let index = payload.get("index").and_then(Value::as_u64).unwrap_or(0);
                let block = payload.get("content_block").cloned().unwrap_or_default();
                if block.get("type").and_then(Value::as_str) == Some("tool_use") {
                    self.tools.push(ToolAccumulator {
                        index,
                        id: block
                            .get("id")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        name: block
                            .get("name")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        json: String::new(),
                    });
                }
            }
            "content_block_delta" => {
                let index = payload.get("index").and_then(Value::as_u64).unwrap_or(0);
                let delta = payload.get("delta").cloned().unwrap_or_default();
                match delta.get("type").and_then(Value::as_str) {
                    Some("text_delta") => {
                        if let Some(text) = delta.get("text").and_then(Value::as_str) {
                            self.text.push_str(text);
                            on_delta(text);
                        }
                    }
                    Some("input_json_delta") => {
                        if let Some(fragment) = delta.get("partial_json").and_then(Value::as_str) {
                            if let Some(tool) =
                                self.tools.iter_mut().find(|tool| tool.index == index)
                            {
                                tool.json.push_str(fragment);
                            }
                        }
                    }
                    _ => {}
                }
            }
            "message_delta" => {
                if let Some(reason) = payload
                    .pointer("/delta/stop_reason")
                    .and_then(Value::as_str)
                {
                    self.stop_reason = Some(reason.to_string());
                }
            }
            "error" => {
                let message = payload
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .unwrap_or("stream returned an error event");
                return Err(LlmError::invalid(message));
            }
            // message_start, content_block_stop, message_stop, ping
            _ => {}
        }

        Ok(())
    }

    fn finish(self) -> Result<ChatResponse> {
        let mut blocks = Vec::new();
        if !self.text.is_empty() {
            blocks.push(ContentBlock::Text {
                text: self.text,
            });
        }
        for tool in self.tools {
            let arguments = if tool.json.trim().is_empty() {
                json!({})
            } else {
                serde_json::from_str(&tool.json).map_err(|err| {
                    LlmError::invalid(format!(
                        "tool '{}' arguments are not valid JSON: {err}",
                        tool.name
                    ))
                })?
            };
            blocks.push(ContentBlock::ToolCall {
                id: tool.id,
                name: tool.name,
                arguments,
            });
        }

        Ok(ChatResponse {
            message: Message {
                role: MessageRole::Assistant,
                content: blocks,
            },
            stop_reason: self.stop_reason,
        })
    }
}
