use crate::error::{AgentError, Result};
use crate::tool::Tool;
use serde_json::Value;
use std::sync::Arc;
use triage_llm::{ChatRequest, ContentBlock, LlmClient, Message, MessageRole, ToolDefinition};

/// Loop settings; iteration and token budgets bound every run.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub max_iterations: usize,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_iterations: 15,
            temperature: Some(0.6),
            max_tokens: None,
        }
    }
}

/// The loop's exit value: the final text plus how many turns it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutcome {
    pub answer: String,
    pub iterations: usize,
}

/// Drives the model/tool cycle until a text-only reply arrives.
pub struct AgentExecutor {
    client: Arc<dyn LlmClient>,
    tools: Vec<Box<dyn Tool>>,
    config: AgentConfig,
}

impl AgentExecutor {
    pub fn new(client: Arc<dyn LlmClient>, tools: Vec<Box<dyn Tool>>, config: AgentConfig) -> Self {
        Self {
            client,
            tools,
            config,
        }
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    fn find_tool(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .map(Box::as_ref)
            .find(|tool| tool.name() == name)
    }

    /// Run the loop for one task. The instruction text and the task input
    /// seed the conversation; every requested tool call is answered with
    /// an observation before the model is consulted again.
    pub async fn run(&self, instructions: &str, task: &str) -> Result<AgentOutcome> {
        let mut messages = vec![Message::system(instructions), Message::user(task)];
        let definitions = self.definitions();

        for iteration in 1..=self.config.max_iterations {
            let request = ChatRequest {
                model: self.config.model.clone(),
                messages: messages.clone(),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                tools: definitions.clone(),
            };

            let response = self.client.complete(request).await?;
            let calls: Vec<(String, String, Value)> = response
                .message
                .tool_calls()
                .into_iter()
                .map(|(id, name, args)| (id.to_string(), name.to_string(), args.clone()))
                .collect();

            messages.push(response.message.clone());

            if calls.is_empty() {
                log::info!("agent finished after {iteration} iteration(s)");
                return Ok(AgentOutcome {
                    answer: response.text(),
                    iterations: iteration,
                });
            }

            let mut observations = Vec::with_capacity(calls.len());
            for (id, name, args) in calls {
                let observation = match self.find_tool(&name) {
                    Some(tool) => {
                        log::debug!("iteration {iteration}: running {name}");
                        tool.call(args).await
                    }
                    // Unknown names become observations so the loop can
                    // correct itself instead of dying mid-run.
                    None => format!("Error: unknown tool '{name}'"),
                };
                observations.push(ContentBlock::ToolResult {
                    tool_call_id: id,
                    content: observation,
                });
            }
            messages.push(Message {
                role: MessageRole::User,
                content: observations,
            });
        }

        Err(AgentError::IterationLimit(self.config.max_iterations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;
    use triage_llm::{ChatResponse, LlmError};

    /// Replays scripted responses and records every request it saw.
    struct ScriptedClient {
        responses: Mutex<Vec<ChatResponse>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedClient {
        fn new(mut responses: Vec<ChatResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(
            &self,
            request: ChatRequest,
        ) -> std::result::Result<ChatResponse, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| LlmError::InvalidResponse("script exhausted".to_string()))
        }
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn description(&self) -> &'static str {
            "Echoes its input"
        }
        fn schema(&self) -> Value {
            json!({ "type": "object" })
        }
        async fn call(&self, args: Value) -> String {
            format!("echo: {args}")
        }
    }

    fn tool_call_response(name: &str) -> ChatResponse {
        ChatResponse {
            message: Message {
                role: MessageRole::Assistant,
                content: vec![ContentBlock::ToolCall {
                    id: "t1".to_string(),
                    name: name.to_string(),
                    arguments: json!({ "payload": "ping" }),
                }],
            },
            stop_reason: Some("tool_use".to_string()),
        }
    }

    fn final_response(text: &str) -> ChatResponse {
        ChatResponse {
            message: Message::assistant(text),
            stop_reason: Some("end_turn".to_string()),
        }
    }

    fn executor(client: Arc<ScriptedClient>) -> AgentExecutor {
        AgentExecutor::new(
            client,
            vec![Box::new(EchoTool)],
            AgentConfig {
                model: "test-model".to_string(),
                max_iterations: 3,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn dispatches_tools_and_relays_the_final_answer() {
        let client = Arc::new(ScriptedClient::new(vec![
            tool_call_response("echo"),
            final_response("no findings"),
        ]));
        let outcome = executor(client.clone())
            .run("be thorough", "audit ./repo")
            .await
            .unwrap();

        assert_eq!(outcome.answer, "no findings");
        assert_eq!(outcome.iterations, 2);

        // The second request must carry the observation for the call.
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let last = requests[1].messages.last().unwrap();
        match &last.content[0] {
            ContentBlock::ToolResult {
                tool_call_id,
                content,
            } => {
                assert_eq!(tool_call_id, "t1");
                assert!(content.starts_with("echo: "));
                assert!(content.contains("ping"));
            }
            other => panic!("expected a tool result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_tools_become_observations_not_faults() {
        let client = Arc::new(ScriptedClient::new(vec![
            tool_call_response("no_such_tool"),
            final_response("recovered"),
        ]));
        let outcome = executor(client.clone())
            .run("instructions", "task")
            .await
            .unwrap();

        assert_eq!(outcome.answer, "recovered");
        let requests = client.requests.lock().unwrap();
        let last = requests[1].messages.last().unwrap();
        match &last.content[0] {
            ContentBlock::ToolResult { content, .. } => {
                assert_eq!(content, "Error: unknown tool 'no_such_tool'");
            }
            other => panic!("expected a tool result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn iteration_budget_is_enforced() {
        let client = Arc::new(ScriptedClient::new(vec![
            tool_call_response("echo"),
            tool_call_response("echo"),
            tool_call_response("echo"),
        ]));
        let err = executor(client).run("instructions", "task").await.unwrap_err();
        assert!(matches!(err, AgentError::IterationLimit(3)));
    }

    #[tokio::test]
    async fn tool_definitions_reach_the_model() {
        let client = Arc::new(ScriptedClient::new(vec![final_response("done")]));
        executor(client.clone()).run("i", "t").await.unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].tools[0].name, "echo");
    }
}
