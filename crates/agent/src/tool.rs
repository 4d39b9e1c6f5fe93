use async_trait::async_trait;
use serde_json::Value;
use triage_llm::ToolDefinition;

/// One local capability offered to the reasoning loop.
///
/// `call` takes the raw argument object from the model and always returns
/// observation text: bad arguments, unreadable paths and transport faults
/// are all described in the returned string rather than raised, so the
/// loop can see what went wrong and adjust.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the argument object. Field names and types are part
    /// of the contract with the loop and stay stable within a run.
    fn schema(&self) -> Value;

    async fn call(&self, args: Value) -> String;

    /// Wire-shaped definition handed to the model.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema(),
        }
    }
}

/// Render a schemars root schema as the plain JSON the model expects.
pub(crate) fn schema_value<T: schemars::JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| serde_json::json!({ "type": "object" }))
}
