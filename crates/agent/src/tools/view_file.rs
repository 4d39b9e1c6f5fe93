use crate::tool::{schema_value, Tool};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ViewFileArgs {
    /// Path to the file to view
    pub filepath: String,
}

/// Returns a file's full contents for the loop to review.
pub struct ViewFileTool;

#[async_trait]
impl Tool for ViewFileTool {
    fn name(&self) -> &'static str {
        "view_file"
    }

    fn description(&self) -> &'static str {
        "Views the contents of a specified file"
    }

    fn schema(&self) -> Value {
        schema_value::<ViewFileArgs>()
    }

    async fn call(&self, args: Value) -> String {
        let args: ViewFileArgs = match serde_json::from_value(args) {
            Ok(args) => args,
            Err(err) => return format!("Error: invalid arguments for view_file: {err}"),
        };
        match tokio::fs::read_to_string(&args.filepath).await {
            Ok(contents) => contents,
            Err(err) => format!("Error reading file: {err}"),
        }
    }
}
