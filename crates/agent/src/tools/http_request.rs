use crate::tool::{schema_value, Tool};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HttpRequestArgs {
    /// URL to make a request to
    pub url: String,

    /// HTTP method to use (GET or POST)
    #[serde(default = "default_method")]
    pub method: String,

    /// Form data to send with a POST request
    #[serde(default)]
    pub data: Option<BTreeMap<String, String>>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Performs one real outbound request and reports headers plus body.
///
/// POST requests are live side effects; they are never retried here.
pub struct HttpRequestTool {
    client: reqwest::Client,
}

impl HttpRequestTool {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    async fn perform(&self, args: &HttpRequestArgs) -> Result<String, reqwest::Error> {
        let request = match args.method.to_ascii_uppercase().as_str() {
            "POST" => {
                let empty = BTreeMap::new();
                let form = args.data.as_ref().unwrap_or(&empty);
                self.client.post(&args.url).form(form)
            }
            _ => self.client.get(&args.url),
        };

        let response = request.send().await?;
        let mut headers = String::new();
        for (name, value) in response.headers() {
            headers.push_str(name.as_str());
            headers.push_str(": ");
            headers.push_str(value.to_str().unwrap_or("<binary>"));
            headers.push('\n');
        }
        let body = response.text().await?;
        Ok(format!("Headers:\n{headers}\nBody:\n{body}"))
    }
}

impl Default for HttpRequestTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for HttpRequestTool {
    fn name(&self) -> &'static str {
        "http_request"
    }

    fn description(&self) -> &'static str {
        "Makes a request to a url; handles both GET and POST requests"
    }

    fn schema(&self) -> Value {
        schema_value::<HttpRequestArgs>()
    }

    async fn call(&self, args: Value) -> String {
        let args: HttpRequestArgs = match serde_json::from_value(args) {
            Ok(args) => args,
            Err(err) => return format!("Error: invalid arguments for http_request: {err}"),
        };

        let method = args.method.to_ascii_uppercase();
        if method != "GET" && method != "POST" {
            return format!("Error: unsupported method '{}' (use GET or POST)", args.method);
        }

        match self.perform(&args).await {
            Ok(report) => report,
            Err(err) => format!("Error making request: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn rejects_unsupported_methods_softly() {
        let tool = HttpRequestTool::new();
        let output = tool
            .call(json!({ "url": "http://localhost/", "method": "DELETE" }))
            .await;
        assert!(output.starts_with("Error: unsupported method 'DELETE'"));
    }

    #[tokio::test]
    async fn transport_failures_fail_soft() {
        let tool = HttpRequestTool::new();
        // Port 1 on loopback refuses the connection immediately.
        let output = tool
            .call(json!({ "url": "http://127.0.0.1:1/", "method": "GET" }))
            .await;
        assert!(output.starts_with("Error making request:"), "{output}");
    }

    #[tokio::test]
    async fn malformed_urls_fail_soft() {
        let tool = HttpRequestTool::new();
        let output = tool.call(json!({ "url": "not a url" })).await;
        assert!(output.starts_with("Error making request:"), "{output}");
    }
}
