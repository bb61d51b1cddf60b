//! Hosted Tool Service Client
//!
//! HTTP implementation of [`RemoteToolkit`] for a Toolhouse-style service:
//! `POST {base}/get_tools` returns Anthropic-format tool definitions and
//! `POST {base}/run_tools` executes one `tool_use` block and answers with a
//! `tool_result` block.

use std::collections::HashMap;

use agent_core::{
    error::{AgentError, Result},
    tool::{ParameterSchema, ToolCall, ToolResult, ToolSchema},
    toolkit::RemoteToolkit,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Remote toolkit configuration
#[derive(Clone, Debug)]
pub struct ToolhouseConfig {
    pub api_key: String,
    pub base_url: String,
    /// Tool bundle to request (service-side grouping)
    pub bundle: Option<String>,
    /// Extra context forwarded on every call (timezone, user id, ...)
    pub metadata: HashMap<String, String>,
}

impl ToolhouseConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.toolhouse.ai/v1".into(),
            bundle: None,
            metadata: HashMap::new(),
        }
    }

    /// `None` when `TOOLHOUSE_API_KEY` is unset; the agents then run with
    /// local tools only.
    pub fn from_env() -> Option<Self> {
        let key = std::env::var("TOOLHOUSE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;

        let mut config = Self::new(key);
        if let Ok(url) = std::env::var("TOOLHOUSE_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        config.bundle = std::env::var("TOOLHOUSE_BUNDLE").ok();
        if let Ok(tz) = std::env::var("TOOLHOUSE_TIMEZONE") {
            config.metadata.insert("timezone".into(), tz);
        }
        Some(config)
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// HTTP client for the hosted tool service
pub struct ToolhouseClient {
    http: reqwest::Client,
    config: ToolhouseConfig,
}

impl ToolhouseClient {
    pub fn new(config: ToolhouseConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn post<B: Serialize + Sync, R: for<'de> Deserialize<'de>>(&self, path: &str, body: &B) -> Result<R> {
        let response = self
            .http
            .post(format!("{}/{}", self.config.base_url, path))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::Toolkit(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AgentError::Auth("tool service rejected the API key".into()));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::Toolkit(format!("{status}: {detail}")));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::Toolkit(format!("invalid response from {path}: {e}")))
    }
}

#[derive(Serialize)]
struct GetToolsRequest<'a> {
    provider: &'static str,
    metadata: &'a HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bundle: Option<&'a str>,
}

#[derive(Serialize)]
struct RunToolsRequest<'a> {
    provider: &'static str,
    metadata: &'a HashMap<String, String>,
    content: ToolUseBlock<'a>,
}

#[derive(Serialize)]
struct ToolUseBlock<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: String,
    name: &'a str,
    input: &'a HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RunToolsResponse {
    content: ToolResultBlock,
}

#[derive(Deserialize)]
struct ToolResultBlock {
    #[serde(default)]
    content: serde_json::Value,
    #[serde(default)]
    is_error: bool,
}

/// Anthropic-format tool definition
#[derive(Debug, Deserialize)]
struct ApiTool {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    input_schema: InputSchema,
}

#[derive(Debug, Default, Deserialize)]
struct InputSchema {
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    required: Vec<String>,
}

impl From<ApiTool> for ToolSchema {
    fn from(tool: ApiTool) -> Self {
        let required = &tool.input_schema.required;
        let parameters = tool
            .input_schema
            .properties
            .iter()
            .map(|(name, prop)| ParameterSchema {
                name: name.clone(),
                param_type: prop["type"].as_str().unwrap_or("string").to_string(),
                description: prop["description"].as_str().unwrap_or_default().to_string(),
                required: required.contains(name),
                default: prop.get("default").cloned(),
                enum_values: prop["enum"].as_array().cloned(),
            })
            .collect();

        let has_side_effects = ["send", "post", "create", "delete"]
            .iter()
            .any(|verb| tool.name.contains(verb));

        Self {
            name: tool.name,
            description: tool.description,
            parameters,
            category: Some("remote".into()),
            has_side_effects,
        }
    }
}

/// Tool result content is either a string or a list of text blocks
fn result_text(content: &serde_json::Value) -> String {
    match content {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(blocks) => blocks
            .iter()
            .filter_map(|b| b["text"].as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RemoteToolkit for ToolhouseClient {
    fn name(&self) -> &str {
        "toolhouse"
    }

    async fn list_tools(&self) -> Result<Vec<ToolSchema>> {
        let request = GetToolsRequest {
            provider: "anthropic",
            metadata: &self.config.metadata,
            bundle: self.config.bundle.as_deref(),
        };
        let tools: Vec<ApiTool> = self.post("get_tools", &request).await?;
        Ok(tools.into_iter().map(Into::into).collect())
    }

    async fn run_tool(&self, call: &ToolCall) -> Result<ToolResult> {
        let id = call
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let request = RunToolsRequest {
            provider: "anthropic",
            metadata: &self.config.metadata,
            content: ToolUseBlock {
                kind: "tool_use",
                id: id.clone(),
                name: &call.name,
                input: &call.arguments,
            },
        };

        let response: RunToolsResponse = self.post("run_tools", &request).await?;
        let output = result_text(&response.content.content);

        let result = if response.content.is_error {
            ToolResult::failure(call.name.clone(), output)
        } else {
            ToolResult::success(call.name.clone(), output)
        };
        Ok(result.with_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definition_conversion() {
        let raw = r#"{
            "name": "send_email",
            "description": "Send an email",
            "input_schema": {
                "type": "object",
                "properties": {
                    "to": {"type": "string", "description": "Recipient"},
                    "body": {"type": "string", "description": "HTML body"}
                },
                "required": ["to"]
            }
        }"#;
        let schema: ToolSchema = serde_json::from_str::<ApiTool>(raw).unwrap().into();

        assert_eq!(schema.name, "send_email");
        assert!(schema.has_side_effects);
        let to = schema.parameters.iter().find(|p| p.name == "to").unwrap();
        assert!(to.required);
        let body = schema.parameters.iter().find(|p| p.name == "body").unwrap();
        assert!(!body.required);
    }

    #[test]
    fn test_result_text_shapes() {
        assert_eq!(result_text(&serde_json::json!("done")), "done");
        assert_eq!(
            result_text(&serde_json::json!([{"type": "text", "text": "a"}, {"type": "text", "text": "b"}])),
            "a\nb"
        );
        assert_eq!(result_text(&serde_json::Value::Null), "");
    }

    #[test]
    fn test_metadata_builder() {
        let config = ToolhouseConfig::new("key").with_metadata("timezone", "-7");
        assert_eq!(config.metadata.get("timezone").map(String::as_str), Some("-7"));
    }
}
