//! Tool System
//!
//! Tools are registered at runtime and invoked by the reasoning loop. Local
//! tools implement [`Tool`] directly; remote capabilities are adapted through
//! [`crate::toolkit::RemoteTool`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool call request from the LLM
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    #[serde(alias = "tool")]
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, serde_json::Value>,

    /// Optional call ID for tracking
    #[serde(default)]
    pub id: Option<String>,
}

impl ToolCall {
    /// String argument, if present
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(serde_json::Value::as_str)
    }

    /// Unsigned integer argument; numeric strings are accepted too
    pub fn u64_arg(&self, key: &str) -> Option<u64> {
        self.arguments.get(key).and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        })
    }
}

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID (if provided in request)
    pub id: Option<String>,

    pub success: bool,

    /// Output (success message or error)
    pub output: String,

    /// Structured data (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    pub description: String,

    #[serde(default)]
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
}

impl ParameterSchema {
    /// Shorthand for the common case of a typed parameter without defaults
    pub fn new(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required,
            default: None,
            enum_values: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn with_enum(mut self, values: Vec<serde_json::Value>) -> Self {
        self.enum_values = Some(values);
        self
    }
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    pub parameters: Vec<ParameterSchema>,

    /// Category for grouping
    #[serde(default)]
    pub category: Option<String>,

    /// Whether tool has side effects (sending email, posting...)
    #[serde(default)]
    pub has_side_effects: bool,
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;

    /// Validate arguments before execution
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            if param.required && !call.arguments.contains_key(&param.name) {
                return Err(AgentError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Registry for available tools, ordered by name
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_boxed(Arc::new(tool));
    }

    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::debug!(tool = %name, "Replaced previously registered tool");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Validate and execute a tool call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        tool.validate(call)?;
        tool.execute(call).await
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Generate system prompt section describing available tools
    pub fn generate_prompt_section(&self) -> String {
        let mut prompt = String::from("## Available Tools\n\n");
        prompt.push_str("You can use the following tools by responding with a JSON block:\n\n");
        prompt.push_str(
            "```tool\n{\"tool\": \"tool_name\", \"arguments\": {\"arg\": \"value\"}}\n```\n\n",
        );

        for schema in self.schemas() {
            prompt.push_str(&format!("### {}\n", schema.name));
            prompt.push_str(&format!("{}\n", schema.description));

            if !schema.parameters.is_empty() {
                prompt.push_str("**Parameters:**\n");
                for param in &schema.parameters {
                    let required = if param.required { " (required)" } else { "" };
                    prompt.push_str(&format!(
                        "- `{}` ({}){}: {}\n",
                        param.name,
                        param.param_type,
                        required,
                        param.description,
                    ));
                }
            }
            prompt.push('\n');
        }

        prompt
    }
}

// ============================================================================
// Built-in Tools
// ============================================================================

/// Current date and time, optionally shifted to a fixed UTC offset.
/// The support persona uses it to decide whether it is inside office hours.
pub struct DateTimeTool;

#[async_trait]
impl Tool for DateTimeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "datetime".into(),
            description: "Get the current date and time".into(),
            parameters: vec![
                ParameterSchema::new(
                    "format",
                    "string",
                    "Output format: 'iso', 'human', or 'unix'",
                    false,
                )
                .with_default(serde_json::json!("human"))
                .with_enum(vec![
                    serde_json::json!("iso"),
                    serde_json::json!("human"),
                    serde_json::json!("unix"),
                ]),
                ParameterSchema::new(
                    "utc_offset",
                    "number",
                    "Offset from UTC in whole hours, e.g. -7 for PDT (default: 0)",
                    false,
                )
                .with_default(serde_json::json!(0)),
            ],
            category: Some("time".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let format = call.str_arg("format").unwrap_or("human");
        let offset_hours = call
            .arguments
            .get("utc_offset")
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0);

        let offset = i32::try_from(offset_hours * 3600)
            .ok()
            .and_then(chrono::FixedOffset::east_opt)
            .ok_or_else(|| {
                AgentError::ToolValidation(format!("utc_offset out of range: {offset_hours}"))
            })?;

        let now = chrono::Utc::now().with_timezone(&offset);

        let output = match format {
            "iso" => now.to_rfc3339(),
            "unix" => now.timestamp().to_string(),
            _ => now.format("%A, %B %d, %Y at %H:%M:%S (UTC%:z)").to_string(),
        };

        Ok(ToolResult::success("datetime", output))
    }
}
