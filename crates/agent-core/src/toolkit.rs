//! Remote Toolkits
//!
//! A remote toolkit is an external service that owns a set of capabilities
//! (web scraping, sending email, ...). The exchange is plain request/response:
//! list the tools, hand over a call, get a result back. Each remote tool is
//! wrapped in a [`RemoteTool`] so the reasoning loop sees it like any local
//! [`Tool`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};

/// Capability-list exchange with an external tool service
#[async_trait]
pub trait RemoteToolkit: Send + Sync {
    /// Service name for logging
    fn name(&self) -> &str;

    /// Tools currently offered by the service
    async fn list_tools(&self) -> Result<Vec<ToolSchema>>;

    /// Execute one call on the service
    async fn run_tool(&self, call: &ToolCall) -> Result<ToolResult>;
}

/// A single remote capability presented as a local tool
pub struct RemoteTool {
    schema: ToolSchema,
    toolkit: Arc<dyn RemoteToolkit>,
}

impl RemoteTool {
    pub fn new(schema: ToolSchema, toolkit: Arc<dyn RemoteToolkit>) -> Self {
        Self { schema, toolkit }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn schema(&self) -> ToolSchema {
        self.schema.clone()
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        tracing::debug!(toolkit = self.toolkit.name(), tool = %call.name, "Forwarding tool call");
        self.toolkit.run_tool(call).await
    }
}

/// Fetch the toolkit's capability list and register every entry.
///
/// Returns the number of tools registered. Local tools with the same name
/// are replaced.
pub async fn register_remote(
    registry: &mut ToolRegistry,
    toolkit: Arc<dyn RemoteToolkit>,
) -> Result<usize> {
    let schemas = toolkit.list_tools().await?;
    let count = schemas.len();

    for schema in schemas {
        registry.register_boxed(Arc::new(RemoteTool::new(schema, toolkit.clone())));
    }

    tracing::info!(toolkit = toolkit.name(), count, "Registered remote tools");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ParameterSchema;

    struct EchoToolkit;

    #[async_trait]
    impl RemoteToolkit for EchoToolkit {
        fn name(&self) -> &str {
            "echo"
        }

        async fn list_tools(&self) -> Result<Vec<ToolSchema>> {
            Ok(vec![ToolSchema {
                name: "send_email".into(),
                description: "Send an email".into(),
                parameters: vec![ParameterSchema::new("to", "string", "Recipient", true)],
                category: Some("communication".into()),
                has_side_effects: true,
            }])
        }

        async fn run_tool(&self, call: &ToolCall) -> Result<ToolResult> {
            Ok(ToolResult::success(
                call.name.clone(),
                format!("sent to {}", call.str_arg("to").unwrap_or("?")),
            ))
        }
    }

    #[tokio::test]
    async fn test_remote_tools_are_registered_and_forwarded() {
        let mut registry = ToolRegistry::new();
        let count = register_remote(&mut registry, Arc::new(EchoToolkit)).await.unwrap();
        assert_eq!(count, 1);

        let call: ToolCall = serde_json::from_value(serde_json::json!({
            "tool": "send_email",
            "arguments": {"to": "me@example.com"}
        }))
        .unwrap();
        let result = registry.execute(&call).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "sent to me@example.com");
    }

    #[tokio::test]
    async fn test_required_parameters_checked_before_forwarding() {
        let mut registry = ToolRegistry::new();
        register_remote(&mut registry, Arc::new(EchoToolkit)).await.unwrap();

        let call: ToolCall =
            serde_json::from_value(serde_json::json!({"tool": "send_email"})).unwrap();
        assert!(registry.execute(&call).await.is_err());
    }
}
