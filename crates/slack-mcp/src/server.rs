//! MCP server implementation
//!
//! Tool registry plus JSON-RPC dispatch for the Slack tools.

use crate::types::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// MCP server error types.
#[derive(Debug, Error)]
pub enum McpServerError {
    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool execution failed
    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpServerError {
    fn to_rpc_error(&self) -> McpError {
        match self {
            McpServerError::InvalidParams(_) => McpError::invalid_params(self.to_string()),
            McpServerError::ToolNotFound(_) => McpError::invalid_params(self.to_string()),
            _ => McpError::internal_error(self.to_string()),
        }
    }
}

/// Result type for MCP server operations.
pub type McpServerResult<T> = Result<T, McpServerError>;

/// Trait for tool implementations.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given arguments.
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult>;
}

/// Context for tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Request correlation ID
    pub correlation_id: Option<String>,
}

impl ToolContext {
    /// Create an empty context.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a context with a fresh time-ordered correlation id.
    pub fn correlated() -> Self {
        Self {
            correlation_id: Some(uuid::Uuid::now_v7().to_string()),
        }
    }

    /// Correlation id for log fields; empty when unset.
    pub fn correlation(&self) -> &str {
        self.correlation_id.as_deref().unwrap_or_default()
    }
}

/// MCP server.
///
/// Holds the registered tools and answers `initialize`, `ping`, `tools/list`
/// and `tools/call`.
pub struct McpServer {
    /// Server info
    info: ServerInfo,

    /// Server capabilities
    capabilities: ServerCapabilities,

    /// Registered tools
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolCapabilities {
                    list_changed: false,
                }),
            },
            tools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create with the Slack server identity.
    pub fn slack() -> Self {
        Self::new("slack-mcp", env!("CARGO_PKG_VERSION"))
    }

    /// Register a tool.
    pub async fn register_tool(&self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;

        let mut tools = self.tools.write().await;
        if tools.insert(name.clone(), tool).is_some() {
            warn!("Tool {} registered twice; keeping the latest", name);
        }
    }

    /// Register multiple tools.
    pub async fn register_tools(&self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register_tool(tool).await;
        }
    }

    /// Get all tool definitions, sorted by name.
    pub async fn list_tools(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        let mut definitions: Vec<ToolDefinition> = tools.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Execute a tool.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let tool = {
            let tools = self.tools.read().await;
            tools
                .get(name)
                .cloned()
                .ok_or_else(|| McpServerError::ToolNotFound(name.to_string()))?
        };

        tool.execute(arguments, context).await
    }

    /// Handle an MCP request.
    pub async fn handle_request(&self, request: McpRequest) -> McpResponse {
        debug!("Handling {}", request.method);
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => McpResponse::success(request.id, serde_json::json!({})),
            "tools/list" => self.handle_tools_list(request.id).await,
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => McpResponse::error(request.id, McpError::method_not_found(&request.method)),
        }
    }

    fn handle_initialize(&self, id: RequestId) -> McpResponse {
        McpResponse::success(
            id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": self.capabilities,
                "serverInfo": self.info
            }),
        )
    }

    async fn handle_tools_list(&self, id: RequestId) -> McpResponse {
        let tools = self.list_tools().await;
        McpResponse::success(id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(
        &self,
        id: RequestId,
        params: Option<serde_json::Value>,
    ) -> McpResponse {
        let params = match params {
            Some(p) => p,
            None => return McpResponse::error(id, McpError::invalid_params("Missing params")),
        };

        let call: ToolCall = match serde_json::from_value(params) {
            Ok(c) => c,
            Err(e) => return McpResponse::error(id, McpError::invalid_params(e.to_string())),
        };

        let context = ToolContext::correlated();
        debug!(
            "Calling {} (correlation {})",
            call.name,
            context.correlation()
        );

        match self.call_tool(&call.name, call.arguments, &context).await {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => McpResponse::success(id, value),
                Err(e) => McpResponse::error(id, McpError::internal_error(e.to_string())),
            },
            Err(e) => {
                warn!("Tool call {} rejected: {}", call.name, e);
                McpResponse::error(id, e.to_rpc_error())
            }
        }
    }

    /// Get server info.
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Get server capabilities.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("echo", "Echo the correlation id").with_category("test")
        }

        async fn execute(
            &self,
            args: serde_json::Value,
            context: &ToolContext,
        ) -> McpServerResult<ToolResult> {
            if args.get("fail").is_some() {
                return Err(McpServerError::InvalidParams("fail requested".to_string()));
            }
            Ok(ToolResult::text(context.correlation()))
        }
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = McpServer::slack();
        assert_eq!(server.info().name, "slack-mcp");
    }

    #[tokio::test]
    async fn test_register_tool() {
        let server = McpServer::slack();
        server.register_tool(Arc::new(EchoTool)).await;

        let tools = server.list_tools().await;
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");
        assert_eq!(tools[0].category.as_deref(), Some("test"));
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let server = McpServer::slack();
        let result = server
            .call_tool("missing", json!({}), &ToolContext::empty())
            .await;
        assert!(matches!(result, Err(McpServerError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn test_handle_initialize_and_ping() {
        let server = McpServer::slack();

        let resp = server
            .handle_request(McpRequest::new("1", "initialize"))
            .await;
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "slack-mcp");

        let resp = server.handle_request(McpRequest::new(2, "ping")).await;
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = McpServer::slack();
        let resp = server
            .handle_request(McpRequest::new(3, "resources/list"))
            .await;
        assert_eq!(resp.error.unwrap().code, McpError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_call_assigns_correlation_id() {
        let server = McpServer::slack();
        server.register_tool(Arc::new(EchoTool)).await;

        let req = McpRequest::new(4, "tools/call").with_params(json!({ "name": "echo" }));
        let resp = server.handle_request(req).await;
        let result: ToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        let id = uuid::Uuid::parse_str(result.first_text().unwrap()).unwrap();
        assert_eq!(id.get_version_num(), 7);
    }

    #[tokio::test]
    async fn test_tools_call_invalid_params() {
        let server = McpServer::slack();
        server.register_tool(Arc::new(EchoTool)).await;

        let req = McpRequest::new(5, "tools/call")
            .with_params(json!({ "name": "echo", "arguments": { "fail": true } }));
        let resp = server.handle_request(req).await;
        assert_eq!(resp.error.unwrap().code, McpError::INVALID_PARAMS);

        let resp = server.handle_request(McpRequest::new(6, "tools/call")).await;
        assert_eq!(resp.error.unwrap().code, McpError::INVALID_PARAMS);
    }
}
