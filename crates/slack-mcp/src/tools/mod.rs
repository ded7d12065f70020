//! Slack MCP tools
//!
//! Each tool deserializes its arguments, runs one [`SlackGateway`] operation
//! and relays the resulting envelope as JSON text.
//!
//! - Messaging: posting, direct messages, reactions and channel history
//! - Directory: channels, invites, users and search
//! - Files: local, legacy and base64 uploads

pub mod directory;
pub mod files;
pub mod messaging;

pub use directory::*;
pub use files::*;
pub use messaging::*;

use crate::operations::SlackGateway;
use crate::server::{McpServerError, McpServerResult, Tool};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Get all Slack tools bound to one gateway.
///
/// # Example
///
/// ```rust,no_run
/// use slack_mcp::{tools::all_tools, SlackGateway};
/// use std::sync::Arc;
///
/// let gateway = Arc::new(SlackGateway::from_env().unwrap());
/// let tools = all_tools(gateway);
/// println!("Available tools: {}", tools.len());
/// ```
pub fn all_tools(gateway: Arc<SlackGateway>) -> Vec<Arc<dyn Tool>> {
    let mut tools = Vec::new();

    // Messaging tools (6, including one legacy alias)
    tools.extend(messaging_tools(gateway.clone()));

    // Directory tools (4)
    tools.extend(directory_tools(gateway.clone()));

    // File tools (3)
    tools.extend(file_tools(gateway));

    tools
}

/// Deserialize tool arguments, mapping failures to `InvalidParams`.
pub(crate) fn parse_args<T: DeserializeOwned>(args: serde_json::Value) -> McpServerResult<T> {
    serde_json::from_value(args).map_err(|e| McpServerError::InvalidParams(e.to_string()))
}

#[cfg(test)]
pub(crate) fn test_gateway() -> Arc<SlackGateway> {
    use crate::client::SlackConfig;

    let config = SlackConfig::new("xoxb-test").with_base_url("http://127.0.0.1:9");
    Arc::new(SlackGateway::new(config).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tools_count() {
        let tools = all_tools(test_gateway());
        // 6 messaging + 4 directory + 3 file = 13 tools
        assert_eq!(tools.len(), 13, "Expected 13 total tools");
    }

    #[test]
    fn test_all_tools_unique_names() {
        let tools = all_tools(test_gateway());
        let mut names = std::collections::HashSet::new();

        for tool in tools {
            let def = tool.definition();
            assert!(
                names.insert(def.name.clone()),
                "Duplicate tool name: {}",
                def.name
            );
        }
    }

    #[test]
    fn test_tool_categories() {
        let gateway = test_gateway();

        assert_eq!(messaging_tools(gateway.clone()).len(), 6);
        assert_eq!(directory_tools(gateway.clone()).len(), 4);
        assert_eq!(file_tools(gateway).len(), 3);
    }

    #[test]
    fn test_schemas_are_objects() {
        for tool in all_tools(test_gateway()) {
            let def = tool.definition();
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
            assert!(def.category.is_some(), "{} has no category", def.name);
        }
    }
}
