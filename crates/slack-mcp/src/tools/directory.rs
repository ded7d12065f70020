//! Directory tools
//!
//! Channels, invites, workspace members and message search.

use super::parse_args;
use crate::operations::{SearchSort, SlackGateway};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Default number of search matches.
const DEFAULT_SEARCH_COUNT: i64 = 20;

/// Tool to list public and private channels.
pub struct ListChannelsTool {
    gateway: Arc<SlackGateway>,
}

impl ListChannelsTool {
    pub fn new(gateway: Arc<SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for ListChannelsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_slack_channels",
            "List public and private Slack channels visible to the bot",
        )
        .with_category("directory")
    }

    #[instrument(skip(self, _args, context), fields(tool = "get_slack_channels", correlation_id = %context.correlation()))]
    async fn execute(
        &self,
        _args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let result = self.gateway.list_channels().await;
        if let Some(failure) = result.failure() {
            error!("Failed to list channels: {}", failure.error);
        }

        Ok(ToolResult::envelope(&result))
    }
}

/// Tool to invite a user to a channel.
pub struct InviteUserTool {
    gateway: Arc<SlackGateway>,
}

impl InviteUserTool {
    pub fn new(gateway: Arc<SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for InviteUserTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("invite_user_to_channel", "Invite a user to a Slack channel")
            .with_category("directory")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "channel_id": {
                        "type": "string",
                        "description": "Channel ID"
                    },
                    "user_id": {
                        "type": "string",
                        "description": "User ID to invite"
                    }
                },
                "required": ["channel_id", "user_id"]
            }))
    }

    #[instrument(skip(self, args, context), fields(tool = "invite_user_to_channel", correlation_id = %context.correlation()))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: InviteParams = parse_args(args)?;

        let result = self
            .gateway
            .invite_user(&params.channel_id, &params.user_id)
            .await;
        if let Some(failure) = result.failure() {
            error!("Failed to invite user: {}", failure.error);
        }

        Ok(ToolResult::envelope(&result))
    }
}

#[derive(Debug, Deserialize)]
struct InviteParams {
    channel_id: String,
    user_id: String,
}

/// Tool to list active workspace members.
pub struct ListUsersTool {
    gateway: Arc<SlackGateway>,
}

impl ListUsersTool {
    pub fn new(gateway: Arc<SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for ListUsersTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_slack_users", "List active members of the Slack workspace")
            .with_category("directory")
    }

    #[instrument(skip(self, _args, context), fields(tool = "get_slack_users", correlation_id = %context.correlation()))]
    async fn execute(
        &self,
        _args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let result = self.gateway.list_users().await;
        if let Some(failure) = result.failure() {
            error!("Failed to list users: {}", failure.error);
        }

        Ok(ToolResult::envelope(&result))
    }
}

/// Tool to search messages. Requires a user token.
pub struct SearchMessagesTool {
    gateway: Arc<SlackGateway>,
}

impl SearchMessagesTool {
    pub fn new(gateway: Arc<SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for SearchMessagesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "search_slack_messages",
            "Search Slack messages (requires SLACK_USER_TOKEN)",
        )
        .with_category("search")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query, Slack search syntax supported"
                },
                "sort": {
                    "type": "string",
                    "enum": ["timestamp", "score"],
                    "description": "Result ordering",
                    "default": "timestamp"
                },
                "count": {
                    "type": "integer",
                    "description": "Number of matches (1-100)",
                    "default": DEFAULT_SEARCH_COUNT,
                    "minimum": 1,
                    "maximum": 100
                }
            },
            "required": ["query"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "search_slack_messages", correlation_id = %context.correlation()))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: SearchParams = parse_args(args)?;

        debug!("Searching for: {}", params.query);
        let result = self
            .gateway
            .search_messages(&params.query, params.sort, params.count)
            .await;
        if let Some(failure) = result.failure() {
            error!("Failed to search messages: {}", failure.error);
        }

        Ok(ToolResult::envelope(&result))
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default)]
    sort: SearchSort,
    #[serde(default = "default_search_count")]
    count: i64,
}

fn default_search_count() -> i64 {
    DEFAULT_SEARCH_COUNT
}

/// Get all directory tools.
pub fn directory_tools(gateway: Arc<SlackGateway>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListChannelsTool::new(gateway.clone())),
        Arc::new(InviteUserTool::new(gateway.clone())),
        Arc::new(ListUsersTool::new(gateway.clone())),
        Arc::new(SearchMessagesTool::new(gateway)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::McpServerError;
    use crate::tools::test_gateway;
    use serde_json::json;

    #[test]
    fn test_search_defaults() {
        let params: SearchParams = serde_json::from_value(json!({ "query": "deploy" })).unwrap();
        assert_eq!(params.sort, SearchSort::Timestamp);
        assert_eq!(params.count, 20);
    }

    #[test]
    fn test_search_rejects_unknown_sort() {
        let result: Result<SearchParams, _> =
            serde_json::from_value(json!({ "query": "deploy", "sort": "random" }));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_search_without_user_token_is_error_result() {
        let tool = SearchMessagesTool::new(test_gateway());
        let result = tool
            .execute(json!({ "query": "deploy" }), &ToolContext::empty())
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.first_text().unwrap().contains("SLACK_USER_TOKEN"));
    }

    #[tokio::test]
    async fn test_invite_requires_both_ids() {
        let tool = InviteUserTool::new(test_gateway());
        let result = tool
            .execute(json!({ "channel_id": "C1" }), &ToolContext::empty())
            .await;
        assert!(matches!(result, Err(McpServerError::InvalidParams(_))));
    }
}
