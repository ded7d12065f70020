//! Messaging tools
//!
//! Posting to channels and DMs, reactions, and channel history.

use super::parse_args;
use crate::operations::{MessageTarget, SlackGateway, DEFAULT_REACTION};
use crate::server::{McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Default number of history messages.
const DEFAULT_HISTORY_LIMIT: i64 = 10;

/// Tool to post a message to a channel.
pub struct SendMessageTool {
    gateway: Arc<SlackGateway>,
}

impl SendMessageTool {
    pub fn new(gateway: Arc<SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for SendMessageTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("send_slack_message", "Send a message to a Slack channel")
            .with_category("messaging")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "channel": {
                        "type": "string",
                        "description": "Channel ID or name (e.g. 'C0123456789' or '#general')"
                    },
                    "text": {
                        "type": "string",
                        "description": "Message text"
                    }
                },
                "required": ["channel", "text"]
            }))
    }

    #[instrument(skip(self, args, context), fields(tool = "send_slack_message", correlation_id = %context.correlation()))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: SendMessageParams = parse_args(args)?;

        let result = self.gateway.send_message(&params.channel, &params.text).await;
        if let Some(failure) = result.failure() {
            error!("Failed to send message: {}", failure.error);
        }

        Ok(ToolResult::envelope(&result))
    }
}

#[derive(Debug, Deserialize)]
struct SendMessageParams {
    channel: String,
    text: String,
}

/// Tool to send a direct message to a user.
pub struct SendDirectMessageTool {
    gateway: Arc<SlackGateway>,
}

impl SendDirectMessageTool {
    pub fn new(gateway: Arc<SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for SendDirectMessageTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "send_slack_direct_message",
            "Send a direct message to a Slack user",
        )
        .with_category("messaging")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "user_id": {
                    "type": "string",
                    "description": "User ID (e.g. 'U0123456789')"
                },
                "text": {
                    "type": "string",
                    "description": "Message text"
                }
            },
            "required": ["user_id", "text"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "send_slack_direct_message", correlation_id = %context.correlation()))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: DirectMessageParams = parse_args(args)?;

        let result = self
            .gateway
            .send_direct_message(&params.user_id, &params.text)
            .await;
        if let Some(failure) = result.failure() {
            error!("Failed to send direct message: {}", failure.error);
        }

        Ok(ToolResult::envelope(&result))
    }
}

#[derive(Debug, Deserialize)]
struct DirectMessageParams {
    user_id: String,
    text: String,
}

/// Tool to add an emoji reaction to a message.
pub struct AddReactionTool {
    gateway: Arc<SlackGateway>,
}

impl AddReactionTool {
    pub fn new(gateway: Arc<SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for AddReactionTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "add_reaction_to_message",
            "Add an emoji reaction to a Slack message",
        )
        .with_category("messaging")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "channel_id": {
                    "type": "string",
                    "description": "Channel containing the message"
                },
                "timestamp": {
                    "type": "string",
                    "description": "Message timestamp (ts)"
                },
                "emoji": {
                    "type": "string",
                    "description": "Emoji name without colons",
                    "default": DEFAULT_REACTION
                }
            },
            "required": ["channel_id", "timestamp"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "add_reaction_to_message", correlation_id = %context.correlation()))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: AddReactionParams = parse_args(args)?;

        let result = self
            .gateway
            .add_reaction(&params.channel_id, &params.timestamp, &params.emoji)
            .await;
        if let Some(failure) = result.failure() {
            error!("Failed to add reaction: {}", failure.error);
        }

        Ok(ToolResult::envelope(&result))
    }
}

#[derive(Debug, Deserialize)]
struct AddReactionParams {
    channel_id: String,
    timestamp: String,
    #[serde(default = "default_emoji")]
    emoji: String,
}

fn default_emoji() -> String {
    DEFAULT_REACTION.to_string()
}

/// Tool to read recent channel messages.
pub struct ChannelHistoryTool {
    gateway: Arc<SlackGateway>,
}

impl ChannelHistoryTool {
    pub fn new(gateway: Arc<SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for ChannelHistoryTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_slack_channel_history",
            "Get recent messages from a Slack channel with author names",
        )
        .with_category("messaging")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "channel_id": {
                    "type": "string",
                    "description": "Channel ID"
                },
                "limit": {
                    "type": "integer",
                    "description": "Number of messages (1-100)",
                    "default": DEFAULT_HISTORY_LIMIT,
                    "minimum": 1,
                    "maximum": 100
                }
            },
            "required": ["channel_id"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "get_slack_channel_history", correlation_id = %context.correlation()))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: HistoryParams = parse_args(args)?;

        debug!("Fetching history for {}", params.channel_id);
        let result = self
            .gateway
            .channel_history(&params.channel_id, params.limit)
            .await;
        if let Some(failure) = result.failure() {
            error!("Failed to fetch channel history: {}", failure.error);
        }

        Ok(ToolResult::envelope(&result))
    }
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    channel_id: String,
    #[serde(default = "default_history_limit")]
    limit: i64,
}

fn default_history_limit() -> i64 {
    DEFAULT_HISTORY_LIMIT
}

/// Name the composite tool was first published under.
pub const LEGACY_REACTION_TOOL_NAME: &str = "send_pepe_message_with_reaction";

/// Tool to post a message and react to it in one call.
pub struct SendMessageWithReactionTool {
    gateway: Arc<SlackGateway>,
    name: &'static str,
}

impl SendMessageWithReactionTool {
    pub fn new(gateway: Arc<SlackGateway>) -> Self {
        Self {
            gateway,
            name: "send_message_with_reaction",
        }
    }

    /// Same tool, registered under its legacy name.
    pub fn legacy(gateway: Arc<SlackGateway>) -> Self {
        Self {
            gateway,
            name: LEGACY_REACTION_TOOL_NAME,
        }
    }
}

#[async_trait]
impl Tool for SendMessageWithReactionTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            self.name,
            "Send a message to a channel or user and add a reaction to it",
        )
        .with_category("messaging")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "channel": {
                    "type": "string",
                    "description": "Channel ID or name; mutually exclusive with user_id"
                },
                "user_id": {
                    "type": "string",
                    "description": "User ID to DM; mutually exclusive with channel"
                },
                "text": {
                    "type": "string",
                    "description": "Message text"
                },
                "emoji": {
                    "type": "string",
                    "description": "Emoji name without colons",
                    "default": DEFAULT_REACTION
                }
            },
            "required": ["text"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = self.name, correlation_id = %context.correlation()))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: MessageWithReactionParams = parse_args(args)?;
        let target = params.target()?;

        let result = self
            .gateway
            .send_message_with_reaction(&target, &params.text, &params.emoji)
            .await;
        if let Some(failure) = result.failure() {
            error!("Failed to send message with reaction: {}", failure.error);
        }

        Ok(ToolResult::envelope(&result))
    }
}

#[derive(Debug, Deserialize)]
struct MessageWithReactionParams {
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    text: String,
    #[serde(default = "default_emoji")]
    emoji: String,
}

impl MessageWithReactionParams {
    fn target(&self) -> McpServerResult<MessageTarget> {
        match (self.channel.as_deref(), self.user_id.as_deref()) {
            (Some(channel), None) if !channel.is_empty() => {
                Ok(MessageTarget::Channel(channel.to_string()))
            }
            (None, Some(user_id)) if !user_id.is_empty() => {
                Ok(MessageTarget::User(user_id.to_string()))
            }
            _ => Err(McpServerError::InvalidParams(
                "exactly one of 'channel' or 'user_id' is required".to_string(),
            )),
        }
    }
}

/// Get all messaging tools.
pub fn messaging_tools(gateway: Arc<SlackGateway>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SendMessageTool::new(gateway.clone())),
        Arc::new(SendDirectMessageTool::new(gateway.clone())),
        Arc::new(AddReactionTool::new(gateway.clone())),
        Arc::new(ChannelHistoryTool::new(gateway.clone())),
        Arc::new(SendMessageWithReactionTool::new(gateway.clone())),
        Arc::new(SendMessageWithReactionTool::legacy(gateway)),
    ]
}
