//! # Slack MCP
//!
//! This crate exposes a Slack workspace to AI assistants as a set of MCP
//! (Model Context Protocol) tools backed by the Slack Web API.
//!
//! ## Overview
//!
//! The slack-mcp crate handles:
//! - **Client**: token selection, request dispatch and configuration
//! - **Envelope**: the uniform success/failure shape every operation returns
//! - **Operations**: Slack workflows such as posting, history, search and uploads
//! - **Tools**: MCP tool definitions wrapping each operation
//! - **JSON-RPC**: MCP protocol implementation
//!
//! ## MCP Protocol
//!
//! Supported methods:
//! - `initialize`: Initialize the MCP session
//! - `ping`: Liveness check
//! - `tools/list`: List available tools
//! - `tools/call`: Execute a tool
//!
//! ## Available Tools
//!
//! ### Messaging
//! - `send_slack_message`: Post a message to a channel
//! - `send_slack_direct_message`: Send a DM to a user
//! - `add_reaction_to_message`: React to a message
//! - `get_slack_channel_history`: Recent messages with author names
//! - `send_message_with_reaction`: Post and react in one call
//!   (also registered as `send_pepe_message_with_reaction`)
//!
//! ### Directory
//! - `get_slack_channels`: Public and private channels
//! - `invite_user_to_channel`: Invite a user to a channel
//! - `get_slack_users`: Active workspace members
//! - `search_slack_messages`: Message search (needs a user token)
//!
//! ### Files
//! - `upload_file_to_slack`: Legacy single-request upload
//! - `upload_file_to_slack_new`: Two-phase external upload
//! - `upload_file_from_base64`: Upload base64 content as a named file
//!
//! ## Usage
//!
//! ### Calling operations directly
//!
//! ```rust,no_run
//! use slack_mcp::{SlackConfig, SlackGateway};
//!
//! async fn post() -> Result<(), slack_mcp::ConfigError> {
//!     let gateway = SlackGateway::new(SlackConfig::new("xoxb-..."))?;
//!     let posted = gateway.send_message("#general", "Deploy finished").await;
//!     println!("{}", serde_json::to_string(&posted).unwrap());
//!     Ok(())
//! }
//! ```
//!
//! ### Serving MCP requests
//!
//! ```rust,no_run
//! use slack_mcp::{tools::all_tools, McpRequest, McpServer, SlackGateway};
//! use std::sync::Arc;
//!
//! async fn handle(json: &str) {
//!     let gateway = Arc::new(SlackGateway::from_env().unwrap());
//!     let server = McpServer::slack();
//!     server.register_tools(all_tools(gateway)).await;
//!
//!     let request: McpRequest = serde_json::from_str(json).unwrap();
//!     let response = server.handle_request(request).await;
//!     println!("{}", serde_json::to_string(&response).unwrap());
//! }
//! ```

pub mod client;
pub mod envelope;
pub mod limits;
pub mod operations;
pub mod records;
pub mod server;
pub mod tools;
pub mod types;

// Re-export main types
pub use client::{ConfigError, SlackClient, SlackConfig, TokenKind};
pub use envelope::{Envelope, Failure, RemoteResult};
pub use limits::{LimitError, MAX_COUNT, MAX_FILE_SIZE, MIN_COUNT};
pub use operations::{MessageTarget, SearchSort, SlackGateway, UploadError, UploadOptions};
pub use server::{McpServer, McpServerError, McpServerResult, Tool, ToolContext};
pub use types::{
    ContentBlock, McpError, McpRequest, McpResponse, RequestId, ServerCapabilities, ServerInfo,
    ToolCall, ToolCapabilities, ToolDefinition, ToolResult,
};

// Re-export tool collections
pub use tools::{all_tools, directory_tools, file_tools, messaging_tools};
