//! File upload tools
//!
//! Uploads from a local path (legacy and two-phase) and from base64 content.

use super::parse_args;
use crate::operations::{SlackGateway, UploadOptions};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, instrument};

fn path_upload_schema(filetype_description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "channels": {
                "type": "string",
                "description": "Comma-separated channel IDs to share the file into"
            },
            "file_path": {
                "type": "string",
                "description": "Path of the local file to upload"
            },
            "title": {
                "type": "string",
                "description": "File title"
            },
            "initial_comment": {
                "type": "string",
                "description": "Message posted with the file"
            },
            "filetype": {
                "type": "string",
                "description": filetype_description
            }
        },
        "required": ["channels", "file_path"]
    })
}

#[derive(Debug, Deserialize)]
struct PathUploadParams {
    channels: String,
    file_path: PathBuf,
    #[serde(default)]
    title: String,
    #[serde(default)]
    initial_comment: String,
    #[serde(default)]
    filetype: Option<String>,
}

impl PathUploadParams {
    /// Options for `files.upload`, where `filetype` is a Slack file type.
    fn legacy_options(&self) -> UploadOptions {
        UploadOptions {
            title: self.title.clone(),
            initial_comment: self.initial_comment.clone(),
            mime_type: None,
            filetype: self.filetype.clone(),
        }
    }

    /// Options for the external upload flow, where `filetype` overrides the
    /// part's MIME type.
    fn external_options(&self) -> UploadOptions {
        UploadOptions {
            title: self.title.clone(),
            initial_comment: self.initial_comment.clone(),
            mime_type: self.filetype.clone(),
            filetype: None,
        }
    }
}

/// Tool to upload a local file through the legacy `files.upload` method.
pub struct UploadFileTool {
    gateway: Arc<SlackGateway>,
}

impl UploadFileTool {
    pub fn new(gateway: Arc<SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for UploadFileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "upload_file_to_slack",
            "Upload a local file to Slack channels (legacy files.upload)",
        )
        .with_category("files")
        .with_schema(path_upload_schema(
            "Slack file type identifier (e.g. 'python', 'pdf'); auto-detected when omitted",
        ))
    }

    #[instrument(skip(self, args, context), fields(tool = "upload_file_to_slack", correlation_id = %context.correlation()))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: PathUploadParams = parse_args(args)?;

        let result = self
            .gateway
            .upload_file_legacy(&params.channels, &params.file_path, &params.legacy_options())
            .await;
        if let Some(failure) = result.failure() {
            error!("Failed to upload file: {}", failure.error);
        }

        Ok(ToolResult::envelope(&result))
    }
}

/// Tool to upload a local file through the two-phase external upload flow.
pub struct UploadFileExternalTool {
    gateway: Arc<SlackGateway>,
}

impl UploadFileExternalTool {
    pub fn new(gateway: Arc<SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for UploadFileExternalTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "upload_file_to_slack_new",
            "Upload a local file to Slack channels (files.getUploadURLExternal flow)",
        )
        .with_category("files")
        .with_schema(path_upload_schema(
            "MIME type of the file (e.g. 'text/csv'); detected from the extension when omitted",
        ))
    }

    #[instrument(skip(self, args, context), fields(tool = "upload_file_to_slack_new", correlation_id = %context.correlation()))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: PathUploadParams = parse_args(args)?;

        let result = self
            .gateway
            .upload_file(&params.channels, &params.file_path, &params.external_options())
            .await;
        if let Some(failure) = result.failure() {
            error!("Failed to upload file: {}", failure.error);
        }

        Ok(ToolResult::envelope(&result))
    }
}

/// Tool to upload base64-encoded content as a named file.
pub struct UploadBase64Tool {
    gateway: Arc<SlackGateway>,
}

impl UploadBase64Tool {
    pub fn new(gateway: Arc<SlackGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for UploadBase64Tool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "upload_file_from_base64",
            "Upload base64-encoded content to Slack channels as a named file",
        )
        .with_category("files")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "channels": {
                    "type": "string",
                    "description": "Comma-separated channel IDs to share the file into"
                },
                "file_data": {
                    "type": "string",
                    "description": "Base64-encoded file content"
                },
                "filename": {
                    "type": "string",
                    "description": "File name, without directories (e.g. 'report.pdf')"
                },
                "title": {
                    "type": "string",
                    "description": "File title"
                },
                "initial_comment": {
                    "type": "string",
                    "description": "Message posted with the file"
                }
            },
            "required": ["channels", "file_data", "filename"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "upload_file_from_base64", correlation_id = %context.correlation()))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: Base64UploadParams = parse_args(args)?;

        let options = UploadOptions {
            title: params.title,
            initial_comment: params.initial_comment,
            ..UploadOptions::default()
        };
        let result = self
            .gateway
            .upload_file_base64(&params.channels, &params.file_data, &params.filename, &options)
            .await;
        if let Some(failure) = result.failure() {
            error!("Failed to upload base64 file: {}", failure.error);
        }

        Ok(ToolResult::envelope(&result))
    }
}

#[derive(Deserialize)]
struct Base64UploadParams {
    channels: String,
    file_data: String,
    filename: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    initial_comment: String,
}

/// Get all file tools.
pub fn file_tools(gateway: Arc<SlackGateway>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(UploadFileTool::new(gateway.clone())),
        Arc::new(UploadFileExternalTool::new(gateway.clone())),
        Arc::new(UploadBase64Tool::new(gateway)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_gateway;
    use serde_json::json;

    #[test]
    fn test_path_upload_options() {
        let params: PathUploadParams = serde_json::from_value(json!({
            "channels": "C1,C2",
            "file_path": "/tmp/report.pdf",
            "title": "Report"
        }))
        .unwrap();

        let options = params.external_options();
        assert_eq!(options.title, "Report");
        assert!(options.initial_comment.is_empty());
        assert!(options.mime_type.is_none());
    }

    #[test]
    fn test_filetype_routing() {
        let params: PathUploadParams = serde_json::from_value(json!({
            "channels": "C1",
            "file_path": "/tmp/script.py",
            "filetype": "python"
        }))
        .unwrap();

        let legacy = params.legacy_options();
        assert_eq!(legacy.filetype.as_deref(), Some("python"));
        assert!(legacy.mime_type.is_none());

        let external = params.external_options();
        assert_eq!(external.mime_type.as_deref(), Some("python"));
        assert!(external.filetype.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_error_result() {
        let tool = UploadFileExternalTool::new(test_gateway());
        let result = tool
            .execute(
                json!({ "channels": "C1", "file_path": "/definitely/not/here.txt" }),
                &ToolContext::empty(),
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.first_text().unwrap().contains("File not found"));
    }

    #[tokio::test]
    async fn test_malformed_base64_is_error_result() {
        let tool = UploadBase64Tool::new(test_gateway());
        let result = tool
            .execute(
                json!({ "channels": "C1", "file_data": "not base64!", "filename": "x.txt" }),
                &ToolContext::empty(),
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.first_text().unwrap().contains("base64_upload_failed"));
    }
}
