//! Slack MCP server over stdio.
//!
//! Reads newline-delimited JSON-RPC requests from stdin and writes one
//! response line per request to stdout. Logs go to stderr.

use slack_mcp::{all_tools, McpError, McpRequest, McpResponse, McpServer, RequestId, SlackGateway};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slack_mcp=info".into()),
        )
        .init();

    let gateway = match SlackGateway::from_env() {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !gateway.client().credentials().has_user_token() {
        warn!("SLACK_USER_TOKEN not set; search_slack_messages will fail");
    }

    let server = McpServer::slack();
    server.register_tools(all_tools(gateway)).await;
    info!(
        "{} {} ready with {} tools",
        server.info().name,
        server.info().version,
        server.list_tools().await.len()
    );

    match serve_stdio(&server).await {
        Ok(()) => {
            info!("stdin closed, shutting down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("stdio transport failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve_stdio(server: &McpServer) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<McpRequest>(line) {
            Ok(request) if request.is_notification() => {
                debug!("Notification {}", request.method);
                continue;
            }
            Ok(request) => server.handle_request(request).await,
            Err(e) => {
                warn!("Unparseable request: {}", e);
                McpResponse::error(
                    RequestId::Null,
                    McpError::parse_error().with_data(e.to_string().into()),
                )
            }
        };

        let mut encoded = match serde_json::to_vec(&response) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("Failed to encode response: {}", e);
                continue;
            }
        };
        encoded.push(b'\n');
        stdout.write_all(&encoded).await?;
        stdout.flush().await?;
    }

    Ok(())
}
