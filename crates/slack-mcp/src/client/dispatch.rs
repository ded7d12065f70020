//! Slack Web API client.
//!
//! Issues exactly one authenticated HTTP call per dispatch and turns every
//! transport-level failure into a `{ok: false, error}` [`RemoteResult`], so
//! callers never see a raw `reqwest::Error` from an API call.

use super::config::{join_url, ConfigError, SlackConfig};
use super::credentials::{Credential, CredentialSelector, TokenKind};
use super::endpoints;
use crate::envelope::RemoteResult;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// HTTP verb for a Web API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Arguments are sent as a query string.
    Get,
    /// Arguments are sent as a JSON body.
    Post,
}

/// Slack Web API client.
#[derive(Debug, Clone)]
pub struct SlackClient {
    /// HTTP client instance.
    client: Client,

    /// Web API base URL.
    base_url: String,

    /// Bot and user tokens.
    credentials: CredentialSelector,
}

impl SlackClient {
    /// Create a new Slack client.
    pub fn new(config: &SlackConfig) -> Result<Self, ConfigError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
            credentials: CredentialSelector::from_config(config)?,
        })
    }

    /// Token selector backing this client.
    pub fn credentials(&self) -> &CredentialSelector {
        &self.credentials
    }

    /// Full URL for a Web API method.
    pub fn url(&self, endpoint: &str) -> String {
        join_url(&self.base_url, endpoint)
    }

    /// Call a Web API method.
    ///
    /// A missing user token short-circuits before any request is made.
    #[instrument(skip(self, payload), fields(endpoint = %endpoint, method = ?method, token = ?token))]
    pub async fn dispatch(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<&Value>,
        token: TokenKind,
    ) -> RemoteResult {
        let credential = match self.credential(token) {
            Ok(credential) => credential,
            Err(result) => return result,
        };

        let url = self.url(endpoint);
        debug!("Calling Slack {}", endpoint);

        let request = match method {
            HttpMethod::Get => {
                let request = self.client.get(&url);
                match payload {
                    Some(payload) => request.query(&query_pairs(payload)),
                    None => request,
                }
            }
            HttpMethod::Post => {
                let request = self.client.post(&url);
                match payload {
                    Some(payload) => request.json(payload),
                    None => request,
                }
            }
        };

        self.execute(endpoint, request.bearer_auth(credential.expose()))
            .await
    }

    /// Upload raw bytes to a one-time URL returned by `files.getUploadURLExternal`.
    ///
    /// The URL is not under the API base and carries no bearer token.
    #[instrument(skip(self, upload_url, bytes), fields(filename = %filename, size = bytes.len()))]
    pub async fn upload_to_url(
        &self,
        upload_url: &str,
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StatusCode, reqwest::Error> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)?;
        let form = Form::new().part("file", part);

        let response = self.client.post(upload_url).multipart(form).send().await?;
        debug!("Upload URL answered {}", response.status());
        Ok(response.status())
    }

    /// Single-request multipart upload through the legacy `files.upload` method.
    #[instrument(skip(self, fields, bytes), fields(filename = %filename, size = bytes.len()))]
    pub async fn upload_legacy(
        &self,
        fields: &[(&str, &str)],
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> RemoteResult {
        let credential = match self.credential(TokenKind::Bot) {
            Ok(credential) => credential,
            Err(result) => return result,
        };

        let part = match Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)
        {
            Ok(part) => part,
            Err(e) => return transport_failure(endpoints::FILES_UPLOAD, &e),
        };

        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }
        let form = form.part("file", part);

        let request = self
            .client
            .post(self.url(endpoints::FILES_UPLOAD))
            .bearer_auth(credential.expose())
            .multipart(form);

        self.execute(endpoints::FILES_UPLOAD, request).await
    }

    fn credential(&self, token: TokenKind) -> Result<&Credential, RemoteResult> {
        self.credentials.select(token).map_err(|failure| {
            warn!("No credential for {:?} token: {}", token, failure.error);
            RemoteResult::failure(failure.error)
        })
    }

    async fn execute(&self, endpoint: &str, request: RequestBuilder) -> RemoteResult {
        match Self::send(request).await {
            Ok(result) => {
                if !result.is_ok() {
                    debug!(
                        "Slack {} returned ok=false: {}",
                        endpoint,
                        result.error().unwrap_or("unknown")
                    );
                }
                result
            }
            Err(e) => transport_failure(endpoint, &e),
        }
    }

    async fn send(request: RequestBuilder) -> Result<RemoteResult, reqwest::Error> {
        let response = request.send().await?.error_for_status()?;
        let body: Value = response.json().await?;
        Ok(RemoteResult::from_value(body))
    }
}

fn transport_failure(endpoint: &str, err: &reqwest::Error) -> RemoteResult {
    warn!("Slack request to {} failed: {}", endpoint, err);
    RemoteResult::failure(format!("HTTP request error: {}", err))
}

/// Flatten a JSON object into query parameters. Strings are sent as-is,
/// other scalars in their JSON form; nulls are dropped.
fn query_pairs(payload: &Value) -> Vec<(String, String)> {
    let Some(object) = payload.as_object() else {
        return Vec::new();
    };

    object
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect()
}
