//! Slack workflow operations.
//!
//! [`SlackGateway`] is the explicit context every operation runs against: it
//! owns the [`SlackClient`] and the upload staging settings. Each operation
//! issues its calls strictly in sequence and returns an [`Envelope`].
//!
//! - `messages`: post, DM, react, history, post-and-react
//! - `channels`: channel listing and invites
//! - `users`: member directory
//! - `search`: message search with channel/author enrichment
//! - `files`: legacy, two-phase and base64 uploads
//!
//! [`Envelope`]: crate::envelope::Envelope

pub mod channels;
pub mod files;
pub mod messages;
pub mod search;
pub mod users;

pub use channels::{ChannelListing, UserInvited};
pub use files::{
    Base64Uploaded, FileUploaded, LegacyFileUploaded, UploadError, UploadOptions,
    BASE64_UPLOAD_FAILED,
};
pub use messages::{
    ChannelHistory, MessagePosted, MessageTarget, MessageWithReaction, ReactionAdded,
    DM_CHANNEL_MISSING,
};
pub use search::{SearchResults, SearchSort};
pub use users::UserDirectory;

use crate::client::endpoints;
use crate::client::{ConfigError, HttpMethod, SlackClient, SlackConfig, TokenKind};
use crate::records::{RawChannelInfo, RawUserInfo};
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

/// Default reaction added by the post-and-react tool.
pub const DEFAULT_REACTION: &str = "jammies-frog";

/// Entry point for all Slack operations.
#[derive(Debug, Clone)]
pub struct SlackGateway {
    /// Web API client.
    client: SlackClient,

    /// Parent directory for base64 upload staging.
    scratch_dir: Option<PathBuf>,
}

impl SlackGateway {
    /// Create a gateway. Fails if the bot token is missing.
    pub fn new(config: SlackConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: SlackClient::new(&config)?,
            scratch_dir: config.scratch_dir,
        })
    }

    /// Create a gateway from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(SlackConfig::from_env()?)
    }

    /// The underlying Web API client.
    pub fn client(&self) -> &SlackClient {
        &self.client
    }

    /// Resolve a user's real name with the bot token.
    ///
    /// Lookup failures are swallowed into an empty name.
    pub(crate) async fn lookup_user_name(&self, user_id: &str) -> String {
        if user_id.is_empty() {
            return String::new();
        }

        let result = self
            .client
            .dispatch(
                endpoints::USERS_INFO,
                HttpMethod::Get,
                Some(&json!({ "user": user_id })),
                TokenKind::Bot,
            )
            .await;

        match result.into_payload("user lookup failed") {
            Ok(payload) => payload
                .decode::<RawUserInfo>()
                .map(|info| info.user.real_name)
                .unwrap_or_default(),
            Err(failure) => {
                debug!("User lookup for {} failed: {}", user_id, failure.error);
                String::new()
            }
        }
    }

    /// Resolve a channel's name with the bot token.
    ///
    /// Lookup failures are swallowed into an empty name.
    pub(crate) async fn lookup_channel_name(&self, channel_id: &str) -> String {
        if channel_id.is_empty() {
            return String::new();
        }

        let result = self
            .client
            .dispatch(
                endpoints::CONVERSATIONS_INFO,
                HttpMethod::Get,
                Some(&json!({ "channel": channel_id })),
                TokenKind::Bot,
            )
            .await;

        match result.into_payload("channel lookup failed") {
            Ok(payload) => payload
                .decode::<RawChannelInfo>()
                .map(|info| info.channel.name)
                .unwrap_or_default(),
            Err(failure) => {
                debug!("Channel lookup for {} failed: {}", channel_id, failure.error);
                String::new()
            }
        }
    }
}
