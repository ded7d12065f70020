//! Message operations: post, direct message, reactions and channel history.

use super::SlackGateway;
use crate::client::endpoints;
use crate::client::{HttpMethod, TokenKind};
use crate::envelope::{Envelope, Failure};
use crate::limits::clamp_count;
use crate::records::{MessageRecord, RawHistory};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

/// Error when `conversations.open` succeeds without a channel id.
pub const DM_CHANNEL_MISSING: &str = "DM channel id missing from conversations.open response";

/// Where a message was posted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagePosted {
    /// Human-readable status.
    pub message: String,
    /// Message timestamp (`ts`), the message's id within the channel.
    pub timestamp: String,
    /// Channel the message landed in.
    pub channel: String,
}

/// A reaction added to a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionAdded {
    pub message: String,
    pub channel: String,
    pub timestamp: String,
    pub emoji: String,
}

/// Recent messages of a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelHistory {
    pub channel_id: String,
    pub message_count: usize,
    pub messages: Vec<MessageRecord>,
}

/// Destination of a composite post-and-react.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTarget {
    /// Channel ID or `#name`.
    Channel(String),
    /// User ID; the message goes to their DM channel.
    User(String),
}

/// Result of posting a message and reacting to it.
///
/// The reaction is best-effort: its failure is reported in `reaction_result`
/// without failing the whole operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageWithReaction {
    pub message: String,
    pub message_result: Envelope<MessagePosted>,
    pub reaction_result: Envelope<ReactionAdded>,
}

#[derive(Debug, Deserialize)]
struct RawPosted {
    #[serde(default)]
    ts: String,
    #[serde(default)]
    channel: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawOpenedChannel {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawOpened {
    #[serde(default)]
    channel: RawOpenedChannel,
}

impl SlackGateway {
    /// Post a message to a channel (`chat.postMessage`).
    #[instrument(skip(self, text), fields(channel = %channel))]
    pub async fn send_message(&self, channel: &str, text: &str) -> Envelope<MessagePosted> {
        self.post_message(channel, text).await.into()
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<MessagePosted, Failure> {
        let payload = self
            .client
            .dispatch(
                endpoints::CHAT_POST_MESSAGE,
                HttpMethod::Post,
                Some(&json!({ "channel": channel, "text": text })),
                TokenKind::Bot,
            )
            .await
            .into_payload("Unknown error occurred")?;

        let posted: RawPosted = payload.decode()?;
        info!("Posted message {} to {}", posted.ts, posted.channel);

        Ok(MessagePosted {
            message: "Message sent successfully".to_string(),
            timestamp: posted.ts,
            channel: posted.channel,
        })
    }

    /// Send a direct message: open (or reuse) the DM channel, then post to it.
    ///
    /// If the channel cannot be opened, no message is posted.
    #[instrument(skip(self, text), fields(user_id = %user_id))]
    pub async fn send_direct_message(&self, user_id: &str, text: &str) -> Envelope<MessagePosted> {
        match self.open_dm_channel(user_id).await {
            Ok(channel_id) => self.send_message(&channel_id, text).await,
            Err(failure) => {
                warn!("Could not open DM with {}: {}", user_id, failure.error);
                Envelope::Fail(failure)
            }
        }
    }

    async fn open_dm_channel(&self, user_id: &str) -> Result<String, Failure> {
        let payload = self
            .client
            .dispatch(
                endpoints::CONVERSATIONS_OPEN,
                HttpMethod::Post,
                Some(&json!({ "users": user_id })),
                TokenKind::Bot,
            )
            .await
            .into_payload("unknown error")
            .map_err(|failure| Failure {
                error: format!("Could not open DM channel: {}", failure.error),
                ..failure
            })?;

        let opened: RawOpened = payload.decode()?;
        if opened.channel.id.is_empty() {
            return Err(Failure::new(DM_CHANNEL_MISSING).with_details(payload.into_value()));
        }

        debug!("Opened DM channel {}", opened.channel.id);
        Ok(opened.channel.id)
    }

    /// Add an emoji reaction to a message (`reactions.add`).
    ///
    /// Surrounding colons on the emoji name are ignored.
    #[instrument(skip(self), fields(channel_id = %channel_id))]
    pub async fn add_reaction(
        &self,
        channel_id: &str,
        timestamp: &str,
        emoji: &str,
    ) -> Envelope<ReactionAdded> {
        let emoji = emoji.trim_matches(':');

        self.client
            .dispatch(
                endpoints::REACTIONS_ADD,
                HttpMethod::Post,
                Some(&json!({
                    "channel": channel_id,
                    "timestamp": timestamp,
                    "name": emoji
                })),
                TokenKind::Bot,
            )
            .await
            .into_payload("Failed to add reaction")
            .map(|_| ReactionAdded {
                message: format!("Added :{}: reaction", emoji),
                channel: channel_id.to_string(),
                timestamp: timestamp.to_string(),
                emoji: emoji.to_string(),
            })
            .into()
    }

    /// Fetch recent channel messages, resolving each author's real name.
    ///
    /// `limit` is clamped into `[1, 100]`. Author lookups run one per message,
    /// in order; a failed lookup leaves `user_name` empty.
    #[instrument(skip(self), fields(channel_id = %channel_id))]
    pub async fn channel_history(&self, channel_id: &str, limit: i64) -> Envelope<ChannelHistory> {
        self.fetch_history(channel_id, limit).await.into()
    }

    async fn fetch_history(&self, channel_id: &str, limit: i64) -> Result<ChannelHistory, Failure> {
        let limit = clamp_count(limit);

        let payload = self
            .client
            .dispatch(
                endpoints::CONVERSATIONS_HISTORY,
                HttpMethod::Get,
                Some(&json!({ "channel": channel_id, "limit": limit })),
                TokenKind::Bot,
            )
            .await
            .into_payload("Could not fetch channel history")?;

        let history: RawHistory = payload.decode()?;
        debug!("Fetched {} messages", history.messages.len());

        let mut messages = Vec::with_capacity(history.messages.len());
        for raw in history.messages {
            let user_name = match raw.user.as_deref() {
                Some(user_id) => self.lookup_user_name(user_id).await,
                None => String::new(),
            };
            messages.push(MessageRecord::from_raw(raw, user_name));
        }

        Ok(ChannelHistory {
            channel_id: channel_id.to_string(),
            message_count: messages.len(),
            messages,
        })
    }

    /// Post a message (to a channel or as a DM) and react to it.
    #[instrument(skip(self, text))]
    pub async fn send_message_with_reaction(
        &self,
        target: &MessageTarget,
        text: &str,
        emoji: &str,
    ) -> Envelope<MessageWithReaction> {
        let posted = match target {
            MessageTarget::Channel(channel) => self.send_message(channel, text).await,
            MessageTarget::User(user_id) => self.send_direct_message(user_id, text).await,
        };

        let posted = match posted.into_result() {
            Ok(posted) => posted,
            Err(failure) => return Envelope::Fail(failure),
        };

        let reaction_result = self
            .add_reaction(&posted.channel, &posted.timestamp, emoji)
            .await;

        let message = if reaction_result.is_success() {
            "Message sent and reaction added".to_string()
        } else {
            warn!("Message {} posted but reaction failed", posted.timestamp);
            "Message sent; reaction could not be added".to_string()
        };

        Envelope::Ok(MessageWithReaction {
            message,
            message_result: Envelope::Ok(posted),
            reaction_result,
        })
    }
}
