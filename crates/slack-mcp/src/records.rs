//! Typed records returned by gateway operations, plus the raw Slack payload
//! shapes they are decoded from.
//!
//! Raw shapes default every optional field so that sparse Slack objects decode
//! cleanly; only identifiers are required.

use serde::{Deserialize, Serialize};

/// Which `conversations.list` visibility class a channel came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelScope {
    /// `types=public_channel`
    Public,
    /// `types=private_channel`
    Private,
}

impl ChannelScope {
    /// Value for the `types` argument.
    pub fn as_types_param(&self) -> &'static str {
        match self {
            ChannelScope::Public => "public_channel",
            ChannelScope::Private => "private_channel",
        }
    }
}

/// A channel visible to the bot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelRecord {
    /// Channel ID.
    pub id: String,
    /// Channel name without `#`.
    pub name: String,
    /// Whether the channel came from the private scope.
    pub is_private: bool,
    /// Whether the bot is a member.
    pub is_member: bool,
    /// Topic text.
    pub topic: String,
    /// Purpose text.
    pub purpose: String,
}

impl ChannelRecord {
    pub(crate) fn from_raw(raw: RawChannel, scope: ChannelScope) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            is_private: scope == ChannelScope::Private,
            is_member: raw.is_member,
            topic: raw.topic.value,
            purpose: raw.purpose.value,
        }
    }
}

/// A channel message, with the author's display name resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRecord {
    pub text: String,
    pub user_id: String,
    /// Author's real name; empty when unknown.
    pub user_name: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub subtype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_thread_reply: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_timestamp: Option<String>,
}

impl MessageRecord {
    pub(crate) fn from_raw(raw: RawMessage, user_name: String) -> Self {
        let thread_timestamp = raw.thread_ts.filter(|ts| !ts.is_empty());

        Self {
            text: raw.text,
            user_id: raw.user.unwrap_or_default(),
            user_name,
            timestamp: raw.ts,
            kind: raw.kind,
            subtype: raw.subtype,
            is_thread_reply: thread_timestamp.as_ref().map(|_| true),
            thread_timestamp,
        }
    }
}

/// A workspace member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub real_name: String,
    pub display_name: String,
    pub email: String,
    pub is_bot: bool,
    pub is_admin: bool,
    pub is_owner: bool,
    /// Profile status text.
    pub status: String,
    pub timezone: String,
    /// 72px avatar URL.
    pub image_url: String,
}

impl UserRecord {
    /// `None` for members flagged deleted upstream.
    pub(crate) fn from_raw(raw: RawMember) -> Option<Self> {
        if raw.deleted {
            return None;
        }

        Some(Self {
            id: raw.id,
            name: raw.name,
            real_name: raw.real_name,
            display_name: raw.profile.display_name,
            email: raw.profile.email,
            is_bot: raw.is_bot,
            is_admin: raw.is_admin,
            is_owner: raw.is_owner,
            status: raw.profile.status_text,
            timezone: raw.tz,
            image_url: raw.profile.image_72,
        })
    }
}

/// A `search.messages` match, enriched with channel and author names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMatch {
    pub text: String,
    pub user_id: String,
    pub user_name: String,
    pub channel_id: String,
    pub channel_name: String,
    pub timestamp: String,
    pub permalink: String,
    pub score: f64,
}

impl SearchMatch {
    pub(crate) fn from_raw(raw: RawMatch, channel_name: String, user_name: String) -> Self {
        Self {
            text: raw.text,
            user_id: raw.user.unwrap_or_default(),
            user_name,
            channel_id: raw.channel.id,
            channel_name,
            timestamp: raw.ts,
            permalink: raw.permalink,
            score: raw.score,
        }
    }
}

// Raw Slack shapes.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawTextValue {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawChannel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub topic: RawTextValue,
    #[serde(default)]
    pub purpose: RawTextValue,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawChannelList {
    #[serde(default)]
    pub channels: Vec<RawChannel>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub ts: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHistory {
    #[serde(default)]
    pub messages: Vec<RawMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawProfile {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub image_72: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMember {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub tz: String,
    #[serde(default)]
    pub profile: RawProfile,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMemberList {
    #[serde(default)]
    pub members: Vec<RawMember>,
}

/// `users.info` response; only the real name is used.
#[derive(Debug, Deserialize)]
pub(crate) struct RawUserInfo {
    #[serde(default)]
    pub user: RawUserName,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawUserName {
    #[serde(default)]
    pub real_name: String,
}

/// `conversations.info` response; only the name is used.
#[derive(Debug, Deserialize)]
pub(crate) struct RawChannelInfo {
    #[serde(default)]
    pub channel: RawChannelName,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawChannelName {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawMatch {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub channel: RawChannelName,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawSearchMessages {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSearch {
    #[serde(default)]
    pub messages: RawSearchMessages,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_record_from_raw() {
        let raw: RawChannel = serde_json::from_value(json!({
            "id": "C1",
            "name": "general",
            "is_member": true,
            "topic": {"value": "Company-wide", "creator": "U1"},
            "purpose": {"value": "Announcements"}
        }))
        .unwrap();

        let record = ChannelRecord::from_raw(raw, ChannelScope::Private);
        assert_eq!(record.id, "C1");
        assert!(record.is_private);
        assert!(record.is_member);
        assert_eq!(record.topic, "Company-wide");
        assert_eq!(record.purpose, "Announcements");
    }

    #[test]
    fn test_channel_record_sparse() {
        let raw: RawChannel = serde_json::from_value(json!({"id": "C2"})).unwrap();
        let record = ChannelRecord::from_raw(raw, ChannelScope::Public);
        assert!(!record.is_private);
        assert!(!record.is_member);
        assert_eq!(record.topic, "");
    }

    #[test]
    fn test_message_thread_reply() {
        let raw: RawMessage = serde_json::from_value(json!({
            "type": "message",
            "user": "U1",
            "text": "in thread",
            "ts": "1700000001.000200",
            "thread_ts": "1700000000.000100"
        }))
        .unwrap();

        let record = MessageRecord::from_raw(raw, "Pepe".to_string());
        assert_eq!(record.is_thread_reply, Some(true));
        assert_eq!(record.thread_timestamp.as_deref(), Some("1700000000.000100"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["user_name"], "Pepe");
    }

    #[test]
    fn test_message_without_thread() {
        let raw: RawMessage = serde_json::from_value(json!({
            "type": "message",
            "subtype": "bot_message",
            "text": "beep",
            "ts": "1",
            "thread_ts": ""
        }))
        .unwrap();

        let record = MessageRecord::from_raw(raw, String::new());
        assert_eq!(record.user_id, "");
        assert_eq!(record.subtype, "bot_message");
        assert!(record.is_thread_reply.is_none());

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("is_thread_reply").is_none());
        assert!(value.get("thread_timestamp").is_none());
    }

    #[test]
    fn test_user_record_filters_deleted() {
        let deleted: RawMember =
            serde_json::from_value(json!({"id": "U0", "deleted": true})).unwrap();
        assert!(UserRecord::from_raw(deleted).is_none());

        let active: RawMember = serde_json::from_value(json!({
            "id": "U1",
            "name": "pepe",
            "real_name": "Pepe Frog",
            "is_admin": true,
            "tz": "Asia/Seoul",
            "profile": {
                "display_name": "pepe",
                "email": "pepe@example.com",
                "status_text": "ribbit",
                "image_72": "https://example.com/72.png"
            }
        }))
        .unwrap();

        let record = UserRecord::from_raw(active).unwrap();
        assert_eq!(record.real_name, "Pepe Frog");
        assert_eq!(record.status, "ribbit");
        assert_eq!(record.timezone, "Asia/Seoul");
        assert_eq!(record.image_url, "https://example.com/72.png");
        assert!(record.is_admin);
        assert!(!record.is_owner);
    }

    #[test]
    fn test_search_match_integer_score() {
        let raw: RawMatch = serde_json::from_value(json!({
            "text": "pepe",
            "user": "U1",
            "channel": {"id": "C1", "name": "general"},
            "ts": "1",
            "permalink": "https://example.slack.com/archives/C1/p1",
            "score": 3
        }))
        .unwrap();

        let record = SearchMatch::from_raw(raw, "general".to_string(), String::new());
        assert_eq!(record.score, 3.0);
        assert_eq!(record.channel_id, "C1");
        assert_eq!(record.user_name, "");
    }
}
