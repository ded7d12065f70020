//! Message search with channel and author enrichment.
//!
//! `search.messages` only accepts user tokens, so the search call itself uses
//! the user token while the per-match lookups use the bot token.

use super::SlackGateway;
use crate::client::endpoints;
use crate::client::{HttpMethod, TokenKind};
use crate::envelope::{Envelope, Failure};
use crate::limits::clamp_count;
use crate::records::{RawSearch, SearchMatch};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

/// Result ordering for `search.messages`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSort {
    /// Newest first.
    #[default]
    Timestamp,
    /// Most relevant first.
    Score,
}

impl SearchSort {
    /// Value for the `sort` argument.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchSort::Timestamp => "timestamp",
            SearchSort::Score => "score",
        }
    }
}

/// Search matches for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: String,
    /// Total reported by Slack, not the size of `messages`.
    pub total_results: u64,
    pub message_count: usize,
    pub messages: Vec<SearchMatch>,
}

impl SlackGateway {
    /// Search messages across the workspace.
    ///
    /// `count` is clamped into `[1, 100]`. Without a user token this fails
    /// before any request is made. Each match gets one channel lookup and one
    /// author lookup, in order; failed lookups leave the names empty.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search_messages(
        &self,
        query: &str,
        sort: SearchSort,
        count: i64,
    ) -> Envelope<SearchResults> {
        self.run_search(query, sort, count).await.into()
    }

    async fn run_search(
        &self,
        query: &str,
        sort: SearchSort,
        count: i64,
    ) -> Result<SearchResults, Failure> {
        if let Err(failure) = self.client.credentials().select(TokenKind::User) {
            warn!("Search unavailable: {}", failure.error);
            return Err(failure);
        }

        let count = clamp_count(count);
        let payload = self
            .client
            .dispatch(
                endpoints::SEARCH_MESSAGES,
                HttpMethod::Get,
                Some(&json!({
                    "query": query,
                    "sort": sort.as_str(),
                    "count": count
                })),
                TokenKind::User,
            )
            .await
            .into_payload("Message search failed")?;

        let search: RawSearch = payload.decode()?;
        let total_results = search.messages.total;
        debug!(
            "{} of {} matches returned",
            search.messages.matches.len(),
            total_results
        );

        let mut messages = Vec::with_capacity(search.messages.matches.len());
        for raw in search.messages.matches {
            let channel_name = self.lookup_channel_name(&raw.channel.id).await;
            let user_name = match raw.user.as_deref() {
                Some(user_id) => self.lookup_user_name(user_id).await,
                None => String::new(),
            };
            messages.push(SearchMatch::from_raw(raw, channel_name, user_name));
        }

        Ok(SearchResults {
            query: query.to_string(),
            total_results,
            message_count: messages.len(),
            messages,
        })
    }
}
