//! Workspace member directory.

use super::SlackGateway;
use crate::client::endpoints;
use crate::client::{HttpMethod, TokenKind};
use crate::envelope::{Envelope, Failure};
use crate::records::{RawMemberList, UserRecord};
use serde::Serialize;
use tracing::{debug, instrument};

/// Active workspace members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDirectory {
    pub total_users: usize,
    pub users: Vec<UserRecord>,
}

impl SlackGateway {
    /// List workspace members (`users.list`), excluding deleted accounts.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Envelope<UserDirectory> {
        self.fetch_users().await.into()
    }

    async fn fetch_users(&self) -> Result<UserDirectory, Failure> {
        let payload = self
            .client
            .dispatch(endpoints::USERS_LIST, HttpMethod::Get, None, TokenKind::Bot)
            .await
            .into_payload("Could not list users")?;

        let list: RawMemberList = payload.decode()?;
        let fetched = list.members.len();
        let users: Vec<UserRecord> = list
            .members
            .into_iter()
            .filter_map(UserRecord::from_raw)
            .collect();

        debug!("{} members, {} active", fetched, users.len());

        Ok(UserDirectory {
            total_users: users.len(),
            users,
        })
    }
}
