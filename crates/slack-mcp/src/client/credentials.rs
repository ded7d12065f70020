//! Bearer credentials and per-call token selection.

use super::config::{ConfigError, SlackConfig};
use crate::envelope::Failure;
use std::fmt;

/// Error returned when a user-token call is attempted without one.
pub const MISSING_USER_TOKEN: &str =
    "SLACK_USER_TOKEN is not configured; search requires a user token with search:read";

/// An opaque bearer token. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Wrap a token, treating blank values as absent.
    pub fn non_empty(token: String) -> Option<Self> {
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// The raw token, for the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Which configured token a call should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Bot token (`SLACK_BOT_TOKEN`).
    Bot,
    /// User token (`SLACK_USER_TOKEN`).
    User,
}

/// Holds the bot and optional user token for the lifetime of the gateway.
#[derive(Debug, Clone)]
pub struct CredentialSelector {
    bot: Credential,
    user: Option<Credential>,
}

impl CredentialSelector {
    /// Create a selector. A blank bot token is a configuration error.
    pub fn new(bot: Credential, user: Option<Credential>) -> Result<Self, ConfigError> {
        if bot.expose().trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("SLACK_BOT_TOKEN".to_string()));
        }

        Ok(Self {
            bot,
            user: user.filter(|token| !token.expose().trim().is_empty()),
        })
    }

    /// Create a selector from gateway configuration.
    pub fn from_config(config: &SlackConfig) -> Result<Self, ConfigError> {
        Self::new(config.bot_token.clone(), config.user_token.clone())
    }

    /// Pick the credential for a call.
    pub fn select(&self, kind: TokenKind) -> Result<&Credential, Failure> {
        match kind {
            TokenKind::Bot => Ok(&self.bot),
            TokenKind::User => self
                .user
                .as_ref()
                .ok_or_else(|| Failure::new(MISSING_USER_TOKEN)),
        }
    }

    /// Whether a user token is configured.
    pub fn has_user_token(&self) -> bool {
        self.user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_bot() {
        let selector = CredentialSelector::new(Credential::new("xoxb-1"), None).unwrap();
        assert_eq!(selector.select(TokenKind::Bot).unwrap().expose(), "xoxb-1");
    }

    #[test]
    fn test_select_user_when_configured() {
        let selector = CredentialSelector::new(
            Credential::new("xoxb-1"),
            Some(Credential::new("xoxp-2")),
        )
        .unwrap();
        assert_eq!(selector.select(TokenKind::User).unwrap().expose(), "xoxp-2");
        assert_eq!(selector.select(TokenKind::Bot).unwrap().expose(), "xoxb-1");
    }

    #[test]
    fn test_select_user_missing() {
        let selector = CredentialSelector::new(Credential::new("xoxb-1"), None).unwrap();
        let failure = selector.select(TokenKind::User).unwrap_err();
        assert_eq!(failure.error, MISSING_USER_TOKEN);
        assert!(!selector.has_user_token());
    }

    #[test]
    fn test_blank_bot_token_rejected() {
        assert!(CredentialSelector::new(Credential::new("  "), None).is_err());
    }

    #[test]
    fn test_blank_user_token_ignored() {
        let selector =
            CredentialSelector::new(Credential::new("xoxb-1"), Some(Credential::new(""))).unwrap();
        assert!(!selector.has_user_token());
    }

    #[test]
    fn test_debug_redacts() {
        assert_eq!(format!("{:?}", Credential::new("xoxb-1")), "Credential(***)");
    }
}
