//! Slack Web API client layer.
//!
//! - `config`: gateway configuration loaded from the environment
//! - `credentials`: bot/user token selection
//! - `dispatch`: one authenticated call per dispatch, transport errors as data
//! - `endpoints`: Web API method names and their fixed HTTP verbs

pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod endpoints;

pub use config::{ConfigError, SlackConfig};
pub use credentials::{Credential, CredentialSelector, TokenKind};
pub use dispatch::{HttpMethod, SlackClient};
