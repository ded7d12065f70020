//! Slack Web API methods used by the gateway, with their fixed HTTP verbs.

use super::dispatch::HttpMethod;

pub const CHAT_POST_MESSAGE: &str = "chat.postMessage";
pub const CONVERSATIONS_LIST: &str = "conversations.list";
pub const CONVERSATIONS_HISTORY: &str = "conversations.history";
pub const CONVERSATIONS_INFO: &str = "conversations.info";
pub const CONVERSATIONS_OPEN: &str = "conversations.open";
pub const CONVERSATIONS_INVITE: &str = "conversations.invite";
pub const USERS_LIST: &str = "users.list";
pub const USERS_INFO: &str = "users.info";
pub const REACTIONS_ADD: &str = "reactions.add";
pub const SEARCH_MESSAGES: &str = "search.messages";
pub const FILES_UPLOAD: &str = "files.upload";
pub const FILES_GET_UPLOAD_URL_EXTERNAL: &str = "files.getUploadURLExternal";
pub const FILES_COMPLETE_UPLOAD_EXTERNAL: &str = "files.completeUploadExternal";

/// `files.getUploadURLExternal` takes form or query arguments, not JSON.
pub const GET_UPLOAD_URL_METHOD: HttpMethod = HttpMethod::Get;

/// `files.completeUploadExternal` takes a JSON body (`files` is an array).
pub const COMPLETE_UPLOAD_METHOD: HttpMethod = HttpMethod::Post;
