//! The slice of a fetched status the engine's collaborators share.
//!
//! The local store persists these, the conversation builder walks their
//! reply references, and the view renders their text. Anything else the
//! server sends (media, polls, emoji) stays in the host's raw payload and
//! never enters the engine.

use chrono::{DateTime, Utc};

use crate::model::id::StatusId;

/// One fetched status, as shared across the fetch/store/render boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub id: StatusId,
    pub created_at: DateTime<Utc>,
    /// Reply reference; `None` for top-level statuses.
    pub in_reply_to: Option<StatusId>,
    pub replies_count: u32,
    /// Author handle (`user@server`).
    pub account: String,
    /// Plain-text rendering of the status body.
    pub content: String,
    /// Whether the body sits behind a content warning.
    pub sensitive: bool,
    /// The content-warning text, empty when not sensitive.
    pub spoiler_text: String,
}

impl Status {
    /// Minimal constructor used by tests and fixtures.
    #[must_use]
    pub fn stub(id: impl Into<StatusId>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            in_reply_to: None,
            replies_count: 0,
            account: String::new(),
            content: String::new(),
            sensitive: false,
            spoiler_text: String::new(),
        }
    }

    /// Builder-style reply reference, for tests and fixtures.
    #[must_use]
    pub fn replying_to(mut self, parent: impl Into<StatusId>) -> Self {
        self.in_reply_to = Some(parent.into());
        self
    }
}
