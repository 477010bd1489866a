//! Messages shown to the user by a workflow.

use std::time::{Duration, Instant};

/// A message with an optional expiry.
///
/// Validation messages expire on their own; request failures stay until the user retries or
/// leaves the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    text: String,
    expires_at: Option<Instant>,
}

impl Notice {
    pub fn transient(text: impl Into<String>, now: Instant, ttl: Duration) -> Self {
        Self {
            text: text.into(),
            expires_at: Some(now + ttl),
        }
    }

    pub fn persistent(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            expires_at: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

/// The visible text of `notice` at `now`, if any.
pub(crate) fn visible(notice: Option<&Notice>, now: Instant) -> Option<&str> {
    notice.filter(|n| n.is_visible(now)).map(Notice::text)
}
