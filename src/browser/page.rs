//! Core Page struct and snapshot types.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::transport::{discover_target, Connection};

// ============================================================================
// Constants
// ============================================================================

/// Default settle delay after navigation before content is extracted.
///
/// A heuristic stand-in for "the page finished loading": the client never
/// waits on an actual load-complete signal, it just sleeps. Known
/// correctness gap; a slow page can still be mid-load when extraction runs.
pub(crate) const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Maximum HTML length carried in a snapshot.
pub(crate) const HTML_LIMIT: usize = 2000;

/// Maximum visible-text length carried in a snapshot.
pub(crate) const TEXT_LIMIT: usize = 1000;

// ============================================================================
// Page
// ============================================================================

/// A page attached over the DevTools Protocol.
///
/// Owns a [`Connection`] session; the caller creates and holds the page, so
/// several pages against different browsers can coexist. Operations are
/// terminal on failure and never retried here; callers needing retry must
/// re-invoke.
#[derive(Clone)]
pub struct Page {
    /// The underlying connection session.
    pub(crate) connection: Connection,
    /// Wait inserted between navigation and content extraction.
    pub(crate) settle_delay: Duration,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("state", &self.connection.state())
            .field("settle_delay", &self.settle_delay)
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Wraps an existing connection.
    #[inline]
    #[must_use]
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Discovers the live page target and attaches to it.
    ///
    /// # Errors
    ///
    /// Propagates discovery errors ([`crate::Error::NoPageTarget`],
    /// [`crate::Error::MalformedResponse`]) and connection errors.
    pub async fn attach(host: &str, port: u16) -> Result<Self> {
        let target = discover_target(host, port).await?;
        let connection = Connection::connect(&target.web_socket_debugger_url).await?;
        Ok(Self::new(connection))
    }

    /// Overrides the settle delay (default 3s).
    #[inline]
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Closes the underlying connection.
    pub fn close(&self) {
        self.connection.close();
    }
}

// ============================================================================
// PageSnapshot
// ============================================================================

/// Structured snapshot of the current page.
///
/// All four fields are always present; extraction is best-effort, so any of
/// them may be empty rather than the snapshot failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageSnapshot {
    /// Document title.
    pub title: String,
    /// Location href at extraction time.
    pub url: String,
    /// Document HTML, truncated to 2000 characters.
    pub html: String,
    /// Visible body text, truncated to 1000 characters.
    pub text: String,
}

impl PageSnapshot {
    /// Builds a snapshot from a `Runtime.evaluate` payload.
    ///
    /// The protocol nests the script's return value as
    /// `{"result": {"type": "object", "value": {...}}}`. Unwrapping is
    /// defensive: a missing envelope or value yields an all-empty snapshot,
    /// never an error.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        let value = unwrap_value_envelope(payload);

        Self {
            title: field(&value, "title", usize::MAX),
            url: field(&value, "url", usize::MAX),
            html: field(&value, "html", HTML_LIMIT),
            text: field(&value, "text", TEXT_LIMIT),
        }
    }
}

// ============================================================================
// Envelope Helpers
// ============================================================================

/// Unwraps the nested `result.value` envelope of an evaluate payload.
///
/// Falls back to the payload itself if the inner `result` is absent, and to
/// `Null` if there is no `value`.
pub(crate) fn unwrap_value_envelope(payload: &Value) -> Value {
    let data = payload.get("result").unwrap_or(payload);
    data.get("value").cloned().unwrap_or(Value::Null)
}

/// Extracts a string field, truncated to `limit` characters.
fn field(value: &Value, key: &str, limit: usize) -> String {
    let raw = value.get(key).and_then(Value::as_str).unwrap_or_default();
    if raw.chars().count() <= limit {
        raw.to_string()
    } else {
        raw.chars().take(limit).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
