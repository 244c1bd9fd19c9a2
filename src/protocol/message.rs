//! Command request and reply message types.
//!
//! Defines the JSON message format for commands sent to the browser and the
//! replies (or events) it sends back.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// CommandId
// ============================================================================

/// Numeric command identifier used for request/reply correlation.
///
/// Ids are allocated from a per-connection monotonic counter and are never
/// reused within a connection's lifetime, so a stale reply can never match
/// a newer command.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CommandId(u64);

impl CommandId {
    /// Creates a command id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// CommandRequest
// ============================================================================

/// A command sent from this client to the browser.
///
/// # Format
///
/// ```json
/// {
///   "id": 1,
///   "method": "Page.navigate",
///   "params": { "url": "https://example.com" }
/// }
/// ```
///
/// Serialized as a single newline-free JSON object per WebSocket text frame.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRequest {
    /// Correlation id, unique within the connection.
    pub id: CommandId,

    /// Method in `Domain.action` form.
    pub method: String,

    /// Method parameters; `{}` when the method takes none.
    pub params: Value,
}

impl CommandRequest {
    /// Creates a new command request.
    ///
    /// A `Null` params value is normalized to an empty object so the wire
    /// format always carries a `params` field.
    #[must_use]
    pub fn new(id: CommandId, method: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other,
        };

        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// CommandReply
// ============================================================================

/// Any message received from the browser.
///
/// A reply carries an `id` matching an earlier command plus either `result`
/// or `error`. An event carries `method`/`params` and no `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandReply {
    /// Matches the command id; absent for event notifications.
    #[serde(default)]
    pub id: Option<CommandId>,

    /// Success payload (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error descriptor (if failure).
    #[serde(default)]
    pub error: Option<ReplyError>,

    /// Event method (events only).
    #[serde(default)]
    pub method: Option<String>,

    /// Event parameters (events only).
    #[serde(default)]
    pub params: Option<Value>,
}

impl CommandReply {
    /// Returns `true` if this message is an event notification.
    #[inline]
    #[must_use]
    pub fn is_event(&self) -> bool {
        self.id.is_none() && self.method.is_some()
    }

    /// Extracts the success payload, mapping an error field to
    /// [`Error::Protocol`].
    ///
    /// A success reply with no `result` yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the reply carries an error field.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(err) => Err(Error::protocol(err.message)),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// ReplyError
// ============================================================================

/// Error descriptor carried in a failed reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyError {
    /// Human-readable error message.
    #[serde(default)]
    pub message: String,

    /// Numeric protocol error code, when present.
    #[serde(default)]
    pub code: Option<i64>,
}

// ============================================================================
// Tests
// ============================================================================
