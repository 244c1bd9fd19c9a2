//! Error types for the CDP client.
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use chrome_cdp::{Page, Result};
//!
//! async fn example(page: &Page) -> Result<()> {
//!     let snapshot = page.navigate("https://example.com").await?;
//!     println!("{}", snapshot.title);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Discovery | [`Error::NoPageTarget`], [`Error::MalformedResponse`] |
//! | Connection | [`Error::Connection`], [`Error::NotConnected`], [`Error::ConnectionClosed`] |
//! | Dispatch | [`Error::Protocol`], [`Error::RequestTimeout`] |
//! | Operations | [`Error::Navigation`], [`Error::Evaluation`] |
//! | Launcher | [`Error::Launch`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Http`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::protocol::CommandId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Discovery Errors
    // ========================================================================
    /// No page-typed target in the discovery response.
    ///
    /// Returned when the debug endpoint answered but listed no usable page.
    #[error("No page target found - browser may not have started")]
    NoPageTarget,

    /// Discovery endpoint returned unparseable data.
    ///
    /// Returned when the body is not a JSON target list, meaning the host
    /// does not speak the discovery protocol at all.
    #[error("Malformed discovery response: {message}")]
    MalformedResponse {
        /// Description of the parse failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport-level failure on an established WebSocket connection.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Dispatch attempted on a connection that is not open.
    ///
    /// Once a connection reaches `Closed` it never reopens; create a new
    /// connection to reconnect.
    #[error("CDP WebSocket not connected")]
    NotConnected,

    /// Connection lost while a command was in flight.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// The remote end returned an explicit error field.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Error message reported by the browser.
        message: String,
    },

    /// No reply arrived within the command timeout window.
    #[error("Command {id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// Id of the command that timed out.
        id: CommandId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Operation Errors
    // ========================================================================
    /// Navigation operation failed.
    #[error("Navigation failed: {message}")]
    Navigation {
        /// Description of the navigation failure.
        message: String,
    },

    /// Content-extraction or script-evaluation operation failed.
    #[error("Evaluation failed: {message}")]
    Evaluation {
        /// Description of the evaluation failure.
        message: String,
    },

    // ========================================================================
    // Launcher Errors
    // ========================================================================
    /// Failed to launch the Chrome process.
    #[error("Failed to launch Chrome: {message}")]
    Launch {
        /// Description of the launch failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP error from the discovery request.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a malformed-response error.
    #[inline]
    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(id: CommandId, timeout_ms: u64) -> Self {
        Self::RequestTimeout { id, timeout_ms }
    }

    /// Creates a navigation error.
    #[inline]
    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation {
            message: message.into(),
        }
    }

    /// Creates an evaluation error.
    #[inline]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Creates a launch error.
    #[inline]
    pub fn launch(err: IoError) -> Self {
        Self::Launch {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::NotConnected
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a discovery error.
    #[inline]
    #[must_use]
    pub fn is_discovery_error(&self) -> bool {
        matches!(self, Self::NoPageTarget | Self::MalformedResponse { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");

        let err = Error::protocol("Cannot navigate to invalid URL");
        assert_eq!(
            err.to_string(),
            "Protocol error: Cannot navigate to invalid URL"
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::request_timeout(CommandId::new(7), 15_000);
        assert_eq!(err.to_string(), "Command 7 timed out after 15000ms");
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::request_timeout(CommandId::new(1), 15_000);
        let other_err = Error::connection("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::NoPageTarget.is_connection_error());
    }

    #[test]
    fn test_is_discovery_error() {
        assert!(Error::NoPageTarget.is_discovery_error());
        assert!(Error::malformed_response("not json").is_discovery_error());
        assert!(!Error::NotConnected.is_discovery_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
