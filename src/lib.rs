//! Direct Chrome control over the DevTools Protocol.
//!
//! This library drives a Chrome instance started with remote debugging: it
//! finds the live page target over the HTTP discovery endpoint, attaches to
//! its DevTools WebSocket, and issues id-correlated commands with a fixed
//! per-command timeout.
//!
//! # Architecture
//!
//! - **Discovery**: `GET http://host:port/json`, pick the first page target
//! - **Connection**: one WebSocket per session, owned by the caller; an
//!   internal event loop task correlates replies to commands by id
//! - **Operations**: navigate-and-extract, content extraction, and
//!   screenshot capture built on the raw dispatch primitive
//!
//! Sessions are plain values: nothing in the crate is a process-wide
//! singleton, so multiple connections can coexist, each with its own id
//! counter and in-flight map.
//!
//! # Quick Start
//!
//! ```no_run
//! use chrome_cdp::{Page, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Attach to a Chrome started with --remote-debugging-port=18800
//!     let page = Page::attach("127.0.0.1", 18800).await?;
//!
//!     let snapshot = page.navigate("https://example.com").await?;
//!     println!("{}: {}", snapshot.title, snapshot.text);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | High-level operations: [`Page`], [`PageSnapshot`] |
//! | [`cache`] | TTL-expiring search-result cache (external collaborator) |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`launcher`] | Chrome process spawning (external collaborator) |
//! | [`protocol`] | Wire message types |
//! | [`transport`] | Discovery and WebSocket connection |

// ============================================================================
// Modules
// ============================================================================

/// High-level browser operations.
pub mod browser;

/// TTL-expiring search-result cache.
pub mod cache;

/// Error types and result aliases.
pub mod error;

/// Chrome process launcher.
pub mod launcher;

/// CDP wire message types.
pub mod protocol;

/// Discovery and WebSocket transport.
pub mod transport;

#[cfg(test)]
pub(crate) mod testkit;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{ImageFormat, Page, PageSnapshot};

// Cache types
pub use cache::{CacheStats, SearchCache, SearchParams};

// Error types
pub use error::{Error, Result};

// Launcher types
pub use launcher::{launch, LaunchOptions, LaunchedBrowser};

// Protocol types
pub use protocol::{CommandId, TargetInfo};

// Transport types
pub use transport::{discover_target, Connection, ConnectionState};
