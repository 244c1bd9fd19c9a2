//! High-level browser operations.
//!
//! This module provides the operations built on top of raw command
//! dispatch:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Page`] | Attached page: navigate, extract content, capture screenshot |
//! | [`PageSnapshot`] | Structured page state: title, url, html, text |
//! | [`ImageFormat`] | Screenshot image format |
//!
//! # Example
//!
//! ```no_run
//! use chrome_cdp::{Page, Result};
//!
//! # async fn example() -> Result<()> {
//! let page = Page::attach("127.0.0.1", 18800).await?;
//!
//! let snapshot = page.navigate("https://example.com").await?;
//! println!("{}: {}", snapshot.title, snapshot.url);
//!
//! let snapshot = page.content().await?;
//! println!("{}", snapshot.text);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod content;
mod navigation;
mod page;
mod screenshot;

// ============================================================================
// Re-exports
// ============================================================================

pub use page::{Page, PageSnapshot};
pub use screenshot::ImageFormat;
