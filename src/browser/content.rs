//! Page content extraction.

use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};

use super::page::{Page, PageSnapshot};

// ============================================================================
// Extraction Script
// ============================================================================

/// Script evaluated in the page to collect the snapshot fields.
///
/// Truncation happens page-side to keep the reply small; the snapshot
/// builder clamps again on this side. The catch arm still reports title and
/// url so a scripting failure degrades instead of losing everything.
const CONTENT_SCRIPT: &str = r#"(() => {
  try {
    return {
      title: document.title,
      url: window.location.href,
      html: document.documentElement ? document.documentElement.outerHTML.substring(0, 2000) : '',
      text: document.body ? document.body.innerText.substring(0, 1000) : ''
    };
  } catch (e) {
    return {
      title: document.title || '',
      url: window.location.href || '',
      html: '',
      text: 'Error: ' + e.message
    };
  }
})()"#;

// ============================================================================
// Page - Content Extraction
// ============================================================================

impl Page {
    /// Extracts a snapshot of the current page without navigating.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Evaluation`] if the dispatch itself fails; a page
    /// that yields no usable data still produces an (empty) snapshot.
    pub async fn content(&self) -> Result<PageSnapshot> {
        let snapshot = self
            .extract_snapshot()
            .await
            .map_err(|e| Error::evaluation(e.to_string()))?;

        debug!(title = %snapshot.title, "Content retrieved");
        Ok(snapshot)
    }

    /// Runs the extraction script and unwraps its reply defensively.
    pub(crate) async fn extract_snapshot(&self) -> Result<PageSnapshot> {
        let payload = self
            .connection
            .dispatch(
                "Runtime.evaluate",
                json!({
                    "expression": CONTENT_SCRIPT,
                    "returnByValue": true,
                }),
            )
            .await?;

        Ok(PageSnapshot::from_payload(&payload))
    }
}

// ============================================================================
// Tests
// ============================================================================
