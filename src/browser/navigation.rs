//! Page navigation.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::page::{Page, PageSnapshot};

// ============================================================================
// Page - Navigation
// ============================================================================

impl Page {
    /// Navigates to a URL and extracts the resulting page content.
    ///
    /// Sequence: ensure the page domain is enabled, dispatch the navigate
    /// command, wait the settle delay, then extract a snapshot. The settle
    /// delay approximates "the page has loaded"; there is no wait on an
    /// actual load-complete signal.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to navigate to
    ///
    /// # Errors
    ///
    /// Returns [`Error::Navigation`] if the navigate reply carries an error
    /// indicator or any underlying dispatch fails.
    pub async fn navigate(&self, url: &str) -> Result<PageSnapshot> {
        debug!(url = %url, "Navigating");

        // Idempotent on the browser side; cheap to repeat.
        self.connection
            .dispatch("Page.enable", json!({}))
            .await
            .map_err(|e| Error::navigation(e.to_string()))?;

        let payload = self
            .connection
            .dispatch("Page.navigate", json!({"url": url}))
            .await
            .map_err(|e| Error::navigation(e.to_string()))?;

        if let Some(error_text) = navigation_error(&payload) {
            return Err(Error::navigation(format!("{url}: {error_text}")));
        }

        tokio::time::sleep(self.settle_delay).await;

        let snapshot = self
            .extract_snapshot()
            .await
            .map_err(|e| Error::navigation(e.to_string()))?;

        info!(url = %snapshot.url, title = %snapshot.title, "Navigation complete");
        Ok(snapshot)
    }
}

/// Returns the error indicator from a navigate reply, if present.
fn navigation_error(payload: &Value) -> Option<&str> {
    payload
        .get("errorText")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::testkit::{respond_success, spawn_cdp_server};
    use crate::transport::Connection;

    async fn page_at(url: &str) -> Page {
        let connection = Connection::connect(url).await.expect("connect");
        Page::new(connection).with_settle_delay(Duration::ZERO)
    }

    fn scripted_browser(message: Value) -> Vec<String> {
        let id = message["id"].clone();
        match message["method"].as_str() {
            Some("Page.navigate") => {
                vec![json!({"id": id, "result": {"frameId": "F1"}}).to_string()]
            }
            Some("Runtime.evaluate") => vec![json!({
                "id": id,
                "result": {"result": {"type": "object", "value": {
                    "title": "Example Domain", "url": "https://example.com/",
                    "html": "<html></html>", "text": "Example Domain"
                }}}
            })
            .to_string()],
            _ => respond_success(message),
        }
    }

    #[tokio::test]
    async fn test_navigate_returns_snapshot() {
        let url = spawn_cdp_server(scripted_browser).await;
        let page = page_at(&url).await;

        let snapshot = page.navigate("https://example.com").await.expect("navigate");
        assert_eq!(snapshot.title, "Example Domain");
        assert_eq!(snapshot.url, "https://example.com/");
    }

    #[tokio::test]
    async fn test_navigate_error_text_fails() {
        let url = spawn_cdp_server(|message: Value| {
            let id = message["id"].clone();
            if message["method"] == "Page.navigate" {
                vec![json!({"id": id, "result": {"errorText": "net::ERR_NAME_NOT_RESOLVED"}})
                    .to_string()]
            } else {
                respond_success(message)
            }
        })
        .await;

        let page = page_at(&url).await;
        let err = page.navigate("https://no.such.host").await.expect_err("must fail");

        assert!(
            matches!(err, Error::Navigation { ref message } if message.contains("ERR_NAME_NOT_RESOLVED"))
        );
    }

    #[tokio::test]
    async fn test_navigate_then_immediate_content_has_all_fields() {
        // Extraction right after navigate, before any real settling, must
        // still yield a full (possibly empty) snapshot.
        let url = spawn_cdp_server(|message: Value| {
            let id = message["id"].clone();
            if message["method"] == "Runtime.evaluate" {
                // Page not ready: evaluate yields nothing useful.
                vec![json!({"id": id, "result": {"result": {"type": "undefined"}}}).to_string()]
            } else {
                respond_success(message)
            }
        })
        .await;

        let page = page_at(&url).await;
        let first = page.navigate("https://example.com").await.expect("navigate");
        let second = page.content().await.expect("content");

        for snapshot in [first, second] {
            assert_eq!(snapshot.title, "");
            assert_eq!(snapshot.url, "");
            assert_eq!(snapshot.html, "");
            assert_eq!(snapshot.text, "");
        }
    }

    #[test]
    fn test_navigation_error_helper() {
        assert_eq!(navigation_error(&json!({})), None);
        assert_eq!(navigation_error(&json!({"errorText": ""})), None);
        assert_eq!(
            navigation_error(&json!({"errorText": "net::ERR_ABORTED"})),
            Some("net::ERR_ABORTED")
        );
    }
}
