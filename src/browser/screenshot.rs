//! Screenshot capture.
//!
//! # Limitation
//!
//! This is not a complete capability: the capture command is dispatched and
//! then a client-side handle (`window.lastScreenshot`) is probed, returning
//! whatever the probe yields. Pages that never populate that handle yield
//! `Null`; no image data is fabricated.

use serde_json::{json, Value};
use tracing::debug;

use crate::error::Result;

use super::page::{unwrap_value_envelope, Page};

// ============================================================================
// ImageFormat
// ============================================================================

/// Image format for screenshot capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy, smaller).
    Jpeg,
}

impl ImageFormat {
    /// Returns the format string used on the wire.
    #[inline]
    #[must_use]
    pub fn as_protocol(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }
}

// ============================================================================
// Page - Screenshot
// ============================================================================

impl Page {
    /// Captures a screenshot and probes for the client-side handle.
    ///
    /// Returns whatever the probe yields, which may be `Null` (see module
    /// docs for the limitation).
    ///
    /// # Errors
    ///
    /// Propagates dispatch failures from either command.
    pub async fn screenshot(&self, format: ImageFormat) -> Result<Value> {
        self.connection
            .dispatch(
                "Page.captureScreenshot",
                json!({"format": format.as_protocol()}),
            )
            .await?;

        let payload = self
            .connection
            .dispatch(
                "Runtime.evaluate",
                json!({
                    "expression": "window.lastScreenshot",
                    "returnByValue": true,
                }),
            )
            .await?;

        let handle = unwrap_value_envelope(&payload);
        debug!(empty = handle.is_null(), "Screenshot probe completed");
        Ok(handle)
    }
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

    #[test]
    fn test_format_protocol_names() {
        assert_eq!(ImageFormat::Png.as_protocol(), "png");
        assert_eq!(ImageFormat::Jpeg.as_protocol(), "jpeg");
        assert_eq!(ImageFormat::default(), ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_screenshot_probe_yields_value() {
        let url = spawn_cdp_server(|message: Value| {
            let id = message["id"].clone();
            if message["method"] == "Runtime.evaluate" {
                vec![json!({"id": id, "result": {"result": {"type": "string", "value": "data:image/png;base64,AAAA"}}})
                    .to_string()]
            } else {
                respond_success(message)
            }
        })
        .await;

        let connection = Connection::connect(&url).await.expect("connect");
        let page = Page::new(connection).with_settle_delay(Duration::ZERO);

        let handle = page.screenshot(ImageFormat::Png).await.expect("screenshot");
        assert_eq!(handle, json!("data:image/png;base64,AAAA"));
    }

    #[tokio::test]
    async fn test_screenshot_probe_may_be_null() {
        // Nothing ever populates window.lastScreenshot.
        let url = spawn_cdp_server(respond_success).await;

        let connection = Connection::connect(&url).await.expect("connect");
        let page = Page::new(connection).with_settle_delay(Duration::ZERO);

        let handle = page.screenshot(ImageFormat::Png).await.expect("screenshot");
        assert!(handle.is_null());
    }
}
