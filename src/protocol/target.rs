//! Debuggable target descriptors.
//!
//! The browser's discovery endpoint (`GET /json`) returns an array of these
//! descriptors, one per debuggable surface (tab, service worker, ...).

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;

// ============================================================================
// TargetInfo
// ============================================================================

/// A debuggable target exposed by the remote debugging endpoint.
///
/// Immutable once read from the discovery response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Target identifier assigned by the browser.
    #[serde(default)]
    pub id: String,

    /// Target kind, e.g. `"page"` for a browser tab.
    #[serde(rename = "type", default)]
    pub target_type: String,

    /// URL currently loaded in the target.
    #[serde(default)]
    pub url: String,

    /// Target title (page title for tabs).
    #[serde(default)]
    pub title: String,

    /// WebSocket endpoint for attaching the debugger.
    #[serde(default)]
    pub web_socket_debugger_url: String,
}

impl TargetInfo {
    /// Returns `true` if this target is a debuggable page with an endpoint.
    #[inline]
    #[must_use]
    pub fn is_page(&self) -> bool {
        self.target_type == "page" && !self.web_socket_debugger_url.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
