//! HTTP target discovery.
//!
//! Chrome started with `--remote-debugging-port` serves a JSON list of
//! debuggable targets at `http://host:port/json`. Discovery fetches that
//! list and picks the page target to attach to.
//!
//! Selection is first-match: the first entry whose type is `"page"` with a
//! non-empty debugger URL wins. When several pages exist the choice is
//! arbitrary; no tie-break rule is applied.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::TargetInfo;

// ============================================================================
// Constants
// ============================================================================

/// Host the debug endpoint binds to.
pub const DEFAULT_DEBUG_HOST: &str = "127.0.0.1";

/// Default remote debugging port.
pub const DEFAULT_DEBUG_PORT: u16 = 18800;

// ============================================================================
// Discovery
// ============================================================================

/// Finds the live page target via the discovery endpoint.
///
/// Issues a single `GET http://{host}:{port}/json` and returns the first
/// page-typed target from the response, unchanged.
///
/// # Errors
///
/// - [`Error::Http`] if the request itself fails (endpoint unreachable)
/// - [`Error::MalformedResponse`] if the body is not a JSON target list
/// - [`Error::NoPageTarget`] if the list contains no usable page entry
pub async fn discover_target(host: &str, port: u16) -> Result<TargetInfo> {
    let url = format!("http://{host}:{port}/json");
    debug!(url = %url, "Querying discovery endpoint");

    let body = reqwest::get(&url).await?.text().await?;
    let targets = parse_target_list(&body)?;

    let target = select_page_target(targets).ok_or(Error::NoPageTarget)?;
    debug!(
        title = %target.title,
        url = %target.url,
        endpoint = %target.web_socket_debugger_url,
        "Found page target"
    );

    Ok(target)
}

/// Parses the discovery body as a JSON array of target descriptors.
fn parse_target_list(body: &str) -> Result<Vec<TargetInfo>> {
    serde_json::from_str(body).map_err(|e| Error::malformed_response(e.to_string()))
}

/// Picks the first page-typed target with a debugger endpoint.
fn select_page_target(targets: Vec<TargetInfo>) -> Option<TargetInfo> {
    targets.into_iter().find(TargetInfo::is_page)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const PAGE_LIST: &str = r#"[
        {"id": "W1", "type": "service_worker", "url": "https://a/sw.js", "title": "",
         "webSocketDebuggerUrl": "ws://127.0.0.1:1/devtools/worker/W1"},
        {"id": "P1", "type": "page", "url": "https://example.com", "title": "Example",
         "webSocketDebuggerUrl": "ws://127.0.0.1:1/devtools/page/P1"},
        {"id": "P2", "type": "page", "url": "about:blank", "title": "",
         "webSocketDebuggerUrl": "ws://127.0.0.1:1/devtools/page/P2"}
    ]"#;

    #[test]
    fn test_parse_malformed_body() {
        let err = parse_target_list("<html>not json</html>").expect_err("must fail");
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn test_select_first_page_target() {
        let targets = parse_target_list(PAGE_LIST).expect("parse");
        let target = select_page_target(targets).expect("page target");

        // First page entry wins even though another page follows.
        assert_eq!(target.id, "P1");
        assert_eq!(target.title, "Example");
    }

    #[test]
    fn test_select_no_page_target() {
        let targets = parse_target_list(r#"[{"id": "W1", "type": "service_worker"}]"#)
            .expect("parse");
        assert_eq!(select_page_target(targets), None);
    }

    #[test]
    fn test_select_empty_list() {
        assert_eq!(select_page_target(Vec::new()), None);
    }

    /// Serves one canned HTTP response and closes.
    async fn spawn_http_once(body: &'static str) -> (String, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.expect("write");
        });

        ("127.0.0.1".to_string(), port)
    }

    #[tokio::test]
    async fn test_discover_target_over_http() {
        let (host, port) = spawn_http_once(PAGE_LIST).await;

        let target = discover_target(&host, port).await.expect("discover");
        assert_eq!(target.id, "P1");
        assert_eq!(target.url, "https://example.com");
    }

    #[tokio::test]
    async fn test_discover_no_page_over_http() {
        let (host, port) = spawn_http_once("[]").await;

        let err = discover_target(&host, port).await.expect_err("must fail");
        assert!(matches!(err, Error::NoPageTarget));
    }
}
