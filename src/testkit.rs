//! In-process scripted WebSocket server for tests.
//!
//! Stands in for the browser side of the DevTools socket: each inbound
//! command is handed to a responder closure which returns the raw frames to
//! send back. Returning [`CLOSE_SENTINEL`] drops the socket, simulating an
//! unsolicited connection termination.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

/// Magic frame value that makes the server close the connection.
pub const CLOSE_SENTINEL: &str = "__close__";

/// Responder that acknowledges every command with an empty success reply.
pub fn respond_success(message: Value) -> Vec<String> {
    let id = message["id"].clone();
    vec![json!({"id": id, "result": {}}).to_string()]
}

/// Spawns a scripted server accepting a single WebSocket connection.
///
/// Returns the `ws://` URL to connect to. The server task ends when the
/// client disconnects or the responder asks for a close.
pub async fn spawn_cdp_server<F>(mut on_message: F) -> String
where
    F: FnMut(Value) -> Vec<String> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("ws://127.0.0.1:{}", listener.local_addr().expect("addr").port());

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("ws upgrade");

        while let Some(Ok(message)) = ws.next().await {
            let Message::Text(text) = message else {
                continue;
            };

            let inbound: Value = serde_json::from_str(&text).expect("client sends valid JSON");
            for frame in on_message(inbound) {
                if frame == CLOSE_SENTINEL {
                    let _ = ws.close(None).await;
                    return;
                }
                ws.send(Message::Text(frame.into())).await.expect("send");
            }
        }
    });

    url
}
