//! CDP transport layer.
//!
//! This module handles locating the browser's debug endpoint and speaking
//! the DevTools Protocol over the persistent WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Client (Rust)  │   GET /json (discovery)      │  Chrome         │
//! │                 │─────────────────────────────►│                 │
//! │  discovery      │                              │  debug endpoint │
//! │  → Connection   │◄────────────────────────────►│  (WebSocket)    │
//! │                 │   commands / replies         │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `discover_target` - Query `http://host:port/json` for the page target
//! 2. `Connection::connect` - Open the WebSocket to the target's endpoint
//! 3. Enable commands are fired for the capability domains the client uses
//! 4. `Connection::dispatch` - Send commands, await correlated replies
//! 5. `Connection::close` - Terminal; a new connection is needed to reconnect
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection, event loop, command dispatch |
//! | `discovery` | HTTP target discovery |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and command dispatcher.
pub mod connection;

/// HTTP target discovery.
pub mod discovery;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ConnectionState};
pub use discovery::{discover_target, DEFAULT_DEBUG_HOST, DEFAULT_DEBUG_PORT};
