//! CDP wire message types.
//!
//! This module defines the message format exchanged with the browser over
//! the DevTools WebSocket.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Shape |
//! |---------|-----------|-------|
//! | Command | Local → Browser | `{"id": n, "method": "Domain.action", "params": {...}}` |
//! | Reply | Browser → Local | `{"id": n, "result": {...}}` or `{"id": n, "error": {"message": "..."}}` |
//! | Event | Browser → Local | `{"method": "Domain.event", "params": {...}}` (no id) |
//!
//! Commands and replies are correlated by the numeric `id`; messages without
//! an `id` are event notifications, which this client ignores.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Command request and reply types |
//! | `target` | Target descriptors from the discovery endpoint |

// ============================================================================
// Submodules
// ============================================================================

/// Command request and reply message types.
pub mod message;

/// Debuggable target descriptors.
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::{CommandId, CommandReply, CommandRequest, ReplyError};
pub use target::TargetInfo;
