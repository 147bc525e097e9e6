//! Error types used across `chatroom`.
//!
//! None of these ever crosses a client boundary: a failing connection ends
//! that one client, and the room itself has no failure mode.

use thiserror::Error;

/// Failure of a single connection. Always terminal for that connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection closed")]
    Closed,
    #[error("websocket transport error: {0}")]
    Transport(#[from] tungstenite::Error),
}

/// The room's loop has stopped and no longer accepts requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("room is no longer running")]
pub struct RoomClosed;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
