//! The `transport` module is responsible for network communication with
//! clients over WebSockets.
//!
//! It provides the connection pump abstraction the client pumps are written
//! against, and the WebSocket server that accepts connections, upgrades them
//! and hands one `Client` per connection to the room.

pub mod connection;
pub mod websocket;

pub use connection::{MessageReader, MessageWriter};
pub use websocket::{serve, start_websocket_server};
