//! The `client` module defines one connected participant.
//!
//! A `Client` owns the receiving half of its bounded outbound queue and runs
//! the two pumps that move messages between its connection and the room.

pub mod chat_client;
pub use chat_client::Client;
