//! # chatroom
//!
//! `chatroom` is a single-room, real-time broadcast server built with Rust.
//! Clients connect over WebSockets, and every message any client sends is
//! relayed to every client currently in the room.
//!
//! ## Core Modules
//!
//! - `room`: the membership authority. One task owns the set of connected
//!   clients and fans each message out without ever waiting on a client;
//!   a client whose queue is full is evicted.
//! - `client`: one connected participant and its two pumps (connection to
//!   room, room to connection).
//! - `transport`: the connection abstraction and the WebSocket server.
//! - `trace`: sinks for the room's activity trace.
//! - `config`: loading server configuration from files and environment.
//! - `utils`: error types and logging setup.

pub mod client;
pub mod config;
pub mod room;
pub mod trace;
pub mod transport;
pub mod utils;
