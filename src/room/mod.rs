//! The `room` module is the broadcast domain: the membership authority and
//! the fan-out of every submitted message to every current member.

pub mod hub;
pub mod message;

pub use hub::{ClientId, Member, Room, RoomHandle};
pub use message::Message;

#[cfg(test)]
mod tests;
