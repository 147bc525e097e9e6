//! Message payloads relayed by the room.
//!
//! A `Message` is an opaque, immutable byte payload. The room never looks
//! inside it beyond rendering a lossy preview for trace output; every member
//! receives the exact bytes that were submitted.

use std::borrow::Cow;

use bytes::Bytes;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message(Bytes);

impl Message {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self(payload.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Payload as text, with invalid UTF-8 sequences replaced.
    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<Bytes> for Message {
    fn from(payload: Bytes) -> Self {
        Self(payload)
    }
}

impl From<Vec<u8>> for Message {
    fn from(payload: Vec<u8>) -> Self {
        Self(Bytes::from(payload))
    }
}

impl From<String> for Message {
    fn from(payload: String) -> Self {
        Self(Bytes::from(payload))
    }
}

impl From<&'static str> for Message {
    fn from(payload: &'static str) -> Self {
        Self(Bytes::from_static(payload.as_bytes()))
    }
}
