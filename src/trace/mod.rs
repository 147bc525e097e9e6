//! Event sinks for room activity.
//!
//! The room reports what it does through the [`Tracer`] trait: one method,
//! one pre-formatted line per event. Nothing in the room depends on what a
//! tracer does with the line.

use std::io::Write;
use std::sync::Mutex;

pub trait Tracer: Send + Sync {
    fn trace(&self, event: &str);
}

/// Forwards events to the process-wide `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn trace(&self, event: &str) {
        tracing::info!(target: "chatroom::room", "{event}");
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTracer;

impl Tracer for NullTracer {
    fn trace(&self, _event: &str) {}
}

/// Writes each event as its own line to an `io::Write`.
#[derive(Debug)]
pub struct WriterTracer<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> WriterTracer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Tracer for WriterTracer<W> {
    fn trace(&self, event: &str) {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // A sink that cannot be written to must not affect the room.
        let _ = writeln!(out, "{event}");
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryTracer {
    events: Mutex<Vec<String>>,
}

impl MemoryTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Number of recorded events that start with `prefix`.
    pub fn count_prefixed(&self, prefix: &str) -> usize {
        self.lock().iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Tracer for MemoryTracer {
    fn trace(&self, event: &str) {
        self.lock().push(event.to_string());
    }
}
