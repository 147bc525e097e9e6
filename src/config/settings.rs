use serde::Deserialize;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub room: RoomSettings,
}

/// Where the server listens and which request path upgrades into the room.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub path: String,
}

/// Buffering and tracing for the room and its clients.
///
/// `message_buffer_size` is the per-client outbound queue capacity: a client
/// that falls this many messages behind is evicted.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RoomSettings {
    pub message_buffer_size: usize,
    pub socket_buffer_size: usize,
    pub trace: TraceTarget,
}

/// Destination of room trace events.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TraceTarget {
    Log,
    Stdout,
    Off,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub room: Option<PartialRoomSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialRoomSettings {
    pub message_buffer_size: Option<usize>,
    pub socket_buffer_size: Option<usize>,
    pub trace: Option<TraceTarget>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                path: "/room".to_string(),
            },
            room: RoomSettings {
                message_buffer_size: 256,
                socket_buffer_size: 1024,
                trace: TraceTarget::Log,
            },
        }
    }
}

impl Settings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Merge a partial configuration over the defaults.
    pub fn merge(partial: PartialSettings) -> Self {
        let default = Settings::default();
        let server = partial.server;
        let room = partial.room;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
                path: server
                    .as_ref()
                    .and_then(|s| s.path.clone())
                    .unwrap_or(default.server.path),
            },
            room: RoomSettings {
                message_buffer_size: room
                    .as_ref()
                    .and_then(|r| r.message_buffer_size)
                    .unwrap_or(default.room.message_buffer_size),
                socket_buffer_size: room
                    .as_ref()
                    .and_then(|r| r.socket_buffer_size)
                    .unwrap_or(default.room.socket_buffer_size),
                trace: room
                    .as_ref()
                    .and_then(|r| r.trace)
                    .unwrap_or(default.room.trace),
            },
        }
    }
}
