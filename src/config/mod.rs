mod settings;

use config::{Config, ConfigError, Environment, File};

use crate::config::settings::PartialSettings;

pub use settings::{RoomSettings, ServerSettings, Settings, TraceTarget};

/// Prefix of environment overrides, e.g. `CHATROOM__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "CHATROOM";

/// Loads the configuration from `config/default.*` and `CHATROOM__*`
/// environment variables, merged over the defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;
    let settings = Settings::merge(partial);
    validate(&settings)?;
    Ok(settings)
}

/// Rejects settings the server cannot run with.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.room.message_buffer_size == 0 {
        return Err(ConfigError::Message(
            "room.message_buffer_size must be at least 1".to_string(),
        ));
    }
    if settings.room.socket_buffer_size == 0 {
        return Err(ConfigError::Message(
            "room.socket_buffer_size must be at least 1".to_string(),
        ));
    }
    if !settings.server.path.starts_with('/') {
        return Err(ConfigError::Message(format!(
            "server.path must start with '/', got '{}'",
            settings.server.path
        )));
    }
    Ok(())
}
