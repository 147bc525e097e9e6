use tracing_subscriber::EnvFilter;

/// Install the process-wide `tracing` subscriber.
///
/// `RUST_LOG` wins when it is set and valid; otherwise `default_level` is
/// used, and an unrecognised level name means `info`.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(normalize_level(default_level)));

    // try_init: tests and embedders may install a subscriber first
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub(crate) fn normalize_level(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "error" => "error",
        "warn" | "warning" => "warn",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    }
}
