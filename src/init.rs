// Logging/tracing setup

use sparkify2parquet_config::{LogConfig, LogFormat};

/// Install the global tracing subscriber from the log settings.
///
/// `log.level` accepts `RUST_LOG`-style directives; an unparseable value
/// falls back to `info` and is reported once the subscriber is up. Calling
/// this twice is harmless; the first subscriber stays installed.
pub fn init_tracing(config: &LogConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (env_filter, rejected) = match EnvFilter::try_new(&config.level) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new("info"), Some(e)),
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let _ = match config.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };

    if let Some(e) = rejected {
        tracing::warn!(
            level = %config.level,
            error = %e,
            "Invalid log.level, falling back to info"
        );
    }
}
