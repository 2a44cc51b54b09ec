//! Subscriber setup for the `serial-line` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the application.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG`, when set, takes precedence over `config.level`. Logs go to
/// stderr so stdout stays free for received data. Calling this twice keeps the
/// first subscriber and returns an error.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = filter_for(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
}

fn filter_for(config: &LoggingConfig) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.level),
    }
}
