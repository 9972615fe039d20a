//! Subscriber setup for hosts that do not install their own.

use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Output layout of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Install a global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is DEBUG or INFO per `debug`.
/// Returns `false` when a subscriber was already installed.
pub fn init(debug: bool) -> bool {
    init_with_format(debug, LogFormat::Compact)
}

pub fn init_with_format(debug: bool, format: LogFormat) -> bool {
    let default_level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    match format {
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
