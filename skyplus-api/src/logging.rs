//! Logging setup for applications built on this crate
//!
//! The library itself only emits `tracing` events. Binaries that want to see
//! them call one of the initialisers here once at startup.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// How log output should be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// Install nothing; events are dropped
    Silent,
    /// Compact stderr output at `info`
    Development,
    /// Pretty stderr output at `debug` with source locations
    Debug,
    /// One JSON object per line at `info`, for log shippers
    Json,
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },
}

/// Install a global subscriber for `mode`.
///
/// The filter is taken from `SKY_LOG_LEVEL`, then `RUST_LOG`, then the
/// mode's default level.
///
/// ```rust,ignore
/// skyplus_api::logging::init_logging(LoggingMode::Development)?;
/// ```
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => Registry::default()
            .with(fmt::layer().with_target(false).compact())
            .with(env_filter("info")?)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
        LoggingMode::Debug => Registry::default()
            .with(
                fmt::layer()
                    .pretty()
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(env_filter("debug")?)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
        LoggingMode::Json => Registry::default()
            .with(fmt::layer().json())
            .with(env_filter("info")?)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
    }
}

/// Initialise from `SKY_LOG_MODE` (`silent`, `development`, `debug`, `json`).
///
/// Anything else, or no variable at all, means [`LoggingMode::Silent`].
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_logging(mode_from_str(std::env::var("SKY_LOG_MODE").ok().as_deref()))
}

fn mode_from_str(value: Option<&str>) -> LoggingMode {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("development") | Some("dev") => LoggingMode::Development,
        Some("debug") => LoggingMode::Debug,
        Some("json") => LoggingMode::Json,
        _ => LoggingMode::Silent,
    }
}

fn env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let filter = std::env::var("SKY_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());

    EnvFilter::try_new(&filter).map_err(|e| LoggingError::InvalidFilter {
        filter,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_mode() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(mode_from_str(Some("debug")), LoggingMode::Debug);
        assert_eq!(mode_from_str(Some("JSON")), LoggingMode::Json);
        assert_eq!(mode_from_str(Some("dev")), LoggingMode::Development);
        assert_eq!(mode_from_str(Some("loud")), LoggingMode::Silent);
        assert_eq!(mode_from_str(None), LoggingMode::Silent);
    }
}
