//! Process-wide log level for events emitted by this crate.
//!
//! Resolving a configuration stores its `logLevel` here. Every event the crate
//! emits checks this level first and is then handed to `tracing`, so the
//! application's subscriber still applies its own filtering on top.

use std::sync::atomic::{AtomicU8, Ordering};
use tracing::level_filters::LevelFilter;
use tracing::Level;

/// Log verbosity accepted by the `logLevel` option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debug output, including resolved configuration and retries.
    Debug,
    /// Informational events.
    Info,
    /// Warnings such as failed attempts. This is the default.
    #[default]
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Parse a level name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Parse a level name, falling back to [`LogLevel::Warn`].
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(Self::parse).unwrap_or_default()
    }

    /// Returns `true` if events at `level` pass this threshold.
    pub fn allows(self, level: Level) -> bool {
        LevelFilter::from(self) >= level
    }

    fn as_u8(self) -> u8 {
        match self {
            LogLevel::Trace => 0,
            LogLevel::Debug => 1,
            LogLevel::Info => 2,
            LogLevel::Warn => 3,
            LogLevel::Error => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            4 => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(name)
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(3);

/// Sets the process-wide level. Called by [`crate::config::resolve`].
pub fn set_log_level(level: LogLevel) {
    LEVEL.store(level.as_u8(), Ordering::Relaxed);
}

/// Returns the current process-wide level.
pub fn log_level() -> LogLevel {
    LogLevel::from_u8(LEVEL.load(Ordering::Relaxed))
}

/// Returns `true` if this crate should emit events at `level`.
pub fn enabled(level: Level) -> bool {
    log_level().allows(level)
}

pub fn is_debug_enabled() -> bool {
    enabled(Level::DEBUG)
}
