//! Logging setup for applications using Armature localization.
//!
//! The engine only emits `tracing` events: catalog merges at `debug`,
//! skipped catalogs at `warn`, missing translations at `trace`. This module
//! installs a subscriber for binaries that don't bring their own.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `RUST_LOG` | Full filter directives; wins over everything below |
//! | `ARMATURE_LOG_LEVEL` | `trace`, `debug`, `info`, `warn`, `error` or `off` |
//! | `ARMATURE_DEBUG` | `1`/`true` lowers the default level to `debug` |
//! | `ARMATURE_LOG_FORMAT` | `json`, `pretty`, `compact` or `plain` (default) |

use std::env;
use tracing::{info, warn};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human readable output
    #[default]
    Plain,
    /// Multi-line output for development
    Pretty,
    /// Abbreviated single-line output
    Compact,
    /// Structured JSON, one object per line
    Json,
}

impl LogFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "plain" | "text" => Some(LogFormat::Plain),
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Subscriber settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter directives passed to [`EnvFilter`]
    pub directives: String,
    pub format: LogFormat,
}

impl LogSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let debug = lookup("ARMATURE_DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let directives = lookup("RUST_LOG")
            .filter(|v| !v.trim().is_empty())
            .or_else(|| {
                lookup("ARMATURE_LOG_LEVEL")
                    .map(|v| v.trim().to_lowercase())
                    .filter(|v| is_level(v))
            })
            .unwrap_or_else(|| if debug { "debug" } else { "info" }.to_string());

        let format = lookup("ARMATURE_LOG_FORMAT")
            .and_then(|s| LogFormat::from_str(&s))
            .unwrap_or_default();

        Self { directives, format }
    }

    /// Install a global subscriber.
    ///
    /// Returns `false` if one was already installed, by this or any other
    /// call site.
    pub fn try_init(&self) -> bool {
        let (filter, rejected) = self.filter();
        let registry = tracing_subscriber::registry().with(filter);

        let result = match self.format {
            LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).try_init(),
            LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
            LogFormat::Plain => registry.with(fmt::layer().with_target(true)).try_init(),
        };
        if result.is_err() {
            return false;
        }

        if let Some(error) = rejected {
            warn!(directives = %self.directives, %error, "invalid log filter, using info");
        }
        info!(directives = %self.directives, format = ?self.format, "logging initialized");
        true
    }

    /// Build the filter, falling back to `info` when the directives don't
    /// parse. The parse error is returned alongside.
    fn filter(&self) -> (EnvFilter, Option<ParseError>) {
        match EnvFilter::try_new(&self.directives) {
            Ok(filter) => (filter, None),
            Err(error) => (EnvFilter::new("info"), Some(error)),
        }
    }
}

fn is_level(value: &str) -> bool {
    matches!(value, "trace" | "debug" | "info" | "warn" | "error" | "off")
}

/// Install a global subscriber configured from the environment.
///
/// Returns `true` if this call installed it; later calls are no-ops that
/// return `false`.
pub fn init_logging() -> bool {
    LogSettings::from_env().try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> LogSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LogSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_to_info_plain() {
        let s = settings(&[]);
        assert_eq!(s.directives, "info");
        assert_eq!(s.format, LogFormat::Plain);
    }

    #[test]
    fn test_debug_flag() {
        assert_eq!(settings(&[("ARMATURE_DEBUG", "1")]).directives, "debug");
        assert_eq!(settings(&[("ARMATURE_DEBUG", "TRUE")]).directives, "debug");
        assert_eq!(settings(&[("ARMATURE_DEBUG", "0")]).directives, "info");
    }

    #[test]
    fn test_precedence() {
        let s = settings(&[
            ("RUST_LOG", "armature_gettext=trace"),
            ("ARMATURE_LOG_LEVEL", "warn"),
            ("ARMATURE_DEBUG", "1"),
        ]);
        assert_eq!(s.directives, "armature_gettext=trace");

        let s = settings(&[("ARMATURE_LOG_LEVEL", "Warn"), ("ARMATURE_DEBUG", "1")]);
        assert_eq!(s.directives, "warn");

        let s = settings(&[("ARMATURE_LOG_LEVEL", "loud"), ("ARMATURE_DEBUG", "1")]);
        assert_eq!(s.directives, "debug");
    }

    #[test]
    fn test_format() {
        assert_eq!(settings(&[("ARMATURE_LOG_FORMAT", "json")]).format, LogFormat::Json);
        assert_eq!(settings(&[("ARMATURE_LOG_FORMAT", "Compact")]).format, LogFormat::Compact);
        assert_eq!(settings(&[("ARMATURE_LOG_FORMAT", "xml")]).format, LogFormat::Plain);
    }

    #[test]
    fn test_invalid_directives_fall_back_to_info() {
        let (_, rejected) = settings(&[("RUST_LOG", "armature_gettext=loud")]).filter();
        assert!(rejected.is_some());

        let (_, rejected) = settings(&[("RUST_LOG", "armature_gettext=trace")]).filter();
        assert!(rejected.is_none());
    }

    #[test]
    fn test_second_init_is_noop() {
        // the first call may lose to another test in this binary
        settings(&[]).try_init();
        assert!(!settings(&[]).try_init());
    }
}
