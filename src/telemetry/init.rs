// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry initialization and configuration.

use std::io::{self, IsTerminal};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Configuration for telemetry initialization.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Default log level if RUST_LOG is not set.
    pub default_level: Level,

    /// Whether to include span events (enter/exit).
    pub include_span_events: bool,

    /// Whether to include file/line information.
    pub include_file_line: bool,

    /// Whether to include target module path.
    pub include_target: bool,

    /// Whether to use ANSI colors in output.
    pub ansi_colors: bool,

    /// Whether to use compact log format.
    pub compact: bool,

    /// Custom filter directive (overrides default_level).
    pub filter_directive: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            include_span_events: false,
            include_file_line: false,
            include_target: true,
            ansi_colors: true,
            compact: true,
            filter_directive: None,
        }
    }
}

impl TelemetryConfig {
    /// Create a config suitable for development with verbose output.
    pub fn development() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_span_events: true,
            include_file_line: true,
            include_target: true,
            ansi_colors: true,
            compact: false,
            filter_directive: None,
        }
    }

    /// Create a config suitable for production with minimal output.
    pub fn production() -> Self {
        Self {
            default_level: Level::WARN,
            include_span_events: false,
            include_file_line: false,
            include_target: false,
            ansi_colors: false,
            compact: true,
            filter_directive: None,
        }
    }

    /// Create a config for testing with trace-level output.
    pub fn testing() -> Self {
        Self {
            default_level: Level::TRACE,
            include_span_events: true,
            include_file_line: true,
            include_target: true,
            ansi_colors: false,
            compact: false,
            filter_directive: Some("hindsight=trace".to_string()),
        }
    }

    /// Set the default log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set a custom filter directive.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_directive = Some(filter.into());
        self
    }

    /// Enable or disable ANSI colors.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi_colors = ansi;
        self
    }

    /// Build a config from CLI verbosity flags and the configured log level.
    ///
    /// `--trace` beats `--debug`, which beats `log_level` from config files.
    pub fn from_flags(debug: bool, trace: bool, log_level: Option<&str>) -> Self {
        if trace {
            return Self::development().with_level(Level::TRACE);
        }
        if debug {
            return Self::development();
        }
        let level = log_level
            .and_then(|l| l.parse::<Level>().ok())
            .unwrap_or(Level::WARN);
        Self::default().with_level(level)
    }
}

/// Guard that flushes telemetry on drop.
///
/// Keep this guard alive for the duration of your program.
pub struct TelemetryGuard {
    _private: (),
}

impl TelemetryGuard {
    /// Report collected metrics at debug level.
    pub fn report(&self) {
        tracing::debug!(target: "hindsight::metrics", "{}", super::GLOBAL_METRICS.snapshot().format_report());
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        self.report();
    }
}

/// An explicit directive wins, then `RUST_LOG`, then the configured level
/// for this crate with dependencies held at `warn`.
fn build_filter(config: &TelemetryConfig) -> EnvFilter {
    let fallback = || EnvFilter::new(format!("warn,hindsight={}", config.default_level));
    match &config.filter_directive {
        Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| fallback()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
    }
}

/// Initialize telemetry with the given configuration.
///
/// This should be called once at application startup.
///
/// # Example
///
/// ```rust,ignore
/// use hindsight::telemetry::{init_telemetry, TelemetryConfig};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let _guard = init_telemetry(&TelemetryConfig::default())?;
///
///     // Your application code here
///
///     Ok(())
/// }
/// ```
pub fn init_telemetry(config: &TelemetryConfig) -> io::Result<TelemetryGuard> {
    let span_events = if config.include_span_events {
        FmtSpan::ENTER | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    // stdout carries command output (including JSON), so logs go to stderr.
    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.ansi_colors && io::stderr().is_terminal())
        .with_target(config.include_target)
        .with_file(config.include_file_line)
        .with_line_number(config.include_file_line)
        .with_span_events(span_events);

    let registry = tracing_subscriber::registry().with(build_filter(config));
    let installed = if config.compact {
        registry.with(fmt_layer.compact()).try_init()
    } else {
        registry.with(fmt_layer).try_init()
    };
    installed.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    Ok(TelemetryGuard { _private: () })
}
