//! Logging setup.
//!
//! `tracing` macros everywhere, one `tracing-subscriber` fmt layer at the
//! top.  `RUST_LOG` wins over the configured level.
//!
//! ```no_run
//! use kubepad::{config::KubepadConfig, logging};
//!
//! let config = KubepadConfig::load(None).unwrap();
//! logging::init_from_config(&config).unwrap();
//! tracing::info!("Application started");
//! ```

use std::fmt;
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as tfmt, EnvFilter, Layer, Registry};

use crate::config::KubepadConfig;
use crate::error::{Error, Result};

pub const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Multi-line, coloured.
    Pretty,
    /// One line per event, no colours.
    Compact,
    /// Newline-delimited JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty"  => Ok(OutputFormat::Pretty),
            "compact" => Ok(OutputFormat::Compact),
            "json"    => Ok(OutputFormat::Json),
            _ => Err(format!("invalid log format '{}'. Must be one of: pretty, compact, json", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Pretty  => "pretty",
            OutputFormat::Compact => "compact",
            OutputFormat::Json    => "json",
        })
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub level:              Level,
    pub format:             OutputFormat,
    /// Log span open and close.
    pub with_span_events:   bool,
    pub with_file_and_line: bool,
    pub with_thread_names:  bool,
    /// Colours, pretty format only.
    pub with_ansi:          bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        TracingConfig {
            level:              Level::INFO,
            format:             OutputFormat::Pretty,
            with_span_events:   false,
            with_file_and_line: false,
            with_thread_names:  true,
            with_ansi:          true,
        }
    }
}

impl TracingConfig {
    pub fn new(level: Level) -> Self {
        TracingConfig { level, ..Default::default() }
    }

    pub fn from_config(config: &KubepadConfig) -> Result<Self> {
        let level = parse_log_level(&config.logging.level).map_err(Error::Logging)?;
        let format = config.logging.format.parse().map_err(Error::Logging)?;
        Ok(TracingConfig { level, format, ..Default::default() })
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.with_ansi = enabled;
        self
    }
}

pub fn init_from_config(config: &KubepadConfig) -> Result<()> {
    init(TracingConfig::from_config(config)?)
}

/// Install the global subscriber.  Calling it again is a no-op.
pub fn init(config: TracingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_string(config.level)));

    let span_events = if config.with_span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        OutputFormat::Pretty => tfmt::layer()
            .pretty()
            .with_span_events(span_events)
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .with_thread_names(config.with_thread_names)
            .with_ansi(config.with_ansi)
            .boxed(),
        OutputFormat::Compact => tfmt::layer()
            .compact()
            .with_span_events(span_events)
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .with_thread_names(config.with_thread_names)
            .with_ansi(false)
            .boxed(),
        OutputFormat::Json => tfmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .with_thread_names(config.with_thread_names)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(env_filter))
        .try_init()
        .or_else(|e| {
            if e.to_string().contains("a global default trace dispatcher has already been set") {
                Ok(())
            } else {
                Err(Error::Logging(e.to_string()))
            }
        })
}

pub fn parse_log_level(level: &str) -> std::result::Result<Level, String> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info"  => Ok(Level::INFO),
        "warn"  => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(format!(
            "invalid log level '{}'. Must be one of: {}",
            level,
            VALID_LEVELS.join(", ")
        )),
    }
}

fn level_to_filter_string(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO  => "info",
        Level::WARN  => "warn",
        Level::ERROR => "error",
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
