//! This crate configures tracing; because we perform logging through the tracing subsystem,
//! logging is configured here as well.
//!
//! Library code only uses the [tracing] macros. Binaries call [`Options::init`] once at startup,
//! and tests call [`init_test_logging`] to see log output for the code under test.

use clap::Args;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod error;
pub use error::Error;
mod logformat;
pub use logformat::LogFormat;

fn warn_if_debug_build() {
    #[cfg(debug_assertions)]
    tracing::warn!("Running a debug build")
}

#[derive(Debug, Clone, Args)]
#[group(id = "logging")]
pub struct Options {
    /// Format to use when emitting log events.
    #[arg(long, env = "LOG_FORMAT", default_value = "full", value_enum)]
    pub log_format: LogFormat,

    /// Disable colors in all log output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log level filter for spans and events. The log level filter string is a comma separated
    /// list of directives.
    /// See [`tracing_subscriber::EnvFilter`] for full documentation on the directive syntax.
    ///
    /// Examples:
    ///
    /// Log at INFO level for everything except expression rewrites, which log at TRACE.
    /// ```bash
    /// LOG_LEVEL=info,quill_expression=trace
    /// ```
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Full,
            no_color: false,
            log_level: "info".to_owned(),
        }
    }
}

impl Options {
    /// Install a global subscriber configured by these options.
    ///
    /// Fails if the log level filter can't be parsed, or if a global subscriber has already been
    /// installed.
    pub fn init(&self) -> Result<(), Error> {
        let registry = tracing_subscriber::registry().with(EnvFilter::try_new(&self.log_level)?);
        let layer = fmt::layer().with_ansi(!self.no_color);

        match self.log_format {
            LogFormat::Compact => registry.with(layer.compact()).try_init()?,
            LogFormat::Full => registry.with(layer).try_init()?,
            LogFormat::Pretty => registry.with(layer.pretty()).try_init()?,
            LogFormat::Json => registry
                .with(layer.json().with_current_span(true))
                .try_init()?,
        }

        warn_if_debug_build();
        Ok(())
    }
}

/// Configure logging for tests, filtered by the `LOG_LEVEL` environment variable.
///
/// Safe to call from every test; only the first call in a process has any effect.
pub fn init_test_logging() {
    // This errors out if it's already been called within the scope of a process, which we don't
    // care about, so we just discard the result
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("LOG_LEVEL"))
        .with_test_writer()
        .try_init();
}
