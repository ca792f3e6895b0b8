//! Structured telemetry initialisation for the bridge.
//!
//! The host owns stdout and stderr, so events are appended to the configured
//! log file instead.

use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;

use camino::Utf8PathBuf;
use once_cell::sync::OnceCell;
use tracing::{Subscriber, info, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use clib_config::{Config, LogFormat};

/// Tracing target for telemetry events.
const TELEMETRY_TARGET: &str = "clib_host::telemetry";

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// The log file could not be opened for appending.
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        /// Configured log file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls are idempotent: the first successful invocation installs
/// the subscriber and logs the startup banner. A failed invocation leaves the
/// guard unset so a later call can try again.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is malformed, the log file
/// cannot be opened, or another global subscriber is already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let writer = Mutex::new(open_log_file(config)?);

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_thread_names(true)
            .with_writer(writer)
            .with_ansi(false)
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    info!(
        target: TELEMETRY_TARGET,
        log_file = %config.log_file(),
        "CLib ({}) logger loaded",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn open_log_file(config: &Config) -> Result<File, TelemetryError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_file())
        .map_err(|source| TelemetryError::LogFile {
            path: config.log_file().to_path_buf(),
            source,
        })
}
