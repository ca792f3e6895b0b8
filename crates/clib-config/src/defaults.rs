use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Program name handed to the configuration loader in place of the host's
/// command line.
pub const PROGRAM_NAME: &str = "clib";

/// Environment variable naming an optional configuration file.
pub const CONFIG_PATH_ENV: &str = "CLIB_CONFIG_PATH";

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// File the bridge appends its log to unless configured otherwise.
pub const DEFAULT_LOG_FILE: &str = "clib.log";

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default log file location, relative to the host's working directory.
#[must_use]
pub fn default_log_file() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_LOG_FILE)
}
