//! Shared configuration for the CLib extension bridge.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! configuration file, then `CLIB_*` environment variables. The bridge runs
//! inside a foreign host process whose command line belongs to the host, so
//! [`Config::load_for_host`] never forwards that command line to the loader;
//! a configuration file is named through `CLIB_CONFIG_PATH` instead.

mod defaults;
mod logging;

use std::env;
use std::ffi::OsString;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    CONFIG_PATH_ENV, DEFAULT_LOG_FILE, DEFAULT_LOG_FILTER, PROGRAM_NAME, default_log_file,
    default_log_filter_string, default_log_format,
};
pub use logging::LogFormat;

/// Runtime configuration of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "CLIB")]
pub struct Config {
    /// `tracing` filter expression applied to the log file.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format of log events.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// File that log events are appended to.
    #[ortho_config(default = default_log_file())]
    pub log_file: Utf8PathBuf,
    /// Directories scanned for extensions in addition to the host's mod list.
    #[serde(default)]
    #[ortho_config(default = Vec::new())]
    pub extension_dirs: Vec<Utf8PathBuf>,
    /// Writes a failed background task's error text into its poll frame.
    #[serde(default)]
    #[ortho_config(default = false, skip_cli)]
    pub report_task_errors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            log_file: default_log_file(),
            extension_dirs: Vec::new(),
            report_task_errors: false,
        }
    }
}

impl Config {
    /// Loads configuration from files and the environment only.
    ///
    /// The file named by [`CONFIG_PATH_ENV`], when set, is layered between
    /// the defaults and the environment.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a configuration file or environment
    /// variable holds a malformed value.
    pub fn load_for_host() -> Result<Self, Arc<OrthoError>> {
        let mut args = vec![OsString::from(PROGRAM_NAME)];
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            args.push(OsString::from("--config-path"));
            args.push(path);
        }
        Self::load_from_iter(args)
    }

    /// Filter expression used for log output.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Selected log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Path of the log file.
    #[must_use]
    pub fn log_file(&self) -> &Utf8Path {
        self.log_file.as_path()
    }

    /// Extra extension directories.
    #[must_use]
    pub fn extension_dirs(&self) -> &[Utf8PathBuf] {
        &self.extension_dirs
    }

    /// Whether failed tasks report their error text when polled.
    #[must_use]
    pub const fn report_task_errors(&self) -> bool {
        self.report_task_errors
    }
}
