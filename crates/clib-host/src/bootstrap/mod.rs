//! One-time construction of the bridge engine.
//!
//! Bootstrapping loads configuration, installs telemetry, discovers
//! extensions in the host's mod folders, and moves the resulting registry
//! into an [`Engine`]. The registry is immutable from then on.

use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::OrthoError;
use tracing::info;

use clib_config::Config;
use clib_core::{Engine, EngineOptions, ExtensionRegistry};

use crate::discovery::{self, DiscoveryError};
use crate::library::{LibraryLoader, NativeLoader};
use crate::telemetry::{self, TelemetryError};

/// Tracing target for bootstrap.
const BOOTSTRAP_TARGET: &str = "clib_host::bootstrap";

/// Engine type served to the host.
pub type HostEngine = Engine<ExtensionRegistry>;

/// Errors that prevent the bridge from starting.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Configuration could not be loaded.
    #[error("failed to load configuration: {0}")]
    Config(#[source] Arc<OrthoError>),
    /// Logging could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// Extension directories could not be located.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// Builds the engine for the running host process.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry, or locating
/// the host executable fails.
pub fn bootstrap() -> Result<HostEngine, BootstrapError> {
    let config = Config::load_for_host().map_err(BootstrapError::Config)?;
    telemetry::initialise(&config)?;
    info!(target: BOOTSTRAP_TARGET, "bootstrapping extension bridge");

    let mods = discovery::mod_paths(discovery::host_arguments());
    let dirs = discovery::resolve_dirs(mods, &discovery::executable_dir()?, config.extension_dirs());
    Ok(build_engine(&config, &dirs, &NativeLoader))
}

/// Discovers extensions in `dirs` and wraps them in an engine configured
/// from `config`.
#[must_use]
pub fn build_engine(
    config: &Config,
    dirs: &[Utf8PathBuf],
    loader: &dyn LibraryLoader,
) -> HostEngine {
    let mut registry = ExtensionRegistry::new();
    let added = discovery::populate(&mut registry, dirs, loader);
    info!(
        target: BOOTSTRAP_TARGET,
        directories = dirs.len(),
        extensions = added,
        names = ?registry.names(),
        "extension discovery finished"
    );
    let options = EngineOptions::default().with_task_error_reporting(config.report_task_errors());
    Engine::with_options(registry, options)
}
