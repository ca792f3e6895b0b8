//! Extension discovery.
//!
//! The host lists its mod folders on the command line as `-mod=<list>` and
//! `-serverMod=<list>`, each a `;`-separated list of paths. Every listed
//! folder (plus any configured extra directory) is scanned, without
//! recursing, for shared libraries that carry the platform suffix and export
//! the host entry point. Each one becomes an extension named after its file
//! name with the suffix removed.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use clib_core::ExtensionRegistry;

use crate::library::LibraryLoader;

/// Tracing target for discovery.
const DISCOVERY_TARGET: &str = "clib_host::discovery";

/// File name suffix of extension libraries on this platform.
#[cfg(all(windows, target_pointer_width = "64"))]
pub const LIBRARY_SUFFIX: &str = "_x64.dll";
/// File name suffix of extension libraries on this platform.
#[cfg(all(windows, not(target_pointer_width = "64")))]
pub const LIBRARY_SUFFIX: &str = ".dll";
/// File name suffix of extension libraries on this platform.
#[cfg(not(windows))]
pub const LIBRARY_SUFFIX: &str = ".so";

/// Symbol every extension library exports.
#[cfg(all(windows, target_pointer_width = "32"))]
pub const ENTRY_POINT: &str = "_RVExtension@12";
/// Symbol every extension library exports.
#[cfg(not(all(windows, target_pointer_width = "32")))]
pub const ENTRY_POINT: &str = "RVExtension";

/// Command-line parameters that carry mod lists, compared case-insensitively.
const MOD_PARAMETERS: [&str; 2] = ["-mod", "-serverMod"];

/// Errors raised while locating extension directories.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// A directory could not be listed.
    #[error("unable to read directory {path}: {source}")]
    ReadDir {
        /// Directory path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The host executable's location is unknown.
    #[error("unable to locate the host executable: {0}")]
    ExecutableDir(#[source] io::Error),
    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path {
        /// Offending path.
        path: PathBuf,
    },
}

/// A library file that looks like an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Extension name derived from the file name.
    pub name: String,
    /// Full path of the library.
    pub path: Utf8PathBuf,
}

/// Collects the mod paths named by `-mod=` and `-serverMod=` arguments.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use clib_host::discovery::mod_paths;
///
/// let paths = mod_paths(["arma3.exe", "-mod=@CBA;@ACE", "-serverMod=\"@Server\""]);
/// assert_eq!(
///     paths,
///     ["@CBA", "@ACE", "@Server"].map(Utf8PathBuf::from).to_vec()
/// );
/// ```
pub fn mod_paths<I, S>(args: I) -> Vec<Utf8PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut paths = Vec::new();
    for arg in args {
        let Some(list) = mod_list(arg.as_ref()) else {
            continue;
        };
        paths.extend(
            list.split(';')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(Utf8PathBuf::from),
        );
    }
    paths
}

fn mod_list(arg: &str) -> Option<&str> {
    let (name, value) = strip_quotes(arg).split_once('=')?;
    MOD_PARAMETERS
        .iter()
        .any(|parameter| parameter.eq_ignore_ascii_case(name))
        .then(|| strip_quotes(value))
}

const QUOTES: [char; 2] = ['"', '\''];

fn strip_quotes(text: &str) -> &str {
    QUOTES
        .iter()
        .find_map(|&quote| {
            text.strip_prefix(quote)
                .and_then(|inner| inner.strip_suffix(quote))
        })
        .unwrap_or(text)
}

/// Arguments the host process was started with.
#[must_use]
pub fn host_arguments() -> Vec<String> {
    env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// Directory containing the host executable.
///
/// # Errors
///
/// Returns [`DiscoveryError::ExecutableDir`] when the platform cannot report
/// the executable path and [`DiscoveryError::NonUtf8Path`] when it is not
/// UTF-8.
pub fn executable_dir() -> Result<Utf8PathBuf, DiscoveryError> {
    let executable = env::current_exe().map_err(DiscoveryError::ExecutableDir)?;
    let dir = executable.parent().map(Path::to_path_buf).unwrap_or_default();
    Utf8PathBuf::from_path_buf(dir).map_err(|path| DiscoveryError::NonUtf8Path { path })
}

/// Resolves relative mod paths against `base` and appends `extra`.
#[must_use]
pub fn resolve_dirs(
    mods: Vec<Utf8PathBuf>,
    base: &Utf8Path,
    extra: &[Utf8PathBuf],
) -> Vec<Utf8PathBuf> {
    mods.into_iter()
        .map(|dir| if dir.is_relative() { base.join(dir) } else { dir })
        .chain(extra.iter().cloned())
        .collect()
}

/// Extension name for a library file, or `None` if the suffix is absent.
///
/// The suffix comparison ignores ASCII case.
#[must_use]
pub fn extension_name(file_name: &str) -> Option<&str> {
    let split = file_name.len().checked_sub(LIBRARY_SUFFIX.len())?;
    let suffix = file_name.get(split..)?;
    if !suffix.eq_ignore_ascii_case(LIBRARY_SUFFIX) {
        return None;
    }
    file_name.get(..split).filter(|name| !name.is_empty())
}

/// Lists the extension candidates directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`DiscoveryError::ReadDir`] when the directory cannot be listed.
pub fn candidates(dir: &Utf8Path) -> Result<Vec<Candidate>, DiscoveryError> {
    let read_error = |source| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut found = Vec::new();
    for item in dir.read_dir_utf8().map_err(read_error)? {
        let entry = item.map_err(read_error)?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = extension_name(entry.file_name()) {
            found.push(Candidate {
                name: name.to_owned(),
                path: entry.path().to_path_buf(),
            });
        }
    }
    found.sort_by(|left, right| left.path.cmp(&right.path));
    Ok(found)
}

/// Loads every extension found in `dirs` into `registry`.
///
/// Unreadable directories and files that are not extensions are skipped. A
/// name that is already registered keeps its first library. Returns the
/// number of extensions added.
pub fn populate(
    registry: &mut ExtensionRegistry,
    dirs: &[Utf8PathBuf],
    loader: &dyn LibraryLoader,
) -> usize {
    let mut added = 0;
    for dir in dirs {
        debug!(target: DISCOVERY_TARGET, dir = %dir, "scanning mod directory");
        let found = match candidates(dir) {
            Ok(found) => found,
            Err(error) => {
                warn!(target: DISCOVERY_TARGET, %error, "skipping mod directory");
                continue;
            }
        };
        for candidate in found {
            if register(registry, &candidate, loader) {
                added += 1;
            }
        }
    }
    added
}

fn register(
    registry: &mut ExtensionRegistry,
    candidate: &Candidate,
    loader: &dyn LibraryLoader,
) -> bool {
    let Candidate { name, path } = candidate;
    if registry.contains(name) {
        warn!(
            target: DISCOVERY_TARGET,
            extension = %name,
            path = %path,
            "duplicate extension name, keeping the first"
        );
        return false;
    }
    let library = match loader.load(name, path) {
        Ok(library) => library,
        Err(error) => {
            debug!(target: DISCOVERY_TARGET, %error, "not an extension");
            return false;
        }
    };
    match registry.register_boxed(library) {
        Ok(()) => {
            info!(target: DISCOVERY_TARGET, extension = %name, path = %path, "extension registered");
            true
        }
        Err(error) => {
            warn!(target: DISCOVERY_TARGET, %error, "extension rejected");
            false
        }
    }
}
