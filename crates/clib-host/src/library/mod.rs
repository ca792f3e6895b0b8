//! Native extension libraries loaded with `libloading`.
//!
//! An extension is a shared library that exports the host entry point
//! symbol plus any number of actions with the C signature
//! `const char *action(const char *data)`. The returned string is copied
//! before the call returns; the library keeps ownership of its memory.

use std::ffi::{CStr, CString, c_char};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use libloading::Library;
use tracing::debug;

use clib_core::{Action, ActionError, ExtensionLibrary, SharedAction};

use crate::discovery::ENTRY_POINT;

/// Tracing target for library loading.
const LIBRARY_TARGET: &str = "clib_host::library";

/// C signature of an extension action.
type ActionFn = unsafe extern "C" fn(*const c_char) -> *const c_char;

/// Errors raised while opening an extension library.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// The operating system loader rejected the file.
    #[error("unable to load extension {path}: {source}")]
    Load {
        /// Library path.
        path: Utf8PathBuf,
        /// Loader error.
        #[source]
        source: libloading::Error,
    },
    /// The library does not export the host entry point.
    #[error("{path} does not export {symbol}")]
    MissingEntryPoint {
        /// Library path.
        path: Utf8PathBuf,
        /// Symbol that was looked up.
        symbol: &'static str,
    },
}

/// Opens extension libraries found during discovery.
#[cfg_attr(test, mockall::automock)]
pub trait LibraryLoader {
    /// Loads the library at `path` and registers it as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError`] when the file is not a usable extension.
    fn load(&self, name: &str, path: &Utf8Path) -> Result<Box<dyn ExtensionLibrary>, LibraryError>;
}

/// Loader backed by the operating system's dynamic linker.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

impl LibraryLoader for NativeLoader {
    fn load(&self, name: &str, path: &Utf8Path) -> Result<Box<dyn ExtensionLibrary>, LibraryError> {
        NativeLibrary::open(name, path).map(|library| Box::new(library) as Box<dyn ExtensionLibrary>)
    }
}

/// A loaded extension library.
///
/// The library stays mapped for as long as the value or any action resolved
/// from it is alive.
#[derive(Debug)]
pub struct NativeLibrary {
    name: String,
    path: Utf8PathBuf,
    library: Arc<Library>,
}

impl NativeLibrary {
    /// Loads `path` and checks that it exports the host entry point.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Load`] when the loader fails and
    /// [`LibraryError::MissingEntryPoint`] when the library is not an
    /// extension.
    pub fn open(name: impl Into<String>, path: &Utf8Path) -> Result<Self, LibraryError> {
        let library = Self::load_unchecked(name, path)?;
        if !library.exports(ENTRY_POINT) {
            debug!(target: LIBRARY_TARGET, path = %path, "entry point missing");
            return Err(LibraryError::MissingEntryPoint {
                path: path.to_path_buf(),
                symbol: ENTRY_POINT,
            });
        }
        Ok(library)
    }

    fn load_unchecked(name: impl Into<String>, path: &Utf8Path) -> Result<Self, LibraryError> {
        // SAFETY: loading runs the library's initialisers. Extensions are
        // trusted code shipped alongside the host's mods.
        let library = unsafe { Library::new(path.as_std_path()) }.map_err(|source| {
            LibraryError::Load {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(Self {
            name: name.into(),
            path: path.to_path_buf(),
            library: Arc::new(library),
        })
    }

    /// Path the library was loaded from.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns `true` when the library exports `symbol`.
    #[must_use]
    pub fn exports(&self, symbol: &str) -> bool {
        // SAFETY: the symbol is only checked for presence, never called
        // through this type.
        unsafe { self.library.get::<unsafe extern "C" fn()>(symbol.as_bytes()) }.is_ok()
    }
}

impl ExtensionLibrary for NativeLibrary {
    fn name(&self) -> &str {
        &self.name
    }

    fn action(&self, name: &str) -> Option<SharedAction> {
        // SAFETY: exported actions use the `ActionFn` calling convention.
        let symbol = unsafe { self.library.get::<ActionFn>(name.as_bytes()) }.ok()?;
        let function = *symbol;
        Some(Arc::new(NativeAction {
            function,
            _library: Arc::clone(&self.library),
        }))
    }
}

/// An action exported by a [`NativeLibrary`].
struct NativeAction {
    function: ActionFn,
    _library: Arc<Library>,
}

impl Action for NativeAction {
    fn call(&self, data: &str) -> Result<String, ActionError> {
        let input = CString::new(data).map_err(|_| ActionError::InvalidInput)?;
        // SAFETY: `input` outlives the call and `_library` keeps the code
        // mapped.
        let output = unsafe { (self.function)(input.as_ptr()) };
        if output.is_null() {
            return Err(ActionError::NullResult);
        }
        // SAFETY: a non-null result is a NUL-terminated string owned by the
        // library and valid until its next call.
        let text = unsafe { CStr::from_ptr(output) };
        Ok(text.to_string_lossy().into_owned())
    }
}
