//! The seam between the bridge and extension libraries.
//!
//! The bridge never loads libraries itself. A host crate resolves extension
//! names to [`ExtensionLibrary`] implementations (native libraries in
//! production, closures in tests) and collects them in an
//! [`ExtensionRegistry`] before the engine is built. Once handed to the
//! engine the registry is read-only.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ActionError, RegistryError};

/// A resolved, invocable action inside an extension library.
///
/// Implementations may be called from several worker threads at once. An
/// action backed by native code is only safe to share when that code is
/// reentrant, which the extension author guarantees.
#[cfg_attr(test, mockall::automock)]
pub trait Action: Send + Sync {
    /// Runs the action on `data` and returns an owned copy of its result.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] when the payload cannot be passed to the
    /// action or when the action fails.
    fn call(&self, data: &str) -> Result<String, ActionError>;
}

/// Shared handle to an [`Action`].
pub type SharedAction = Arc<dyn Action>;

/// A loaded extension exposing named actions.
pub trait ExtensionLibrary: Send + Sync {
    /// Name the extension is registered under.
    fn name(&self) -> &str;

    /// Looks up an exported action by name.
    fn action(&self, name: &str) -> Option<SharedAction>;
}

/// Lookup from extension name to loaded library.
pub trait ExtensionCatalog {
    /// Returns the library registered under `name`.
    fn library(&self, name: &str) -> Option<&dyn ExtensionLibrary>;
}

/// In-memory catalog of loaded extensions keyed by name.
///
/// # Example
///
/// ```
/// use clib_core::{ExtensionCatalog, ExtensionRegistry, FnLibrary};
///
/// let mut registry = ExtensionRegistry::new();
/// registry
///     .register(FnLibrary::new("echo").with_action("say", |data| Ok(data.to_owned())))
///     .expect("registration succeeds");
/// assert!(registry.library("echo").is_some());
/// ```
#[derive(Default)]
pub struct ExtensionRegistry {
    libraries: HashMap<String, Box<dyn ExtensionLibrary>>,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a library under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the name is already taken.
    pub fn register(
        &mut self,
        library: impl ExtensionLibrary + 'static,
    ) -> Result<(), RegistryError> {
        self.register_boxed(Box::new(library))
    }

    /// Registers an already boxed library.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the name is already taken.
    pub fn register_boxed(
        &mut self,
        library: Box<dyn ExtensionLibrary>,
    ) -> Result<(), RegistryError> {
        let name = library.name().to_owned();
        if self.libraries.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }
        self.libraries.insert(name, library);
        Ok(())
    }

    /// Returns `true` when an extension with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }

    /// Registered extension names in ascending order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.libraries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered extensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }
}

impl ExtensionCatalog for ExtensionRegistry {
    fn library(&self, name: &str) -> Option<&dyn ExtensionLibrary> {
        self.libraries.get(name).map(AsRef::as_ref)
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.names())
            .finish()
    }
}

/// Adapts a closure into an [`Action`].
pub struct FnAction<F>(F);

impl<F> FnAction<F>
where
    F: Fn(&str) -> Result<String, ActionError> + Send + Sync,
{
    /// Wraps `function`.
    #[must_use]
    pub const fn new(function: F) -> Self {
        Self(function)
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn(&str) -> Result<String, ActionError> + Send + Sync,
{
    fn call(&self, data: &str) -> Result<String, ActionError> {
        (self.0)(data)
    }
}

/// An extension library assembled from in-process actions.
pub struct FnLibrary {
    name: String,
    actions: HashMap<String, SharedAction>,
}

impl FnLibrary {
    /// Creates a library with no actions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: HashMap::new(),
        }
    }

    /// Adds an action backed by a closure.
    #[must_use]
    pub fn with_action<F>(self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&str) -> Result<String, ActionError> + Send + Sync + 'static,
    {
        self.with_shared_action(name, Arc::new(FnAction::new(function)))
    }

    /// Adds an existing shared action.
    #[must_use]
    pub fn with_shared_action(mut self, name: impl Into<String>, action: SharedAction) -> Self {
        self.actions.insert(name.into(), action);
        self
    }
}

impl ExtensionLibrary for FnLibrary {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn action(&self, name: &str) -> Option<SharedAction> {
        self.actions.get(name).cloned()
    }
}

impl fmt::Debug for FnLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        actions.sort_unstable();
        f.debug_struct("FnLibrary")
            .field("name", &self.name)
            .field("actions", &actions)
            .finish()
    }
}
