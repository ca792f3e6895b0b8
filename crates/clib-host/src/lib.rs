//! Host-facing surface of the CLib bridge.
//!
//! This crate is built as a shared library the host loads at startup. It
//! exports the three entry points the host calls (see [`ffi`]), bootstraps
//! logging and configuration on first use, and discovers extension
//! libraries shipped in the host's mod folders. The protocol itself lives in
//! `clib_core`.

pub mod bootstrap;
pub mod discovery;
pub mod ffi;
pub mod library;
pub mod telemetry;

pub use self::bootstrap::{BootstrapError, HostEngine};
pub use self::discovery::DiscoveryError;
pub use self::library::{LibraryError, LibraryLoader, NativeLibrary, NativeLoader};
pub use self::telemetry::{TelemetryError, TelemetryHandle};
