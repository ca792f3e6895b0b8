//! Entry points exported to the host.
//!
//! | Symbol | Host call |
//! |---|---|
//! | `RVExtensionVersion` | once, when the library is loaded |
//! | `RVExtension` | `"ext" callExtension "input"` |
//! | `RVExtensionArgs` | `"ext" callExtension ["input", [args]]` |
//!
//! The first request bootstraps the bridge. If bootstrapping fails the error
//! text is returned and the next request tries again. Nothing unwinds into
//! the host: panics are caught and rendered as error text.

use std::ffi::{CStr, c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::{Mutex, PoisonError};

use once_cell::sync::OnceCell;
use tracing::{debug, error};

use clib_core::output::floor_char_boundary;
use clib_core::panic_message;

use crate::bootstrap::{self, BootstrapError, HostEngine};

/// Tracing target for host calls.
const FFI_TARGET: &str = "clib_host::ffi";

static ENGINE: OnceCell<Mutex<HostEngine>> = OnceCell::new();

fn shared_engine() -> Result<&'static Mutex<HostEngine>, BootstrapError> {
    ENGINE.get_or_try_init(|| bootstrap::bootstrap().map(Mutex::new))
}

/// Answers one host request with at most `capacity - 1` bytes.
///
/// Bootstraps the process-wide engine on first use.
#[must_use]
pub fn respond(input: &str, capacity: usize) -> String {
    match shared_engine() {
        Ok(engine) => engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .invoke(input, capacity),
        Err(error) => {
            error!(target: FFI_TARGET, %error, "bootstrap failed");
            format!("Error during extension detection: {error}")
        }
    }
}

/// Writes the bridge version into `output`.
///
/// # Safety
///
/// `output` must be null or point to `output_size` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn RVExtensionVersion(output: *mut c_char, output_size: c_int) {
    // SAFETY: forwarded caller contract.
    unsafe { write_output(output, capacity(output_size), env!("CARGO_PKG_VERSION")) };
}

/// Handles one request from the host.
///
/// # Safety
///
/// `output` must be null or point to `output_size` writable bytes, and
/// `function` must be null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn RVExtension(
    output: *mut c_char,
    output_size: c_int,
    function: *const c_char,
) {
    let capacity = capacity(output_size);
    // SAFETY: forwarded caller contract.
    let input = unsafe { read_input(function) };
    let reply = guarded(|| respond(&input, capacity));
    // SAFETY: forwarded caller contract.
    unsafe { write_output(output, capacity, &reply) };
}

/// Handles a request made with an argument array.
///
/// The arguments are not part of the bridge protocol: `function` is
/// processed exactly as [`RVExtension`] would process it. Always returns 0.
///
/// # Safety
///
/// Same contract as [`RVExtension`]. `argv` is never read.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn RVExtensionArgs(
    output: *mut c_char,
    output_size: c_int,
    function: *const c_char,
    _argv: *const *const c_char,
    argc: c_int,
) -> c_int {
    debug!(target: FFI_TARGET, argc, "argument array ignored");
    // SAFETY: forwarded caller contract.
    unsafe { RVExtension(output, output_size, function) };
    0
}

fn capacity(output_size: c_int) -> usize {
    usize::try_from(output_size).unwrap_or(0)
}

fn guarded(respond: impl FnOnce() -> String) -> String {
    panic::catch_unwind(AssertUnwindSafe(respond)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        error!(target: FFI_TARGET, %message, "request panicked");
        format!("Failed at processing request: {message}")
    })
}

/// Copies the host's input, treating null as empty.
///
/// # Safety
///
/// `input` must be null or a NUL-terminated string.
unsafe fn read_input(input: *const c_char) -> String {
    if input.is_null() {
        return String::new();
    }
    // SAFETY: non-null and NUL-terminated per the caller contract.
    unsafe { CStr::from_ptr(input) }
        .to_string_lossy()
        .into_owned()
}

/// Writes at most `capacity - 1` bytes of `text` plus a terminating NUL.
///
/// # Safety
///
/// `output` must be null or point to `capacity` writable bytes.
unsafe fn write_output(output: *mut c_char, capacity: usize, text: &str) {
    if output.is_null() || capacity == 0 {
        return;
    }
    let len = floor_char_boundary(text, capacity - 1);
    // SAFETY: `len < capacity` and the regions cannot overlap.
    unsafe {
        ptr::copy_nonoverlapping(text.as_ptr().cast::<c_char>(), output, len);
        output.add(len).write(0);
    }
}

#[cfg(test)]
mod tests;
