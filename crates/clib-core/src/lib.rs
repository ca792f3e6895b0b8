//! Request framing, task dispatch, and output chunking for the CLib bridge.
//!
//! The host application talks to the bridge through a single synchronous
//! call that takes a bounded input string and fills a bounded output buffer.
//! This crate turns that narrow channel into an asynchronous, unbounded one:
//!
//! - requests are framed with ASCII control characters ([`control`]) and
//!   decoded by [`Request::parse`];
//! - frames larger than one call are reassembled by [`InputBuffer`];
//! - the [`TaskDispatcher`] runs actions inline or on worker threads and
//!   reports finished background tasks when the host polls;
//! - replies larger than the host buffer are split by [`OutputChannel`] and
//!   collected with follow-up `ACK` calls.
//!
//! [`Engine`] ties these together per host call. Extension libraries are
//! supplied through the [`ExtensionCatalog`] seam, so the crate contains no
//! FFI and no dynamic loading.
//!
//! # Example
//!
//! ```
//! use clib_core::{Engine, ExtensionRegistry, FnLibrary};
//!
//! let mut registry = ExtensionRegistry::new();
//! registry
//!     .register(FnLibrary::new("MyExt").with_action("MyAction", |data| Ok(data.to_owned())))
//!     .expect("registration succeeds");
//!
//! let mut engine = Engine::new(registry);
//! assert_eq!(engine.invoke("\u{1}2\u{1f}MyExt\u{1f}MyAction\u{2}hi\u{3}", 1024), "\u{6}");
//! ```

pub mod control;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod extension;
pub mod input;
pub mod output;
pub mod request;

#[cfg(test)]
mod tests;

pub use self::dispatch::{TaskDispatcher, TaskHandle, TaskStatus, panic_message};
pub use self::engine::{DEBUGGER_STUB, DEBUGGER_TOKEN, Engine, EngineOptions, VERSION_TOKEN};
pub use self::error::{ActionError, DispatchError, EngineError, ParseError, RegistryError};
pub use self::extension::{
    Action, ExtensionCatalog, ExtensionLibrary, ExtensionRegistry, FnAction, FnLibrary,
    SharedAction,
};
pub use self::input::{InputBuffer, MAX_REQUEST_BYTES};
pub use self::output::OutputChannel;
pub use self::request::{Request, TaskId};
