//! Per-call entry-point state machine.
//!
//! The host calls the bridge with one input string and one bounded output
//! buffer. [`Engine::invoke`] decides what the input means, produces the full
//! response, and hands it to the [`OutputChannel`] so that only a bounded
//! chunk is returned.
//!
//! | Input | Response |
//! |---|---|
//! | empty | nothing |
//! | `version` | `CLib v<version>` |
//! | `debugger` | a stub message |
//! | starts with `ACK` | the buffered overflow |
//! | starts with `ENQ` | finished background tasks |
//! | anything else | a request fragment; `ACK` until the frame is complete |
//!
//! The host cannot tell a full chunk that ends a response from a full chunk
//! followed by overflow. Hosts keep sending `ACK` until a reply is shorter
//! than their buffer or ends in `EOT`.

use tracing::{error, warn};

use crate::control::{ACK, ENQ};
use crate::dispatch::TaskDispatcher;
use crate::error::EngineError;
use crate::extension::ExtensionCatalog;
use crate::input::{InputBuffer, MAX_REQUEST_BYTES};
use crate::output::OutputChannel;
use crate::request::Request;

/// Tracing target for the entry point.
const ENGINE_TARGET: &str = "clib_core::engine";

/// Input asking for the engine's version.
pub const VERSION_TOKEN: &str = "version";

/// Input reserved for the debugging protocol.
pub const DEBUGGER_TOKEN: &str = "debugger";

/// Reply to [`DEBUGGER_TOKEN`].
pub const DEBUGGER_STUB: &str = "Debugger not yet implemented!";

/// Construction options for [`Engine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    version: String,
    report_task_errors: bool,
    max_request_bytes: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            report_task_errors: false,
            max_request_bytes: MAX_REQUEST_BYTES,
        }
    }
}

impl EngineOptions {
    /// Sets the version reported for [`VERSION_TOKEN`].
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Makes failed background tasks report their error text.
    #[must_use]
    pub const fn with_task_error_reporting(mut self, enabled: bool) -> Self {
        self.report_task_errors = enabled;
        self
    }

    /// Bounds the size of a request assembled from fragments.
    #[must_use]
    pub const fn with_max_request_bytes(mut self, limit: usize) -> Self {
        self.max_request_bytes = limit;
        self
    }

    /// Version reported for [`VERSION_TOKEN`].
    #[must_use]
    pub fn version(&self) -> &str {
        self.version.as_str()
    }
}

/// The bridge engine: input reassembly, dispatch, and output chunking.
///
/// # Example
///
/// ```
/// use clib_core::{Engine, ExtensionRegistry, FnLibrary};
///
/// let mut registry = ExtensionRegistry::new();
/// registry
///     .register(FnLibrary::new("MyExt").with_action("MyAction", |data| Ok(data.len().to_string())))
///     .expect("registration succeeds");
///
/// let mut engine = Engine::new(registry);
/// let reply = engine.invoke("\u{1}-1\u{1f}MyExt\u{1f}MyAction\u{2}hello\u{3}", 1024);
/// assert_eq!(reply, "\u{2}5\u{4}");
/// ```
#[derive(Debug)]
pub struct Engine<C> {
    dispatcher: TaskDispatcher<C>,
    input: InputBuffer,
    output: OutputChannel,
    version_text: String,
}

impl<C: ExtensionCatalog> Engine<C> {
    /// Creates an engine with default options.
    #[must_use]
    pub fn new(catalog: C) -> Self {
        Self::with_options(catalog, EngineOptions::default())
    }

    /// Creates an engine with explicit options.
    #[must_use]
    pub fn with_options(catalog: C, options: EngineOptions) -> Self {
        Self {
            dispatcher: TaskDispatcher::new(catalog)
                .with_error_reporting(options.report_task_errors),
            input: InputBuffer::with_limit(options.max_request_bytes),
            output: OutputChannel::new(),
            version_text: format!("CLib v{}", options.version),
        }
    }

    /// Handles one host call.
    ///
    /// `capacity` is the size of the host's buffer including its string
    /// terminator, so the reply holds at most `capacity - 1` bytes. Errors
    /// are rendered into the reply; this never fails.
    pub fn invoke(&mut self, input: &str, capacity: usize) -> String {
        if input.is_empty() {
            return String::new();
        }
        let full = self.respond(input);
        self.output.deliver(full, capacity.saturating_sub(1))
    }

    /// Text returned for [`VERSION_TOKEN`].
    #[must_use]
    pub fn version_text(&self) -> &str {
        self.version_text.as_str()
    }

    /// The dispatcher owning all pending tasks.
    #[must_use]
    pub const fn dispatcher(&self) -> &TaskDispatcher<C> {
        &self.dispatcher
    }

    /// Returns `true` while part of the last response is waiting for `ACK`.
    #[must_use]
    pub const fn has_overflow(&self) -> bool {
        self.output.has_overflow()
    }

    /// Returns `true` while a partial request frame is buffered.
    #[must_use]
    pub fn has_partial_request(&self) -> bool {
        !self.input.is_empty()
    }

    fn respond(&mut self, input: &str) -> String {
        match input {
            VERSION_TOKEN => self.version_text.clone(),
            DEBUGGER_TOKEN => DEBUGGER_STUB.to_owned(),
            _ => match input.chars().next() {
                Some(ACK) => self.output.take_overflow(),
                Some(ENQ) => self.poll(),
                _ => self.receive(input),
            },
        }
    }

    fn poll(&mut self) -> String {
        match self.dispatcher.poll() {
            Ok(reply) => reply.unwrap_or_default(),
            Err(error) => {
                error!(target: ENGINE_TARGET, %error, "poll aborted");
                format!("Error during task processing: {error}")
            }
        }
    }

    fn receive(&mut self, fragment: &str) -> String {
        match self.assemble(fragment) {
            Ok(Some(reply)) => reply,
            Ok(None) => ACK.to_string(),
            Err(error) => {
                warn!(target: ENGINE_TARGET, %error, "request rejected");
                format!("Failed at processing request: {error}")
            }
        }
    }

    fn assemble(&mut self, fragment: &str) -> Result<Option<String>, EngineError> {
        let Some(frame) = self.input.push(fragment)? else {
            return Ok(None);
        };
        self.execute(&frame).map(Some)
    }

    fn execute(&mut self, frame: &str) -> Result<String, EngineError> {
        let request = Request::parse(frame)?;
        Ok(self.dispatcher.dispatch(request)?)
    }
}
