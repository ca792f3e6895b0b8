//! Domain errors raised by the bridge core.
//!
//! None of these errors cross the host boundary. The entry-point engine
//! renders them into the plain-text message returned for the failing call.

use std::sync::Arc;

use thiserror::Error;

use crate::request::TaskId;

/// Errors raised while decoding a request frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The frame was empty.
    #[error("cannot parse a request from empty input")]
    Empty,

    /// A body-start marker was present without a matching body-end marker.
    #[error("missing ETX marker after STX")]
    MissingBodyEnd,

    /// The body-end marker appeared before the body-start marker.
    #[error("ETX marker appears before STX")]
    BodyEndBeforeStart,

    /// The header did not split into the three required fields.
    #[error("expected 3 header fields but got {found}")]
    FieldCount {
        /// Number of fields that were found.
        found: usize,
    },

    /// The first header field is not an integer.
    #[error("invalid task id '{value}'")]
    InvalidTaskId {
        /// Raw text of the offending field.
        value: String,
    },

    /// Buffered request fragments grew past the size limit.
    #[error("request of {size} bytes exceeds the {limit} byte limit")]
    RequestTooLarge {
        /// Bytes buffered when the limit was hit.
        size: usize,
        /// Configured limit.
        limit: usize,
    },
}

/// Failures raised by an extension action while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The payload cannot be handed to the action (it contains a NUL byte).
    #[error("payload contains an interior NUL byte")]
    InvalidInput,

    /// The action returned a null pointer instead of a string.
    #[error("action returned no result")]
    NullResult,

    /// The action panicked.
    #[error("action panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// The action reported a failure of its own.
    #[error("action failed: {message}")]
    Failed {
        /// Failure description.
        message: String,
    },
}

/// Errors raised while resolving, running, or collecting a request.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// No extension with the requested name is known.
    #[error("unknown extension '{name}'")]
    UnknownExtension {
        /// Requested extension name.
        name: String,
    },

    /// The extension does not export the requested action.
    #[error("unknown action '{action}' in extension '{extension}'")]
    UnknownAction {
        /// Extension that was searched.
        extension: String,
        /// Requested action name.
        action: String,
    },

    /// The action ran but failed.
    #[error("task {task_id} failed: {source}")]
    TaskExecutionFailure {
        /// Task that failed; [`TaskId::SYNC`] for synchronous calls.
        task_id: TaskId,
        /// Failure raised by the action.
        #[source]
        source: ActionError,
    },

    /// A pending task was found in a state that cannot be collected.
    #[error("task {task_id} is in an invalid state: {message}")]
    PollProtocolFailure {
        /// Task whose handle is unusable.
        task_id: TaskId,
        /// Description of the inconsistency.
        message: String,
    },

    /// The worker thread for a background task could not be started.
    #[error("failed to start worker for task {task_id}: {source}")]
    Spawn {
        /// Task that could not be started.
        task_id: TaskId,
        /// Underlying OS error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

/// Errors raised while registering extensions in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An extension with the same name is already registered.
    #[error("extension '{name}' is already registered")]
    Duplicate {
        /// Conflicting extension name.
        name: String,
    },
}

/// Failure of a single request frame, from parsing through dispatch.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The frame could not be decoded.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The decoded request could not be dispatched.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[cfg(test)]
mod tests;
