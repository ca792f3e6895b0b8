//! Unit tests for bridge error types.

use std::sync::Arc;

use rstest::rstest;

use super::*;

#[rstest]
#[case::field_count(ParseError::FieldCount { found: 2 }, "2")]
#[case::task_id(ParseError::InvalidTaskId { value: "abc".into() }, "abc")]
#[case::request_too_large(ParseError::RequestTooLarge { size: 23, limit: 16 }, "23 bytes exceeds the 16 byte limit")]
fn parse_error_message_includes_context(#[case] error: ParseError, #[case] expected: &str) {
    let message = error.to_string();
    assert!(
        message.contains(expected),
        "expected {expected} in message: {message}"
    );
}

#[test]
fn unknown_action_names_extension_and_action() {
    let error = DispatchError::UnknownAction {
        extension: "MyExt".into(),
        action: "MyAction".into(),
    };
    let message = error.to_string();
    assert!(message.contains("MyExt"), "missing extension: {message}");
    assert!(message.contains("MyAction"), "missing action: {message}");
}

#[test]
fn task_failure_exposes_action_error_as_source() {
    let error = DispatchError::TaskExecutionFailure {
        task_id: TaskId::new(7),
        source: ActionError::NullResult,
    };
    let source = std::error::Error::source(&error).expect("source is set");
    assert_eq!(source.to_string(), ActionError::NullResult.to_string());
    assert!(error.to_string().contains("task 7"));
}

#[test]
fn engine_error_is_transparent() {
    let error = EngineError::from(ParseError::Empty);
    assert_eq!(error.to_string(), ParseError::Empty.to_string());
}

#[test]
fn dispatch_error_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    // The spawn variant wraps `Arc<io::Error>` to stay cloneable.
    let error = DispatchError::Spawn {
        task_id: TaskId::new(1),
        source: Arc::new(std::io::Error::other("no threads")),
    };
    assert_send_sync::<DispatchError>();
    assert!(error.to_string().contains("no threads"));
}
