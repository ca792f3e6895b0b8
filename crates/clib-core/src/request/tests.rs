//! Unit tests for request parsing.

use rstest::rstest;

use super::*;

fn frame(id: &str, extension: &str, action: &str, data: &str) -> String {
    format!("{SOH}{id}{US}{extension}{US}{action}{STX}{data}{ETX}")
}

#[rstest]
#[case::background("2", "MyExt", "MyAction", "hello", 2)]
#[case::synchronous("-1", "MyExt", "MyAction", "hello", -1)]
#[case::empty_body("10", "Ext", "Act", "", 10)]
#[case::multibyte_body("3", "Ext", "Act", "grüße ✓", 3)]
fn valid_frames_round_trip_fields(
    #[case] id: &str,
    #[case] extension: &str,
    #[case] action: &str,
    #[case] data: &str,
    #[case] expected_id: i32,
) {
    let request = Request::parse(&frame(id, extension, action, data)).expect("frame parses");
    assert_eq!(request.task_id(), TaskId::new(expected_id));
    assert_eq!(request.extension(), extension);
    assert_eq!(request.action(), action);
    assert_eq!(request.data(), data);
}

#[test]
fn header_names_are_trimmed() {
    let request = Request::parse(&frame(" 4 ", "  MyExt\t", " MyAction ", " keep ")).expect("parses");
    assert_eq!(request.task_id(), TaskId::new(4));
    assert_eq!(request.extension(), "MyExt");
    assert_eq!(request.action(), "MyAction");
    assert_eq!(request.data(), " keep ", "body is passed verbatim");
}

#[test]
fn empty_input_is_rejected() {
    assert_eq!(Request::parse(""), Err(ParseError::Empty));
}

#[test]
fn body_start_without_end_is_rejected() {
    let raw = format!("{SOH}1{US}Ext{US}Act{STX}data");
    assert_eq!(Request::parse(&raw), Err(ParseError::MissingBodyEnd));
}

#[test]
fn body_end_before_start_is_rejected() {
    let raw = format!("{SOH}1{US}Ext{US}Act{ETX}data{STX}");
    assert_eq!(Request::parse(&raw), Err(ParseError::BodyEndBeforeStart));
}

#[test]
fn two_header_fields_are_rejected() {
    let raw = format!("{SOH}1{US}Ext{STX}data{ETX}");
    assert_eq!(
        Request::parse(&raw),
        Err(ParseError::FieldCount { found: 2 })
    );
}

#[test]
fn non_numeric_task_id_is_rejected() {
    let raw = frame("abc", "Ext", "Act", "data");
    assert_eq!(
        Request::parse(&raw),
        Err(ParseError::InvalidTaskId {
            value: "abc".into()
        })
    );
}

#[test]
fn action_keeps_separators_beyond_third_field() {
    let raw = format!("{SOH}1{US}Ext{US}Act{US}more{STX}data{ETX}");
    let request = Request::parse(&raw).expect("parses");
    assert_eq!(request.action(), format!("Act{US}more"));
}

#[test]
fn frame_without_body_markers_has_empty_body() {
    let raw = format!("{SOH}5{US}Ext{US}Act{ETX}");
    let request = Request::parse(&raw).expect("parses");
    assert_eq!(request.action(), "Act");
    assert_eq!(request.data(), "");
}

#[test]
fn header_start_marker_is_optional() {
    let raw = format!("6{US}Ext{US}Act{STX}payload{ETX}");
    let request = Request::parse(&raw).expect("parses");
    assert_eq!(request.task_id(), TaskId::new(6));
    assert_eq!(request.data(), "payload");
}

#[test]
fn encode_produces_the_wire_frame() {
    let request = Request::new(TaskId::new(2), "MyExt", "MyAction", "hello");
    assert_eq!(request.encode(), "\u{1}2\u{1f}MyExt\u{1f}MyAction\u{2}hello\u{3}");
    assert_eq!(Request::parse(&request.encode()), Ok(request));
}

#[test]
fn sync_sentinel_is_detected() {
    assert!(TaskId::SYNC.is_sync());
    assert!(TaskId::new(-1).is_sync());
    assert!(!TaskId::new(0).is_sync());
    assert_eq!(TaskId::new(42).to_string(), "42");
}
