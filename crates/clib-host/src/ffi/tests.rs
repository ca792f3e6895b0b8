//! Tests for buffer handling at the host boundary.

use std::ffi::CStr;

use rstest::rstest;

use super::*;

fn written(buffer: &[c_char]) -> String {
    // SAFETY: `write_output` always terminates the buffer.
    unsafe { CStr::from_ptr(buffer.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

#[rstest]
#[case::fits(16, "hello", "hello")]
#[case::exact(6, "hello", "hello")]
#[case::truncated(4, "hello", "hel")]
#[case::multibyte_boundary(5, "ab✓cd", "ab")]
#[case::terminator_only(1, "hello", "")]
fn output_is_bounded_and_terminated(
    #[case] capacity: usize,
    #[case] text: &str,
    #[case] expected: &str,
) {
    let mut buffer: Vec<c_char> = vec![1; capacity];

    // SAFETY: the buffer has `capacity` writable bytes.
    unsafe { write_output(buffer.as_mut_ptr(), capacity, text) };

    assert_eq!(written(&buffer), expected);
}

#[rstest]
fn zero_capacity_and_null_output_are_ignored() {
    let mut buffer: Vec<c_char> = vec![1; 4];

    // SAFETY: nothing is written for a zero capacity or a null pointer.
    unsafe {
        write_output(buffer.as_mut_ptr(), 0, "hello");
        write_output(ptr::null_mut(), 4, "hello");
    }

    assert_eq!(buffer, vec![1; 4]);
}

#[rstest]
fn null_input_reads_as_empty() {
    // SAFETY: null is accepted.
    assert_eq!(unsafe { read_input(ptr::null()) }, "");
}

#[rstest]
fn input_is_copied_lossily() {
    let raw = b"\x01-1\x1fExt\xff\0";

    // SAFETY: `raw` is NUL-terminated.
    let input = unsafe { read_input(raw.as_ptr().cast::<c_char>()) };

    assert_eq!(input, "\u{1}-1\u{1f}Ext\u{fffd}");
}

#[rstest]
#[case::negative(-1, 0)]
#[case::zero(0, 0)]
#[case::typical(10_240, 10_240)]
fn capacity_ignores_negative_sizes(#[case] output_size: c_int, #[case] expected: usize) {
    assert_eq!(capacity(output_size), expected);
}

#[rstest]
fn panics_become_error_text() {
    let reply = guarded(|| panic!("engine exploded"));

    assert_eq!(reply, "Failed at processing request: engine exploded");
}
