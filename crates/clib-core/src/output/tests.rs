//! Unit tests for output chunking.

use rstest::rstest;

use super::*;

/// Delivers `text` and drains every overflow the way a host polling with
/// `ACK` would, returning all chunks in order.
fn drain(text: &str, max_len: usize) -> Vec<String> {
    let mut channel = OutputChannel::new();
    let mut chunks = vec![channel.deliver(text.to_owned(), max_len)];
    while channel.has_overflow() {
        let tail = channel.take_overflow();
        chunks.push(channel.deliver(tail, max_len));
    }
    chunks
}

#[test]
fn short_response_is_returned_unchanged() {
    let mut channel = OutputChannel::new();
    assert_eq!(channel.deliver("abc".to_owned(), 3), "abc");
    assert!(!channel.has_overflow());
}

#[test]
fn fitting_response_clears_previous_overflow() {
    let mut channel = OutputChannel::new();
    let _first = channel.deliver("abcdef".to_owned(), 2);
    assert!(channel.has_overflow());
    assert_eq!(channel.deliver("xy".to_owned(), 2), "xy");
    assert!(!channel.has_overflow());
}

#[test]
fn second_overflow_replaces_the_first() {
    let mut channel = OutputChannel::new();
    let _first = channel.deliver("aaaaaa".to_owned(), 2);
    let _second = channel.deliver("bbbbbb".to_owned(), 2);
    assert_eq!(channel.take_overflow(), "bbbb");
    assert_eq!(channel.take_overflow(), "", "overflow is consumed once");
}

#[test]
fn split_never_lands_inside_a_character() {
    let mut channel = OutputChannel::new();
    // "é" is two bytes; a limit of 2 would cut it after one byte.
    let chunk = channel.deliver("aé".to_owned(), 2);
    assert_eq!(chunk, "a");
    assert_eq!(channel.take_overflow(), "é");
}

#[test]
fn limit_below_first_character_keeps_everything() {
    let mut channel = OutputChannel::new();
    let chunk = channel.deliver("✓".to_owned(), 2);
    assert_eq!(chunk, "");
    assert_eq!(channel.overflow_len(), "✓".len());
}

#[rstest]
#[case::ascii_single_byte("the quick brown fox", 1)]
#[case::ascii_exact_multiple("abcdefgh", 4)]
#[case::mixed_width("größer ✓ 漢字 🦀 done", 4)]
#[case::mixed_width_odd_limit("größer ✓ 漢字 🦀 done", 5)]
#[case::emoji_only("🦀🦀🦀🦀", 7)]
fn draining_reconstructs_the_response(#[case] text: &str, #[case] max_len: usize) {
    let chunks = drain(text, max_len);
    for chunk in &chunks {
        assert!(
            chunk.len() <= max_len,
            "chunk {chunk:?} exceeds {max_len} bytes"
        );
    }
    assert_eq!(chunks.concat(), text);
}

#[test]
fn large_ascii_response_splits_at_limit() {
    let text = "x".repeat(10_000);
    let mut channel = OutputChannel::new();
    let chunk = channel.deliver(text, 99);
    assert_eq!(chunk.len(), 99);
    assert_eq!(channel.overflow_len(), 9_901);
}
