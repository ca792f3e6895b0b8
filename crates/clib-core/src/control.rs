//! Control characters that frame the bridge protocol.
//!
//! Payloads must not contain any of these characters; the framing has no
//! escape mechanism.

/// Start of the header region.
pub const SOH: char = '\u{01}';
/// Start of the body region.
pub const STX: char = '\u{02}';
/// End of the body region; terminates a request frame.
pub const ETX: char = '\u{03}';
/// End of a response transmission.
pub const EOT: char = '\u{04}';
/// Poll request for completed background tasks.
pub const ENQ: char = '\u{05}';
/// Acknowledgement, and the request for buffered output.
pub const ACK: char = '\u{06}';
/// Separator between header fields.
pub const US: char = '\u{1F}';

/// Returns `true` when `c` is one of the framing characters.
#[must_use]
pub const fn is_control(c: char) -> bool {
    matches!(c, SOH | STX | ETX | EOT | ENQ | ACK | US)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_alphabet_is_recognised() {
        for c in [SOH, STX, ETX, EOT, ENQ, ACK, US] {
            assert!(is_control(c), "{c:?} should be a control character");
        }
    }

    #[test]
    fn payload_characters_are_not_control() {
        for c in ['a', ' ', '\n', '\u{1E}', 'é'] {
            assert!(!is_control(c), "{c:?} should not be a control character");
        }
    }
}
