//! Text codec for TapDeck wire messages.
//!
//! Encoding is total: every [`SemanticEvent`] maps to exactly one datagram.
//! Decimals are written with `f32`'s shortest round-trip representation and
//! always carry a fractional part or exponent (`10.0`, `-3.0`, `0.5`,
//! `1e-7`), so any receiver that parses decimal floats recovers the exact
//! value.
//!
//! Decoding implements a conformant receiver and is used for loopback tests
//! and diagnostics.

use thiserror::Error;

use crate::protocol::messages::{MessageKind, SemanticEvent};

/// Errors that can occur while decoding a datagram.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The datagram carried no bytes.
    #[error("empty datagram")]
    Empty,

    /// The datagram is not valid UTF-8.
    #[error("datagram is not valid UTF-8")]
    InvalidUtf8,

    /// A key message did not carry exactly one label character.
    #[error("key message must carry exactly one label character, got {0:?}")]
    InvalidLabel(String),

    /// The numeric payload could not be parsed as a finite decimal.
    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    /// An absolute position fell outside `0.0..=1.0`.
    #[error("absolute position {0} is outside 0.0..=1.0")]
    RatioOutOfRange(f32),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`SemanticEvent`] into its datagram bytes.
///
/// # Examples
///
/// ```rust
/// use tapdeck_core::protocol::{decode_event, encode_event, SemanticEvent};
///
/// let bytes = encode_event(&SemanticEvent::Delta(10.0));
/// assert_eq!(bytes, b"10.0");
/// assert_eq!(decode_event(&bytes).unwrap(), SemanticEvent::Delta(10.0));
/// ```
pub fn encode_event(event: &SemanticEvent) -> Vec<u8> {
    let prefix = event.kind().prefix();
    let text = match *event {
        SemanticEvent::KeyDown(label) | SemanticEvent::KeyUp(label) => {
            format!("{prefix}{label}")
        }
        SemanticEvent::Delta(value) | SemanticEvent::AbsolutePosition(value) => {
            format!("{prefix}{}", format_decimal(value))
        }
    };
    text.into_bytes()
}

/// Decodes one datagram into a [`SemanticEvent`].
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are empty, not UTF-8, or do not
/// match any message format.
pub fn decode_event(bytes: &[u8]) -> Result<SemanticEvent, ProtocolError> {
    if bytes.is_empty() {
        return Err(ProtocolError::Empty);
    }
    let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)?;
    let kind = MessageKind::classify(text);
    let payload = &text[kind.prefix().len()..];

    match kind {
        MessageKind::KeyDown => decode_label(payload).map(SemanticEvent::KeyDown),
        MessageKind::KeyUp => decode_label(payload).map(SemanticEvent::KeyUp),
        MessageKind::Delta => decode_decimal(payload).map(SemanticEvent::Delta),
        MessageKind::AbsolutePosition => {
            let ratio = decode_decimal(payload)?;
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ProtocolError::RatioOutOfRange(ratio));
            }
            Ok(SemanticEvent::AbsolutePosition(ratio))
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Shortest round-trip text for `value`.  `Debug` for floats always keeps a
/// fractional part (`10.0`, not `10`), which plain `Display` drops.
fn format_decimal(value: f32) -> String {
    format!("{value:?}")
}

fn decode_label(payload: &str) -> Result<char, ProtocolError> {
    let mut chars = payload.chars();
    match (chars.next(), chars.next()) {
        (Some(label), None) => Ok(label),
        _ => Err(ProtocolError::InvalidLabel(payload.to_string())),
    }
}

fn decode_decimal(payload: &str) -> Result<f32, ProtocolError> {
    let value: f32 = payload
        .parse()
        .map_err(|_| ProtocolError::InvalidNumber(payload.to_string()))?;
    if !value.is_finite() {
        return Err(ProtocolError::InvalidNumber(payload.to_string()));
    }
    Ok(value)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(event: SemanticEvent) -> String {
        String::from_utf8(encode_event(&event)).expect("encoder emits UTF-8")
    }

    #[test]
    fn test_encode_key_down() {
        assert_eq!(text(SemanticEvent::KeyDown('s')), "KDs");
    }

    #[test]
    fn test_encode_key_up() {
        assert_eq!(text(SemanticEvent::KeyUp('l')), "KUl");
    }

    #[test]
    fn test_encode_delta_keeps_fractional_part() {
        assert_eq!(text(SemanticEvent::Delta(10.0)), "10.0");
        assert_eq!(text(SemanticEvent::Delta(-3.0)), "-3.0");
        assert_eq!(text(SemanticEvent::Delta(12.5)), "12.5");
    }

    #[test]
    fn test_encode_absolute_position() {
        assert_eq!(text(SemanticEvent::AbsolutePosition(0.5)), "A0.5");
        assert_eq!(text(SemanticEvent::AbsolutePosition(0.0)), "A0.0");
        assert_eq!(text(SemanticEvent::AbsolutePosition(1.0)), "A1.0");
    }

    #[test]
    fn test_encode_non_ascii_label() {
        assert_eq!(encode_event(&SemanticEvent::KeyDown('é')), "KDé".as_bytes());
    }

    #[test]
    fn test_decode_delta_without_fraction() {
        assert_eq!(decode_event(b"12"), Ok(SemanticEvent::Delta(12.0)));
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert_eq!(decode_event(b""), Err(ProtocolError::Empty));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert_eq!(decode_event(&[0x4B, 0x44, 0xFF]), Err(ProtocolError::InvalidUtf8));
    }

    #[test]
    fn test_decode_rejects_missing_label() {
        assert_eq!(
            decode_event(b"KD"),
            Err(ProtocolError::InvalidLabel(String::new()))
        );
    }

    #[test]
    fn test_decode_rejects_multi_char_label() {
        assert_eq!(
            decode_event(b"KUab"),
            Err(ProtocolError::InvalidLabel("ab".to_string()))
        );
    }

    #[test]
    fn test_decode_rejects_garbage_number() {
        assert!(matches!(decode_event(b"abc"), Err(ProtocolError::InvalidNumber(_))));
        assert!(matches!(decode_event(b"A"), Err(ProtocolError::InvalidNumber(_))));
    }

    #[test]
    fn test_decode_rejects_non_finite() {
        assert!(matches!(decode_event(b"inf"), Err(ProtocolError::InvalidNumber(_))));
        assert!(matches!(decode_event(b"NaN"), Err(ProtocolError::InvalidNumber(_))));
    }

    #[test]
    fn test_decode_rejects_ratio_out_of_range() {
        assert_eq!(decode_event(b"A1.5"), Err(ProtocolError::RatioOutOfRange(1.5)));
        assert_eq!(decode_event(b"A-0.25"), Err(ProtocolError::RatioOutOfRange(-0.25)));
    }

    #[test]
    fn test_encoded_length_within_limit() {
        use crate::protocol::messages::MAX_DATAGRAM_LEN;
        for event in [
            SemanticEvent::Delta(f32::MIN),
            SemanticEvent::Delta(-f32::MIN_POSITIVE),
            SemanticEvent::AbsolutePosition(0.123_456_79),
            SemanticEvent::KeyDown('\u{10FFFF}'),
        ] {
            assert!(encode_event(&event).len() <= MAX_DATAGRAM_LEN);
        }
    }
}
