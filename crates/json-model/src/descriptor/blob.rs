//! Byte blob decoding and encoding.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::engine::GeneralPurpose;
use base64::Engine;

use crate::attempt::try_in_order;
use crate::value::Value;

/// Alphabets tried, in order, when a blob arrives as a string.
const ALPHABETS: [&GeneralPurpose; 4] = [&URL_SAFE, &STANDARD, &URL_SAFE_NO_PAD, &STANDARD_NO_PAD];

/// Decode a byte blob from bytes, a list of integers in `0..=255`, a list
/// of hex strings, or a base64 string.
pub fn parse_bytes(raw: &Value) -> Result<Vec<u8>, String> {
    match raw {
        Value::Bytes(b) => Ok(b.clone()),
        Value::List(items) | Value::Tuple(items) if items.iter().all(|v| matches!(v, Value::Int(_))) => {
            items
                .iter()
                .map(|v| match v {
                    Value::Int(i) => u8::try_from(*i).ok(),
                    _ => None,
                })
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| {
                    "Given array of integers to parse as bytes has one or more values outside the range of 0-255"
                        .to_string()
                })
        }
        Value::List(items) | Value::Tuple(items) if items.iter().all(|v| matches!(v, Value::Str(_))) => {
            items
                .iter()
                .map(|v| match v {
                    Value::Str(s) => parse_hex_byte(s),
                    _ => None,
                })
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| {
                    "Given array of strings to parse as bytes has one or more invalid two-digit hexadecimal strings"
                        .to_string()
                })
        }
        Value::Str(s) => decode_base64(s),
        other => Err(format!(
            "Unable to parse value of type '{}' as bytes",
            other.shape_name()
        )),
    }
}

/// One or two hex digits; no sign, no whitespace.
fn parse_hex_byte(s: &str) -> Option<u8> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(s, 16).ok()
}

pub fn decode_base64(s: &str) -> Result<Vec<u8>, String> {
    try_in_order(ALPHABETS, |engine| engine.decode(s))
        .map_err(|_| "Unable to parse string to bytes; is not valid base-64".to_string())
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
