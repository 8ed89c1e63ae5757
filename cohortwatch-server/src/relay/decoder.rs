//! Message decoding.
//!
//! A message is accepted when its payload is a JSON object. Anything else is
//! a discardable decode error: the caller logs it, counts it and moves on to
//! the next message. Payload contents are not validated further.

use serde_json::Value;

/// A successfully decoded event payload.
pub type DecodedEvent = serde_json::Map<String, Value>;

/// Why a payload was discarded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not valid JSON.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload is valid JSON but not an object.
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Decode one raw message payload.
pub fn decode(payload: &[u8]) -> Result<DecodedEvent, DecodeError> {
    match serde_json::from_slice::<Value>(payload)? {
        Value::Object(map) => Ok(map),
        other => Err(DecodeError::NotAnObject(kind(&other))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
