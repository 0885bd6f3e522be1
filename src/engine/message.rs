use chrono::Utc;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Upper bound on an encoded structured payload. Pass-through payloads
/// (bytes/text/numbers) are the caller's responsibility.
pub const MAX_PAYLOAD_BYTES: usize = 1 << 20; // 1 MiB

/// Field injected into structured payloads when `with_datetime` is set.
pub const DATETIME_FIELD: &str = "_datetime";

/// Accepted publish payloads.
///
/// Structured maps are JSON-encoded before transmission; everything else
/// passes through unchanged (bytes) or stringified (text/numbers).
/// Booleans are deliberately not representable here; the
/// [`TryFrom<Value>`] entry point rejects them.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Map(serde_json::Map<String, Value>),
    Bytes(Vec<u8>),
    Text(String),
    Int(i64),
    Float(f64),
}

impl Message {
    pub fn type_name(&self) -> &'static str {
        match self {
            Message::Map(_) => "map",
            Message::Bytes(_) => "bytes",
            Message::Text(_) => "string",
            Message::Int(_) => "int",
            Message::Float(_) => "float",
        }
    }

    /// Encode for the wire. Only maps go through the serializer (and the
    /// size bound); `with_datetime` stamps the encoded form without
    /// touching the original map.
    pub fn encode(&self, with_datetime: bool) -> AppResult<Vec<u8>> {
        match self {
            Message::Map(map) => {
                let text = if with_datetime {
                    let mut stamped = map.clone();
                    stamped.insert(
                        DATETIME_FIELD.to_string(),
                        Value::String(Utc::now().to_rfc3339()),
                    );
                    serde_json::to_string(&stamped)?
                } else {
                    serde_json::to_string(map)?
                };

                if text.len() > MAX_PAYLOAD_BYTES {
                    return Err(AppError::PayloadTooLarge {
                        got: text.len(),
                        limit: MAX_PAYLOAD_BYTES,
                    });
                }

                Ok(text.into_bytes())
            }
            Message::Bytes(b) => Ok(b.clone()),
            Message::Text(s) => Ok(s.clone().into_bytes()),
            Message::Int(i) => Ok(i.to_string().into_bytes()),
            Message::Float(f) => Ok(f.to_string().into_bytes()),
        }
    }
}

impl From<serde_json::Map<String, Value>> for Message {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Message::Map(map)
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message::Text(s.to_string())
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message::Text(s)
    }
}

impl From<Vec<u8>> for Message {
    fn from(b: Vec<u8>) -> Self {
        Message::Bytes(b)
    }
}

impl From<&[u8]> for Message {
    fn from(b: &[u8]) -> Self {
        Message::Bytes(b.to_vec())
    }
}

impl From<i64> for Message {
    fn from(i: i64) -> Self {
        Message::Int(i)
    }
}

impl From<f64> for Message {
    fn from(f: f64) -> Self {
        Message::Float(f)
    }
}

/// Runtime entry point for dynamically-typed payloads. This is where
/// booleans (and nulls/arrays) get rejected, even though a boolean would
/// fit in an integer.
impl TryFrom<Value> for Message {
    type Error = AppError;

    fn try_from(value: Value) -> AppResult<Self> {
        match value {
            Value::Object(map) => Ok(Message::Map(map)),
            Value::String(s) => Ok(Message::Text(s)),
            Value::Bool(_) => Err(invalid_type("bool")),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Message::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Message::Float(f))
                } else {
                    Err(invalid_type("number"))
                }
            }
            Value::Null => Err(invalid_type("null")),
            Value::Array(_) => Err(invalid_type("array")),
        }
    }
}

fn invalid_type(name: &str) -> AppError {
    AppError::Validation(format!(
        "Invalid type of input: '{name}'. Only a map, bytes, string, int or float accepted."
    ))
}

/// Channel topic suffix. Raw bytes are decoded as UTF-8 when the channel
/// name is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Text(String),
    Bytes(Vec<u8>),
}

impl Label {
    pub fn into_text(self) -> AppResult<String> {
        match self {
            Label::Text(s) => Ok(s),
            Label::Bytes(b) => String::from_utf8(b)
                .map_err(|e| AppError::Validation(format!("label is not valid UTF-8: {e}"))),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Text(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Text(s)
    }
}

impl From<&[u8]> for Label {
    fn from(b: &[u8]) -> Self {
        Label::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Label {
    fn from(b: Vec<u8>) -> Self {
        Label::Bytes(b)
    }
}

/// `group` without a label, `group:label` with one. Derived per call,
/// never stored.
pub fn derive_channel(group: &str, label: Option<Label>) -> AppResult<String> {
    match label {
        None => Ok(group.to_string()),
        Some(label) => Ok(format!("{group}:{}", label.into_text()?)),
    }
}
