use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Fields that may carry the reply text, in priority order
pub const RESPONSE_FIELDS: [&str; 3] = ["message", "text", "response"];

/// Final transcript sent to the assistant service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInputMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl VoiceInputMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self::at(message, chrono::Utc::now().timestamp_millis())
    }

    pub fn at(message: impl Into<String>, timestamp: i64) -> Self {
        Self {
            kind: "voice_input".to_string(),
            message: message.into(),
            timestamp,
        }
    }
}

/// Reply received from the assistant service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Payload exactly as received
    pub raw: String,
    /// Text to speak
    pub response_text: String,
}

/// Encode an outbound message for the wire.
///
/// Falls back to the bare transcript if structured encoding fails.
pub fn encode_voice_input(message: &VoiceInputMessage) -> String {
    match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to encode voice input, sending raw text: {}", e);
            message.message.clone()
        }
    }
}

/// Extract the reply text from an inbound payload.
///
/// Structured payloads yield the first truthy field of [`RESPONSE_FIELDS`],
/// otherwise the payload stringified. Unparseable payloads are used verbatim.
pub fn parse_inbound(raw: &str) -> InboundMessage {
    let response_text = match serde_json::from_str::<Value>(raw) {
        Ok(value) => response_text(&value),
        Err(_) => raw.to_string(),
    };

    InboundMessage {
        raw: raw.to_string(),
        response_text,
    }
}

fn response_text(value: &Value) -> String {
    if let Value::Object(fields) = value {
        let found = RESPONSE_FIELDS
            .iter()
            .filter_map(|field| fields.get(*field))
            .find(|candidate| is_truthy(candidate));
        if let Some(found) = found {
            return stringify(found);
        }
    }
    stringify(value)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
