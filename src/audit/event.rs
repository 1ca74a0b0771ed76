use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Key/value bag carried by an event; flattened into the stored record.
pub type AuditPayload = serde_json::Map<String, Value>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    SystemStartup,
    SystemShutdown,
    SecurityFlag,
    ShutdownRequest,
    ModeChange,
}

/// Why the arbiter flagged an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagReason {
    RestrictedQuery,
    UnsafeResponse,
}

impl FlagReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RestrictedQuery => "RESTRICTED_QUERY",
            Self::UnsafeResponse => "UNSAFE_RESPONSE",
        }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub event_id: String,
    pub event_type: AuditEventType,
    #[serde(flatten)]
    pub payload: AuditPayload,
}

impl AuditEvent {
    /// Stamp a new event. The id is issued here, at write time.
    pub fn new(event_type: AuditEventType, payload: AuditPayload) -> Self {
        Self {
            timestamp: Utc::now(),
            event_id: Uuid::new_v4().to_string(),
            event_type,
            payload,
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// Build a payload from a `json!` object literal; anything else is empty.
pub fn payload(value: Value) -> AuditPayload {
    match value {
        Value::Object(map) => map,
        _ => AuditPayload::new(),
    }
}
