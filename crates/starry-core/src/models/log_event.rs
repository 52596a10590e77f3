use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RecordId;
use crate::error::ConsoleError;

/// A backend log entry, from `GET /api/logs` or the live push channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub event: String,
    /// Stored payload; the backend usually sends a JSON-encoded string
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl LogEvent {
    /// Parse one push-channel message
    pub fn from_push(raw: &str) -> Result<Self, ConsoleError> {
        serde_json::from_str(raw).map_err(|e| ConsoleError::Parse {
            message: e.to_string(),
        })
    }

    /// Payload as shown to the operator (strings unquoted)
    pub fn payload_text(&self) -> String {
        match &self.payload {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Whether two rows describe the same backend entry.
    /// Uses the row id when both carry one, full equality otherwise.
    pub fn same_entry(&self, other: &LogEvent) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}
