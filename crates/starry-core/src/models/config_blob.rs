use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::SNIPPETS_SETTING;
use crate::error::ConsoleError;

/// Opaque backend-owned configuration (settings overrides, applications config).
///
/// Only validated at the edge: it must be a JSON object. Key order and values
/// survive a parse/serialize round trip unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigBlob(Map<String, Value>);

impl ConfigBlob {
    /// Parse operator-entered text. Blank input means an empty object.
    pub fn parse(raw: &str) -> Result<Self, ConsoleError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ConsoleError::validation(format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ConsoleError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ConsoleError::validation(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Two-space indented rendering used in the editors
    pub fn to_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    /// Look up a dotted settings path, either nested (`{"a": {"b": ..}}`)
    /// or stored flat under the dotted key.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if let Some(flat) = self.0.get(path) {
            return Some(flat);
        }
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Canned ticket replies, in stored order
    pub fn snippets(&self) -> Vec<Snippet> {
        let Some(Value::Object(entries)) = self.lookup(SNIPPETS_SETTING) else {
            return Vec::new();
        };
        entries
            .iter()
            .map(|(name, value)| Snippet {
                name: name.clone(),
                text: match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            })
            .collect()
    }
}

/// A named canned reply template (display-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub name: String,
    pub text: String,
}

/// Reformat raw JSON text without sending it anywhere
pub fn prettify(raw: &str) -> Result<String, ConsoleError> {
    ConfigBlob::parse(raw).map(|blob| blob.to_pretty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
