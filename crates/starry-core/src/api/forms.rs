//! Operator forms posted to guild-scoped routes.
//!
//! Every form is a flat set of string inputs exactly as typed; they are
//! trimmed when the request body is built. Numeric parsing is the backend's job.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConsoleError;
use crate::models::TicketAction;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketActionForm {
    pub thread_id: String,
    pub actor_id: String,
    pub user_id: String,
    pub action: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageForm {
    pub channel_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedForm {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub color: String,
    pub footer: String,
    pub thumbnail: String,
    pub image: String,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeoutForm {
    pub user_id: String,
    pub moderator_id: String,
    pub minutes: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KickForm {
    pub user_id: String,
    pub moderator_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BanForm {
    pub user_id: String,
    pub moderator_id: String,
    pub delete_days: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurgeForm {
    pub channel_id: String,
    pub moderator_id: String,
    pub amount: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleForm {
    pub user_id: String,
    pub role_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuildForm {
    TicketAction(TicketActionForm),
    Message(MessageForm),
    Embed(EmbedForm),
    Timeout(TimeoutForm),
    Kick(KickForm),
    Ban(BanForm),
    Purge(PurgeForm),
    RoleAdd(RoleForm),
    RoleRemove(RoleForm),
}

impl GuildForm {
    /// Route below `/api/guilds/{g}/`
    pub fn route(&self) -> &'static str {
        match self {
            Self::TicketAction(_) => "tickets/action",
            Self::Message(_) => "discord/message",
            Self::Embed(_) => "discord/embed",
            Self::Timeout(_) => "moderation/timeout",
            Self::Kick(_) => "moderation/kick",
            Self::Ban(_) => "moderation/ban",
            Self::Purge(_) => "moderation/purge",
            Self::RoleAdd(_) => "roles/add",
            Self::RoleRemove(_) => "roles/remove",
        }
    }

    /// Trimmed request body
    pub fn body(&self) -> Result<Value, ConsoleError> {
        let mut body = match self {
            Self::TicketAction(form) => {
                if TicketAction::parse(&form.action).is_none() {
                    return Err(ConsoleError::validation(format!(
                        "unknown ticket action '{}'",
                        form.action.trim()
                    )));
                }
                serde_json::to_value(form)
            }
            Self::Message(form) => serde_json::to_value(form),
            Self::Embed(form) => serde_json::to_value(form),
            Self::Timeout(form) => serde_json::to_value(form),
            Self::Kick(form) => serde_json::to_value(form),
            Self::Ban(form) => serde_json::to_value(form),
            Self::Purge(form) => serde_json::to_value(form),
            Self::RoleAdd(form) | Self::RoleRemove(form) => serde_json::to_value(form),
        }
        .map_err(ConsoleError::decode)?;
        trim_strings(&mut body);
        Ok(body)
    }

    /// Operator notice after the backend accepted the form
    pub fn success_message(&self, response: Option<&Value>) -> String {
        match self {
            Self::TicketAction(_) => "Ticket action executed".to_string(),
            Self::Message(_) => "Message sent".to_string(),
            Self::Embed(_) => "Embed sent".to_string(),
            Self::Timeout(_) => "Timeout set".to_string(),
            Self::Kick(_) => "User kicked".to_string(),
            Self::Ban(_) => "User banned".to_string(),
            Self::Purge(_) => {
                let deleted = response
                    .and_then(|r| r.get("deleted"))
                    .map(|d| match d {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| "0".to_string());
                format!("Purge: {}", deleted)
            }
            Self::RoleAdd(_) => "Role added".to_string(),
            Self::RoleRemove(_) => "Role removed".to_string(),
        }
    }

    /// Whether a successful submit changes the ticket list
    pub fn changes_tickets(&self) -> bool {
        matches!(self, Self::TicketAction(_))
    }
}

/// Parse embed fields from `name|value|inline` lines. Lines without a name
/// or value are skipped; `inline` is true only for a literal `true`.
pub fn parse_embed_fields(raw: &str) -> Vec<EmbedField> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut parts = line.split('|');
            let name = parts.next().unwrap_or("").trim();
            let value = parts.next().unwrap_or("").trim();
            let inline = parts
                .next()
                .map(|p| p.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false);
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some(EmbedField {
                name: name.to_string(),
                value: value.to_string(),
                inline,
            })
        })
        .collect()
}

fn trim_strings(value: &mut Value) {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(trim_strings),
        Value::Object(map) => map.values_mut().for_each(trim_strings),
        _ => {}
    }
}
