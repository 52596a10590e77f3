use serde::{Deserialize, Serialize};
use std::fmt;

use super::RecordId;

/// Lifecycle status of a support ticket. Set server-side only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Claimed,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Claimed => "claimed",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A support conversation thread (row of `GET /api/guilds/{g}/tickets`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: RecordId,
    pub user_id: RecordId,
    pub thread_id: RecordId,
    pub status: TicketStatus,
    #[serde(default)]
    pub claimed_by: Option<RecordId>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
}

/// Operator actions accepted by `POST /tickets/action`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketAction {
    Close,
    Claim,
    Release,
    AddUser,
}

impl TicketAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Claim => "claim",
            Self::Release => "release",
            Self::AddUser => "add_user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "close" => Some(Self::Close),
            "claim" => Some(Self::Claim),
            "release" => Some(Self::Release),
            "add_user" => Some(Self::AddUser),
            _ => None,
        }
    }
}
