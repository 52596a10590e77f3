use serde::{Deserialize, Serialize};

/// Ticket counters inside a summary. Absent counters read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketCounts {
    #[serde(default)]
    pub open: u64,
    #[serde(default)]
    pub claimed: u64,
    #[serde(default)]
    pub closed: u64,
    #[serde(default)]
    pub total: u64,
}

/// `GET /api/guilds/{g}/summary`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildSummary {
    #[serde(default)]
    pub tickets: TicketCounts,
    #[serde(default)]
    pub giveaways: u64,
    #[serde(default)]
    pub polls: u64,
    #[serde(default)]
    pub applications: u64,
}

/// `GET /api/global/summary`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSummary {
    #[serde(default)]
    pub tickets: TicketCounts,
    #[serde(default)]
    pub giveaways: u64,
    #[serde(default)]
    pub polls: u64,
    #[serde(default)]
    pub applications: u64,
    #[serde(default)]
    pub birthdays: u64,
}
