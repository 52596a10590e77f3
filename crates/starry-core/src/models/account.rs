use serde::{Deserialize, Serialize};

use super::RecordId;

/// The authenticated operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountUser {
    pub id: RecordId,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A managed community the operator may administer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guild {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// `GET /api/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub user: AccountUser,
    #[serde(default)]
    pub guilds: Vec<Guild>,
}
