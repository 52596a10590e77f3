use serde::{Deserialize, Serialize};

use super::RecordId;

/// A member the backend currently considers active. Always re-fetched wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveUser {
    pub id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
    pub display_name: String,
    pub status: String,
}

/// Result row of a member search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMatch {
    pub id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
    pub display_name: String,
}

/// A stored birthday (global birthdays list)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Birthday {
    pub user_id: RecordId,
    pub day: u8,
    pub month: u8,
    #[serde(default)]
    pub year: Option<u16>,
}

impl Birthday {
    /// `day.month.year`, the format the dashboard shows
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{}.{}.{}", self.day, self.month, year),
            None => format!("{}.{}.", self.day, self.month),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct BirthdayPage {
    #[serde(default)]
    pub items: Vec<Birthday>,
}
