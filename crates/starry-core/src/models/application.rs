use serde::{Deserialize, Serialize};

use super::RecordId;

/// A membership application review thread (row of `applications/list`).
///
/// Structurally parallel to [`super::Ticket`]; the status vocabulary is owned
/// by the backend, so it stays a plain string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: RecordId,
    pub user_id: RecordId,
    pub thread_id: RecordId,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
}
