use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One platform event: a document generated, an invoice issued, a login, …
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub actor: String,
    pub event: String,
    pub status: ActivityStatus,
    #[serde(default)]
    pub message: String,
    /// Entity the event refers to, used to look up its audit trail.
    #[serde(default)]
    pub subject_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityLogEntry {
    /// Only failed entries can be retried.
    pub fn is_retryable(&self) -> bool {
        self.status == ActivityStatus::Failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Success,
    Failed,
    Pending,
}
