use chrono::{DateTime, Utc};
use resource_sync::{diff, FieldChange};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An immutable record of one change to an audited entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub action: AuditAction,
    pub subject_id: String,
    /// State of the subject at the time of the event, when the server kept one.
    #[serde(default)]
    pub subject_snapshot: Option<Value>,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    #[serde(default)]
    pub old_values: Option<Map<String, Value>>,
    #[serde(default)]
    pub new_values: Option<Map<String, Value>>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Viewed,
}

impl AuditLogEntry {
    /// Field-level changes, computed on demand.
    pub fn changes(&self) -> Vec<FieldChange> {
        diff(self.old_values.as_ref(), self.new_values.as_ref())
    }
}
