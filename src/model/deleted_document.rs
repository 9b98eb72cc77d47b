use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A soft-deleted document waiting in the recycle bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedDocument {
    pub id: String,
    pub tenant_id: String,
    pub title: String,
    pub document_type: String,
    pub deleted_by: String,
    pub deleted_at: DateTime<Utc>,
    /// When the platform purges it for good.
    #[serde(default)]
    pub purge_after: Option<DateTime<Utc>>,
}
