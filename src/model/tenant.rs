use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An organization using the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub plan: String,
    pub status: TenantStatus,
    pub contact_email: String,
    #[serde(default)]
    pub document_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub suspended_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Trial,
    Suspended,
    /// Not yet confirmed by the server.
    Pending,
}

/// Payload for onboarding a tenant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantCreate {
    pub name: String,
    pub plan: String,
    pub contact_email: String,
}

/// Partial update; absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

impl TenantCreate {
    pub fn new(name: impl Into<String>, plan: impl Into<String>, contact_email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plan: plan.into(),
            contact_email: contact_email.into(),
        }
    }
}
