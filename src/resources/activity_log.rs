use super::{export_call, ExportFilters};
use crate::model::{ActivityLogEntry, AuditLogEntry};
use crate::transport::{ActionCall, Expect, RestResource};
use resource_sync::{EntityAction, ReadOnly, SyncEntity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityLogAction {
    /// Re-run a failed job (typically invoice generation).
    Retry(String),
    /// Everything matching the given filters, as CSV.
    ExportCsv(ExportFilters),
    /// Fetch the audit trail of the entry's subject.
    Audit(String),
}

impl EntityAction for ActivityLogAction {
    fn name(&self) -> &'static str {
        match self {
            ActivityLogAction::Retry(_) => "retry",
            ActivityLogAction::ExportCsv(_) => "export",
            ActivityLogAction::Audit(_) => "audit",
        }
    }

    fn target(&self) -> Option<String> {
        match self {
            ActivityLogAction::Retry(id) | ActivityLogAction::Audit(id) => Some(id.clone()),
            ActivityLogAction::ExportCsv(_) => None,
        }
    }

    fn success_message(&self) -> Option<String> {
        match self {
            ActivityLogAction::Retry(_) => Some("Retry queued".to_string()),
            ActivityLogAction::ExportCsv(_) => Some("Activity export downloaded".to_string()),
            ActivityLogAction::Audit(_) => None,
        }
    }
}

/// The activity log is written by the platform; the console can only read and retry.
impl SyncEntity for ActivityLogEntry {
    type Id = String;
    type Create = ReadOnly;
    type Update = ReadOnly;
    type Action = ActivityLogAction;
    type ActionResult = Vec<AuditLogEntry>;

    const LABEL: &'static str = "Activity";

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl RestResource for ActivityLogEntry {
    const PATH: &'static str = "activity-logs";
    const COLLECTION_KEY: &'static str = "logs";

    fn action_call(action: ActivityLogAction) -> Result<ActionCall<Self>, serde_json::Error> {
        let call = match action {
            ActivityLogAction::Retry(id) => ActionCall::post(&[id.as_str(), "retry"], Expect::Item),
            ActivityLogAction::ExportCsv(filters) => return export_call("activity", &filters),
            ActivityLogAction::Audit(id) => ActionCall::get(&[id.as_str(), "audit"], Expect::Result),
        };
        Ok(call)
    }
}
