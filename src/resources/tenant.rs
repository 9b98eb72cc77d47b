use super::{export_call, ExportFilters};
use crate::model::{Tenant, TenantCreate, TenantStatus, TenantUpdate};
use crate::transport::{ActionCall, Expect, RestResource};
use chrono::Utc;
use resource_sync::{EntityAction, SyncEntity};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantAction {
    Suspend { id: String, reason: String },
    Activate(String),
    /// Everything matching the given filters, as CSV.
    ExportCsv(ExportFilters),
}

impl EntityAction for TenantAction {
    fn name(&self) -> &'static str {
        match self {
            TenantAction::Suspend { .. } => "suspend",
            TenantAction::Activate(_) => "activate",
            TenantAction::ExportCsv(_) => "export",
        }
    }

    fn target(&self) -> Option<String> {
        match self {
            TenantAction::Suspend { id, .. } | TenantAction::Activate(id) => Some(id.clone()),
            TenantAction::ExportCsv(_) => None,
        }
    }

    fn success_message(&self) -> Option<String> {
        let message = match self {
            TenantAction::Suspend { .. } => "Tenant suspended",
            TenantAction::Activate(_) => "Tenant activated",
            TenantAction::ExportCsv(_) => "Tenant export downloaded",
        };
        Some(message.to_string())
    }
}

impl SyncEntity for Tenant {
    type Id = String;
    type Create = TenantCreate;
    type Update = TenantUpdate;
    type Action = TenantAction;
    type ActionResult = ();

    const LABEL: &'static str = "Tenant";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn provisional(temp_id: &str, params: &TenantCreate) -> Option<Self> {
        Some(Tenant {
            id: temp_id.to_string(),
            name: params.name.clone(),
            plan: params.plan.clone(),
            status: TenantStatus::Pending,
            contact_email: params.contact_email.clone(),
            document_count: 0,
            created_at: Utc::now(),
            suspended_reason: None,
        })
    }

    fn apply_update(&self, update: &TenantUpdate) -> Option<Self> {
        let mut next = self.clone();
        if let Some(name) = &update.name {
            next.name = name.clone();
        }
        if let Some(plan) = &update.plan {
            next.plan = plan.clone();
        }
        if let Some(email) = &update.contact_email {
            next.contact_email = email.clone();
        }
        Some(next)
    }
}

impl RestResource for Tenant {
    const PATH: &'static str = "tenants";
    const COLLECTION_KEY: &'static str = "tenants";

    fn action_call(action: TenantAction) -> Result<ActionCall<Self>, serde_json::Error> {
        match action {
            TenantAction::Suspend { id, reason } => {
                ActionCall::post(&[id.as_str(), "suspend"], Expect::Item)
                    .with_body(&json!({ "reason": reason }))
            }
            TenantAction::Activate(id) => Ok(ActionCall::post(&[id.as_str(), "activate"], Expect::Item)),
            TenantAction::ExportCsv(filters) => export_call("tenants", &filters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use resource_sync::FilterValue;

    fn tenant() -> Tenant {
        Tenant {
            id: "t_1".into(),
            name: "Acme".into(),
            plan: "pro".into(),
            status: TenantStatus::Active,
            contact_email: "ops@acme.test".into(),
            document_count: 12,
            created_at: Utc::now(),
            suspended_reason: None,
        }
    }

    #[test]
    fn test_provisional_tenant_is_pending() {
        let params = TenantCreate::new("Globex", "starter", "it@globex.test");
        let placeholder = Tenant::provisional("tmp-1", &params).unwrap();
        assert_eq!(placeholder.id, "tmp-1");
        assert_eq!(placeholder.status, TenantStatus::Pending);
        assert_eq!(placeholder.name, "Globex");
    }

    #[test]
    fn test_apply_update_merges_present_fields() {
        let update = TenantUpdate {
            plan: Some("enterprise".into()),
            ..TenantUpdate::default()
        };
        let next = tenant().apply_update(&update).unwrap();
        assert_eq!(next.plan, "enterprise");
        assert_eq!(next.name, "Acme");
    }

    #[test]
    fn test_suspend_call() {
        let action = TenantAction::Suspend {
            id: "t_1".into(),
            reason: "unpaid".into(),
        };
        assert_eq!(action.name(), "suspend");
        assert_eq!(action.target().as_deref(), Some("t_1"));

        let call = Tenant::action_call(action).unwrap();
        assert_eq!(call.method, Method::POST);
        assert_eq!(call.segments, vec!["t_1", "suspend"]);
        assert_eq!(call.body, Some(json!({"reason": "unpaid"})));
        assert!(matches!(call.expect, Expect::Item));
    }

    #[test]
    fn test_export_downloads_csv() {
        let mut filters = ExportFilters::new();
        filters.insert("status".to_string(), FilterValue::from("suspended"));
        let call = Tenant::action_call(TenantAction::ExportCsv(filters)).unwrap();
        assert_eq!(call.method, Method::POST);
        assert_eq!(call.segments, vec!["export"]);
        assert_eq!(call.body, Some(json!({"filters": {"status": "suspended"}})));
        match call.expect {
            Expect::File { file_stem } => assert!(file_stem.starts_with("tenants-")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
