//! Engine bindings for every console resource.
//!
//! Each module makes one model type a [`SyncEntity`](resource_sync::SyncEntity), defines
//! its action enum, and maps those actions onto REST calls via
//! [`RestResource`](crate::transport::RestResource).

pub mod activity_log;
pub mod compliance_rule;
pub mod deleted_document;
pub mod invoice;
pub mod notification_template;
pub mod system_setting;
pub mod tenant;

pub use activity_log::ActivityLogAction;
pub use compliance_rule::RuleAction;
pub use deleted_document::DeletedDocumentAction;
pub use invoice::InvoiceAction;
pub use notification_template::TemplateAction;
pub use tenant::TenantAction;

use crate::transport::{ActionCall, Expect, RestResource};
use resource_sync::FilterValue;
use serde_json::json;
use std::collections::BTreeMap;

/// Active list filters, sent along with an export so the file matches the table.
pub type ExportFilters = BTreeMap<String, FilterValue>;

/// `POST <resource>/export` with `{"filters": …}` as the body; the response is a file.
pub(crate) fn export_call<T: RestResource>(
    collection: &str,
    filters: &ExportFilters,
) -> Result<ActionCall<T>, serde_json::Error> {
    let file_stem = export_stem(collection);
    ActionCall::post(&["export"], Expect::File { file_stem }).with_body(&json!({ "filters": filters }))
}

/// File stem for a collection export, stamped with today's date: `tenants-20261017`.
pub(crate) fn export_stem(collection: &str) -> String {
    format!("{collection}-{}", chrono::Utc::now().format("%Y%m%d"))
}
