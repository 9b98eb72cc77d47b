use super::{act_and_settle, compute};
use crate::error::ConsoleError;
use crate::model::{ActivityLogEntry, AuditLogEntry};
use crate::resources::ActivityLogAction;
use async_trait::async_trait;
use resource_sync::{ResourceClient, SyncClient};
use tracing::{debug, instrument};

/// Client for the platform activity log.
#[derive(Clone)]
pub struct ActivityLogClient {
    inner: ResourceClient<ActivityLogEntry>,
}

impl ActivityLogClient {
    pub fn new(inner: ResourceClient<ActivityLogEntry>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SyncClient<ActivityLogEntry> for ActivityLogClient {
    type Error = ConsoleError;

    fn inner(&self) -> &ResourceClient<ActivityLogEntry> {
        &self.inner
    }
}

impl ActivityLogClient {
    #[instrument(skip(self))]
    pub async fn retry(&self, id: String) -> Result<(), ConsoleError> {
        debug!("Sending request");
        act_and_settle(&self.inner, ActivityLogAction::Retry(id)).await
    }

    /// Exports whatever the current filters select.
    #[instrument(skip(self))]
    pub async fn export_csv(&self) -> Result<(), ConsoleError> {
        let filters = self.inner.read(|state| state.filters().clone());
        debug!(filters = filters.len(), "Sending request");
        act_and_settle(&self.inner, ActivityLogAction::ExportCsv(filters)).await
    }

    /// Audit trail for the entry's subject, oldest first as the server sends it.
    #[instrument(skip(self))]
    pub async fn audit(&self, id: String) -> Result<Vec<AuditLogEntry>, ConsoleError> {
        debug!("Sending request");
        compute(&self.inner, ActivityLogAction::Audit(id)).await
    }
}
