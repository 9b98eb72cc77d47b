use super::{act_and_settle, create_and_settle, update_and_settle};
use crate::error::ConsoleError;
use crate::model::{Tenant, TenantCreate, TenantUpdate};
use crate::resources::TenantAction;
use async_trait::async_trait;
use resource_sync::{ResourceClient, SyncClient};
use tracing::{debug, instrument};

/// Client for the tenant directory.
#[derive(Clone)]
pub struct TenantClient {
    inner: ResourceClient<Tenant>,
}

impl TenantClient {
    pub fn new(inner: ResourceClient<Tenant>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SyncClient<Tenant> for TenantClient {
    type Error = ConsoleError;

    fn inner(&self) -> &ResourceClient<Tenant> {
        &self.inner
    }
}

impl TenantClient {
    #[instrument(skip(self, tenant), fields(name = %tenant.name))]
    pub async fn onboard(&self, tenant: TenantCreate) -> Result<(), ConsoleError> {
        debug!("Sending request");
        create_and_settle(&self.inner, tenant).await
    }

    #[instrument(skip(self, update))]
    pub async fn edit(&self, id: String, update: TenantUpdate) -> Result<(), ConsoleError> {
        debug!("Sending request");
        update_and_settle(&self.inner, id, update).await
    }

    #[instrument(skip(self))]
    pub async fn suspend(&self, id: String, reason: String) -> Result<(), ConsoleError> {
        debug!("Sending request");
        act_and_settle(&self.inner, TenantAction::Suspend { id, reason }).await
    }

    #[instrument(skip(self))]
    pub async fn activate(&self, id: String) -> Result<(), ConsoleError> {
        debug!("Sending request");
        act_and_settle(&self.inner, TenantAction::Activate(id)).await
    }

    /// Exports whatever the current filters select.
    #[instrument(skip(self))]
    pub async fn export_csv(&self) -> Result<(), ConsoleError> {
        let filters = self.inner.read(|state| state.filters().clone());
        debug!(filters = filters.len(), "Sending request");
        act_and_settle(&self.inner, TenantAction::ExportCsv(filters)).await
    }
}
