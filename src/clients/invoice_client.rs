use super::{act_and_settle, create_and_settle, update_and_settle};
use crate::error::ConsoleError;
use crate::model::{Invoice, InvoiceCreate, InvoiceUpdate, PaymentInput};
use crate::resources::InvoiceAction;
use async_trait::async_trait;
use resource_sync::{ResourceClient, SyncClient};
use tracing::{debug, instrument};

/// Client for billing.
#[derive(Clone)]
pub struct InvoiceClient {
    inner: ResourceClient<Invoice>,
}

impl InvoiceClient {
    pub fn new(inner: ResourceClient<Invoice>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SyncClient<Invoice> for InvoiceClient {
    type Error = ConsoleError;

    fn inner(&self) -> &ResourceClient<Invoice> {
        &self.inner
    }
}

impl InvoiceClient {
    #[instrument(skip(self, invoice), fields(tenant = %invoice.tenant_id))]
    pub async fn issue(&self, invoice: InvoiceCreate) -> Result<(), ConsoleError> {
        debug!("Sending request");
        create_and_settle(&self.inner, invoice).await
    }

    #[instrument(skip(self, update))]
    pub async fn edit(&self, id: String, update: InvoiceUpdate) -> Result<(), ConsoleError> {
        debug!("Sending request");
        update_and_settle(&self.inner, id, update).await
    }

    #[instrument(skip(self, payment), fields(amount = payment.amount_cents))]
    pub async fn record_payment(&self, id: String, payment: PaymentInput) -> Result<(), ConsoleError> {
        debug!("Sending request");
        act_and_settle(&self.inner, InvoiceAction::RecordPayment { id, payment }).await
    }

    #[instrument(skip(self))]
    pub async fn download_pdf(&self, id: String) -> Result<(), ConsoleError> {
        debug!("Sending request");
        act_and_settle(&self.inner, InvoiceAction::DownloadPdf(id)).await
    }

    #[instrument(skip(self))]
    pub async fn download_receipt(&self, id: String) -> Result<(), ConsoleError> {
        debug!("Sending request");
        act_and_settle(&self.inner, InvoiceAction::DownloadReceipt(id)).await
    }

    /// Exports whatever the current filters select.
    #[instrument(skip(self))]
    pub async fn export_csv(&self) -> Result<(), ConsoleError> {
        let filters = self.inner.read(|state| state.filters().clone());
        debug!(filters = filters.len(), "Sending request");
        act_and_settle(&self.inner, InvoiceAction::ExportCsv(filters)).await
    }
}
