use super::{export_call, ExportFilters};
use crate::model::{Invoice, InvoiceCreate, InvoiceUpdate, PaymentInput};
use crate::transport::{ActionCall, Expect, RestResource};
use resource_sync::{EntityAction, SyncEntity};

#[derive(Debug, Clone, PartialEq)]
pub enum InvoiceAction {
    RecordPayment { id: String, payment: PaymentInput },
    DownloadPdf(String),
    DownloadReceipt(String),
    /// Everything matching the given filters, as CSV.
    ExportCsv(ExportFilters),
}

impl EntityAction for InvoiceAction {
    fn name(&self) -> &'static str {
        match self {
            InvoiceAction::RecordPayment { .. } => "record_payment",
            InvoiceAction::DownloadPdf(_) => "download_pdf",
            InvoiceAction::DownloadReceipt(_) => "download_receipt",
            InvoiceAction::ExportCsv(_) => "export",
        }
    }

    fn target(&self) -> Option<String> {
        match self {
            InvoiceAction::RecordPayment { id, .. }
            | InvoiceAction::DownloadPdf(id)
            | InvoiceAction::DownloadReceipt(id) => Some(id.clone()),
            InvoiceAction::ExportCsv(_) => None,
        }
    }

    fn success_message(&self) -> Option<String> {
        let message = match self {
            InvoiceAction::RecordPayment { .. } => "Payment recorded",
            InvoiceAction::DownloadPdf(_) => "Invoice PDF downloaded",
            InvoiceAction::DownloadReceipt(_) => "Receipt downloaded",
            InvoiceAction::ExportCsv(_) => "Invoice export downloaded",
        };
        Some(message.to_string())
    }
}

/// Invoice numbers are assigned by the server, so creates wait for it.
impl SyncEntity for Invoice {
    type Id = String;
    type Create = InvoiceCreate;
    type Update = InvoiceUpdate;
    type Action = InvoiceAction;
    type ActionResult = ();

    const LABEL: &'static str = "Invoice";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn apply_update(&self, update: &InvoiceUpdate) -> Option<Self> {
        let mut next = self.clone();
        if let Some(status) = update.status {
            next.status = status;
        }
        if update.due_date.is_some() {
            next.due_date = update.due_date;
        }
        Some(next)
    }
}

impl RestResource for Invoice {
    const PATH: &'static str = "invoices";
    const COLLECTION_KEY: &'static str = "invoices";

    fn action_call(action: InvoiceAction) -> Result<ActionCall<Self>, serde_json::Error> {
        let call = match action {
            InvoiceAction::RecordPayment { id, payment } => {
                return ActionCall::post(&[id.as_str(), "payments"], Expect::Item)
                    .with_body(&payment);
            }
            InvoiceAction::DownloadPdf(id) => ActionCall::get(
                &[id.as_str(), "pdf"],
                Expect::File {
                    file_stem: format!("invoice-{id}"),
                },
            ),
            InvoiceAction::DownloadReceipt(id) => ActionCall::get(
                &[id.as_str(), "receipt"],
                Expect::File {
                    file_stem: format!("receipt-{id}"),
                },
            ),
            InvoiceAction::ExportCsv(filters) => return export_call("invoices", &filters),
        };
        Ok(call)
    }
}
