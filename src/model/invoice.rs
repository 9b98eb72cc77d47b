use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A billing document issued to a tenant. Amounts are in minor units (cents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub number: String,
    pub tenant_id: String,
    /// Denormalized; goes stale if the tenant is renamed until invoices are re-fetched.
    #[serde(default)]
    pub tenant_name: String,
    pub status: InvoiceStatus,
    pub currency: String,
    pub total_cents: i64,
    #[serde(default)]
    pub paid_cents: i64,
    pub issued_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl Invoice {
    pub fn outstanding_cents(&self) -> i64 {
        match self.status {
            InvoiceStatus::Void | InvoiceStatus::Draft => 0,
            _ => (self.total_cents - self.paid_cents).max(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    PartiallyPaid,
    Paid,
    Overdue,
    Void,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCreate {
    pub tenant_id: String,
    pub currency: String,
    pub total_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// A payment recorded against an invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    pub amount_cents: i64,
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Card,
    DirectDebit,
    Other,
}
