//! Pure functions over store snapshots for the views.
//!
//! Nothing here touches a client or the network; each selector takes a slice of items
//! or a [`ResourceState`] and derives something to render.

use crate::model::{Invoice, InvoiceStatus, Tenant, TenantStatus};
use resource_sync::{CommandKind, PendingKey, ResourceState, SortDirection, SyncEntity};
use serde::Serialize;
use std::collections::BTreeMap;

/// Money figures for one currency, in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub billed: i64,
    pub paid: i64,
    pub outstanding: i64,
}

/// Totals per currency. Drafts and voided invoices are not billed.
pub fn invoice_totals(invoices: &[Invoice]) -> BTreeMap<String, InvoiceTotals> {
    let mut totals: BTreeMap<String, InvoiceTotals> = BTreeMap::new();
    for invoice in invoices {
        if matches!(invoice.status, InvoiceStatus::Draft | InvoiceStatus::Void) {
            continue;
        }
        let entry = totals.entry(invoice.currency.clone()).or_default();
        entry.billed += invoice.total_cents;
        entry.paid += invoice.paid_cents;
        entry.outstanding += invoice.outstanding_cents();
    }
    totals
}

pub fn group_by<T, K: Ord>(items: &[T], key: impl Fn(&T) -> K) -> BTreeMap<K, Vec<&T>> {
    let mut groups: BTreeMap<K, Vec<&T>> = BTreeMap::new();
    for item in items {
        groups.entry(key(item)).or_default().push(item);
    }
    groups
}

pub fn invoices_by_status(invoices: &[Invoice]) -> BTreeMap<InvoiceStatus, Vec<&Invoice>> {
    group_by(invoices, |invoice| invoice.status)
}

pub fn tenants_by_status(tenants: &[Tenant]) -> BTreeMap<TenantStatus, Vec<&Tenant>> {
    group_by(tenants, |tenant| tenant.status)
}

/// Stable sort by `key`; equal keys keep their list order.
pub fn sorted_by<T, K: Ord>(items: &[T], key: impl Fn(&T) -> K, direction: SortDirection) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by(|a, b| {
        let ordering = key(a).cmp(&key(b));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

/// Whether a specific operation (e.g. `delete:7`) is in flight.
pub fn is_busy<T: SyncEntity>(state: &ResourceState<T>, key: &PendingKey) -> bool {
    state.is_pending(key)
}

/// Whether a form for `kind` can be submitted: no command of that kind is in flight.
pub fn can_submit<T: SyncEntity>(state: &ResourceState<T>, kind: CommandKind) -> bool {
    !state.is_kind_pending(kind)
}

/// Whether any command targeting the row `id` is in flight.
pub fn is_item_busy<T: SyncEntity>(state: &ResourceState<T>, id: &T::Id) -> bool {
    let id = id.to_string();
    state
        .pending_keys()
        .any(|key| key.target.as_deref() == Some(id.as_str()))
}
