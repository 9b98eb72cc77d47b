//! # SyncEntity Trait
//!
//! The `SyncEntity` trait is the contract every resource (Tenant, Invoice, ComplianceRule, …)
//! implements so the generic engine can keep a synchronized copy of it. It names the
//! identifier and DTO types, the resource-specific action enum, and two optional hooks
//! that enable optimistic updates.
//!
//! # Architecture Note
//! The per-resource code in the console is only *configuration*: a struct, its DTOs and an
//! action enum. The dispatch/worker/reconcile logic is written once against this trait.
//!
//! # Provided Methods (Hooks)
//! - [`SyncEntity::provisional`]: build a placeholder shown while a `create` is in flight.
//! - [`SyncEntity::apply_update`]: apply an update locally while it is in flight.
//!
//! Both default to `None`, which means "wait for the server".

use serde::Serialize;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource must implement to be managed by a
/// [`ResourceActor`](crate::ResourceActor).
///
/// Associated types keep commands type-safe: a tenant `create` needs a `TenantCreate`
/// payload and the compiler refuses an `InvoiceCreate`.
pub trait SyncEntity: Clone + Debug + Serialize + Send + Sync + 'static {
    /// Server-assigned identifier.
    type Id: Clone + Eq + Ord + Hash + Display + Debug + Serialize + Send + Sync + 'static;

    /// Payload for `create`.
    type Create: Debug + Send + Sync + 'static;

    /// Payload for `update`.
    type Update: Debug + Send + Sync + 'static;

    /// Resource-specific commands beyond CRUD (preview, export, retry, …).
    type Action: EntityAction;

    /// Value produced by actions that compute something (e.g. a rendered preview).
    type ActionResult: Clone + Debug + Serialize + Send + Sync + 'static;

    /// Human-readable singular name used in logs and notifications.
    const LABEL: &'static str;

    fn id(&self) -> Self::Id;

    /// Placeholder inserted at the top of the list while a `create` is in flight.
    ///
    /// `temp_id` is unique per dispatch; the returned entity must carry an id derived
    /// from it so it never collides with a server id.
    fn provisional(_temp_id: &str, _params: &Self::Create) -> Option<Self> {
        None
    }

    /// Local preview of an update, shown until the server confirms or rejects it.
    fn apply_update(&self, _update: &Self::Update) -> Option<Self> {
        None
    }
}

/// A resource-specific command.
pub trait EntityAction: Debug + Send + Sync + 'static {
    /// Stable name used for the pending key and error slot (e.g. `"preview"`).
    fn name(&self) -> &'static str;

    /// Item the action targets, if any. Becomes part of the pending key (`retry:12`).
    fn target(&self) -> Option<String> {
        None
    }

    /// Toast shown on success. Defaults to `"<Label> <name> completed"`.
    fn success_message(&self) -> Option<String> {
        None
    }
}

/// Action type for resources that only support CRUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoAction {}

impl EntityAction for NoAction {
    fn name(&self) -> &'static str {
        match *self {}
    }
}

/// Payload type for commands a resource does not accept (e.g. `create` on an audit trail).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ReadOnly {}
