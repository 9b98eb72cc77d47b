//! # Resource Sync
//!
//! This crate is the engine behind every table in the compliance console. It keeps an
//! in-memory copy of one remote collection (tenants, invoices, rules, …) in sync with a
//! REST backend while the user reads, filters, pages and mutates it.
//!
//! ## What one resource does
//!
//! For each command a view dispatches, the engine:
//!
//! 1. marks it in flight in the store *before* any I/O (so buttons disable at once),
//! 2. merges paging/filter state for `list`, or applies an optimistic change,
//! 3. hands it to the effect worker for its command kind,
//! 4. performs the remote call,
//! 5. applies the result, or a normalized error, to the store,
//! 6. emits a one-line notification.
//!
//! ## Architecture Overview
//!
//! The engine separates concerns into three layers:
//!
//! 1. **Entity Layer** ([`SyncEntity`]) - What a resource looks like: id, DTOs, actions
//! 2. **Runtime Layer** ([`ResourceActor`]) - One worker loop per command kind
//! 3. **Interface Layer** ([`ResourceClient`]) - Dispatch and observation
//!
//! Per-resource code is written **once** as a `SyncEntity` impl plus a [`ResourceBackend`];
//! the dispatch, scheduling, reconciliation and error handling live here.
//!
//! ## Data Flow
//!
//! ```text
//! view ──dispatch──▶ ResourceState::begin ──Job──▶ lane ──▶ EffectWorker
//!   ▲                (pending, optimistic)                     │
//!   │                                                   ResourceBackend
//!   │                                                          │
//!   └──watch── ResourceStore ◀── settle / apply_list ◀── normalize (on failure)
//!                                        │
//!                                     Notifier
//! ```
//!
//! ## Scheduling
//!
//! | Kind | Policy | Meaning |
//! |------|--------|---------|
//! | `list` | take-latest | Results of superseded lists are discarded, by token |
//! | `create`, `update`, `delete`, actions | take-every | Every command runs and is applied |
//!
//! Lanes never block each other, and within a lane every job runs in its own task.
//!
//! ## Guarantees
//!
//! - A pending key is released exactly once per command, success or failure, and a
//!   submitted command's [`Receipt`] resolves with that command's own outcome.
//! - A `list` result is applied only if no newer `list` was dispatched since.
//! - A failed optimistic `create`/`update` leaves the list as it was before dispatch.
//! - [`normalize`] is total: every failure becomes a populated [`NormalizedError`].
//! - Dispatching after the workers are gone records an error instead of panicking.
//!
//! ## Testing
//!
//! The [`mock`] module provides a channel-driven [`mock::MockBackend`] (answer calls in any
//! order from the test), a queue-driven [`mock::ScriptedBackend`] with `verify()`, and
//! recording notifier/download doubles.

pub mod actor;
pub mod backend;
pub mod client;
pub mod client_trait;
pub mod command;
pub mod diff;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod notify;
pub mod state;
pub mod store;
mod worker;

// Re-export core types for convenience
pub use actor::{ResourceActor, ResourceSettings, SyncContext};
pub use backend::{ActionOutcome, DiscardSink, Download, DownloadSink, Page, PageMeta, ResourceBackend};
pub use client::{Completion, Receipt, ResourceClient};
pub use client_trait::SyncClient;
pub use command::{
    Command, CommandKind, FilterValue, ListQuery, ListRequest, PendingKey, SchedulePolicy, Sort,
    SortDirection,
};
pub use diff::{diff, ChangeType, FieldChange};
pub use entity::{EntityAction, NoAction, ReadOnly, SyncEntity};
pub use error::{normalize, ErrorKind, FrameworkError, NormalizedError, ResponseBody, TransportError};
pub use notify::{
    install_global_sink, BroadcastNotifier, GlobalNotifier, NoopNotifier, Notification,
    NotificationKind, Notifier,
};
pub use state::{Pagination, ResourceState, Resolution};
pub use store::ResourceStore;
