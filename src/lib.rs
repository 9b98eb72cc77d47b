//! # Compliance Console
//!
//! > **Admin console runtime for a multi-tenant compliance platform.**
//!
//! Operators page through tenants, invoices, compliance rules, notification templates,
//! activity logs, the document recycle bin and system settings. Every one of those tables
//! is a [`resource_sync`] resource: an in-memory store kept in sync with the REST API by a
//! resource actor, mutated optimistically where that makes sense, and reporting each
//! outcome as a one-line notification.
//!
//! ## Design Philosophy
//!
//! The engine ([`resource_sync`]) knows nothing about tenants or invoices. This crate only
//! adds *what* each resource is:
//!
//! - **Data**: the wire types in [`model`].
//! - **Binding**: a [`SyncEntity`](resource_sync::SyncEntity) and
//!   [`RestResource`](transport::RestResource) impl per type in [`resources`], including the
//!   resource's custom actions (suspend, record payment, preview, retry, restore, …).
//! - **Interface**: a typed client per resource in [`clients`].
//!
//! ## Architecture Notes
//!
//! ### 1. One boundary adapter
//! Backends disagree on envelopes (`data` vs bare arrays, `meta` vs `pagination`). All of
//! that is absorbed in [`transport::envelope`]; the engine only ever sees canonical pages.
//!
//! ### 2. Errors
//! Per-command failures never surface as Rust errors inside the engine: they become a
//! [`NormalizedError`](resource_sync::NormalizedError) in the store plus an error toast.
//! The awaitable client methods additionally return them as
//! [`ConsoleError::Command`](error::ConsoleError::Command).
//!
//! ### 3. Session
//! The bearer token comes from [`config`]. A `401` on any call flips
//! [`ConsoleSystem::session_expired`](lifecycle::ConsoleSystem::session_expired); what to do
//! about it is the embedding application's decision.
//!
//! ## Module Tour
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Environment-driven settings |
//! | [`model`] | Wire types and audit diffs |
//! | [`transport`] | `reqwest` client, envelope adapter, generic REST backend |
//! | [`resources`] | Engine bindings and action enums |
//! | [`clients`] | Typed, awaitable clients |
//! | [`downloads`] | Export directory for downloaded files |
//! | [`selectors`] | Pure view helpers (totals, grouping, busy flags) |
//! | [`lifecycle`] | [`ConsoleSystem`](lifecycle::ConsoleSystem) and tracing setup |
//!
//! ## Quick Start
//!
//! ```bash
//! CONSOLE_API_BASE_URL=https://admin.example.com/api/ \
//! CONSOLE_API_TOKEN=... \
//! RUST_LOG=info cargo run
//! ```

pub mod clients;
pub mod config;
pub mod downloads;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod resources;
pub mod selectors;
pub mod transport;

pub use config::ConsoleConfig;
pub use error::ConsoleError;
pub use lifecycle::ConsoleSystem;
