//! # Resource Actor
//!
//! This module defines the `ResourceActor`, the runtime half of one synchronized resource.
//! It owns the receiving ends of the command lanes and runs one effect-worker loop per
//! command kind.
//!
//! # Architecture Note
//! The actor is split like a classic actor: [`ResourceActor::new`] returns the server
//! (this struct) and the interface ([`ResourceClient`]). Dependencies are injected later
//! through [`SyncContext`] when the actor is run, so resources can be wired after they
//! are created.
//!
//! **Concurrency Model**:
//! Unlike a sequential actor, each lane loop spawns every job into its own task. State
//! is never touched concurrently: all mutations go through the store's `watch` channel,
//! one transition at a time. What runs concurrently are the backend calls.
//!
//! - `list` lane: take-latest. Every list runs, only the newest token is applied.
//! - `create`, `update`, `delete`, action lanes: take-every.
//!
//! A slow lane never delays another one: a hung `list` does not hold up a `delete`.
//!
//! # Usage Pattern
//!
//! ```rust
//! use resource_sync::{
//!     ActionOutcome, ListQuery, NoAction, Page, ResourceActor, ResourceBackend,
//!     ResourceSettings, SyncContext, SyncEntity, TransportError,
//! };
//! use async_trait::async_trait;
//! use serde::Serialize;
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, Serialize)]
//! struct Tag { id: u32, name: String }
//!
//! impl SyncEntity for Tag {
//!     type Id = u32;
//!     type Create = String;
//!     type Update = String;
//!     type Action = NoAction;
//!     type ActionResult = ();
//!     const LABEL: &'static str = "Tag";
//!     fn id(&self) -> u32 { self.id }
//! }
//!
//! struct Fixed;
//!
//! #[async_trait]
//! impl ResourceBackend<Tag> for Fixed {
//!     async fn list(&self, _: ListQuery) -> Result<Page<Tag>, TransportError> {
//!         Ok(Page::complete(vec![Tag { id: 1, name: "urgent".into() }]))
//!     }
//!     async fn create(&self, name: String) -> Result<Tag, TransportError> { Ok(Tag { id: 2, name }) }
//!     async fn update(&self, id: u32, name: String) -> Result<Tag, TransportError> { Ok(Tag { id, name }) }
//!     async fn delete(&self, _: u32) -> Result<(), TransportError> { Ok(()) }
//!     async fn perform(&self, action: NoAction) -> Result<ActionOutcome<Tag>, TransportError> { match action {} }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // 1. Create
//!     let (actor, client) = ResourceActor::<Tag>::new(ResourceSettings::default());
//!
//!     // 2. Wire & Run
//!     tokio::spawn(actor.run(SyncContext::new(Arc::new(Fixed))));
//!
//!     // 3. Use
//!     client.refresh();
//!     let state = client.settled().await;
//!     assert_eq!(state.items().len(), 1);
//! }
//! ```

use crate::backend::{DiscardSink, DownloadSink, ResourceBackend};
use crate::client::ResourceClient;
use crate::entity::SyncEntity;
use crate::message::{Job, LaneReceivers, Lanes};
use crate::notify::{NoopNotifier, Notifier};
use crate::store::ResourceStore;
use crate::worker::EffectWorker;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Per-resource knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSettings {
    /// Initial page size for `list`.
    pub page_size: u32,
    /// Put an optimistically removed item back when its `delete` fails.
    pub restore_failed_deletes: bool,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            page_size: 20,
            restore_failed_deletes: false,
        }
    }
}

/// Dependencies injected into a running resource.
pub struct SyncContext<T: SyncEntity> {
    pub backend: Arc<dyn ResourceBackend<T>>,
    pub notifier: Arc<dyn Notifier>,
    pub downloads: Arc<dyn DownloadSink>,
}

impl<T: SyncEntity> SyncContext<T> {
    /// Context with no notifications and discarded downloads.
    pub fn new(backend: Arc<dyn ResourceBackend<T>>) -> Self {
        Self {
            backend,
            notifier: Arc::new(NoopNotifier),
            downloads: Arc::new(DiscardSink),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_downloads(mut self, downloads: Arc<dyn DownloadSink>) -> Self {
        self.downloads = downloads;
        self
    }
}

impl<T: SyncEntity> Clone for SyncContext<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            notifier: self.notifier.clone(),
            downloads: self.downloads.clone(),
        }
    }
}

/// The runtime half of a synchronized resource.
pub struct ResourceActor<T: SyncEntity> {
    receivers: LaneReceivers<T>,
    store: ResourceStore<T>,
    settings: ResourceSettings,
}

impl<T: SyncEntity> ResourceActor<T> {
    /// Creates the actor and its client.
    ///
    /// The lanes are unbounded: dispatch is synchronous and must never wait for a worker.
    pub fn new(settings: ResourceSettings) -> (Self, ResourceClient<T>) {
        let store = ResourceStore::new(settings.page_size);
        let (lanes, receivers) = Lanes::open();
        let actor = Self {
            receivers,
            store: store.clone(),
            settings,
        };
        (actor, ResourceClient::new(store, lanes))
    }

    /// Runs every lane until all clients are dropped and in-flight jobs have settled.
    pub async fn run(self, context: SyncContext<T>) {
        let resource = T::LABEL;
        info!(resource, lanes = self.receivers.len(), "Resource started");

        let worker = EffectWorker::new(self.store.clone(), context, self.settings);
        let mut lanes = JoinSet::new();
        for (lane, receiver) in self.receivers {
            lanes.spawn(drive(lane, receiver, worker.clone()));
        }

        while let Some(joined) = lanes.join_next().await {
            if let Err(e) = joined {
                error!(resource, error = %e, "Lane loop failed");
            }
        }

        let items = self.store.read(|state| state.items().len());
        info!(resource, items, "Shutdown");
    }
}

/// One lane: receive jobs, run each in its own task, drain on close.
async fn drive<T: SyncEntity>(
    lane: &'static str,
    mut receiver: mpsc::UnboundedReceiver<Job<T>>,
    worker: EffectWorker<T>,
) {
    let resource = T::LABEL;
    let mut in_flight = JoinSet::new();

    while let Some(job) = receiver.recv().await {
        let worker = worker.clone();
        in_flight.spawn(async move { worker.execute(job).await });

        // Reap whatever already finished so the set does not grow unbounded.
        while let Some(joined) = in_flight.try_join_next() {
            if let Err(e) = joined {
                error!(resource, lane, error = %e, "Job task failed");
            }
        }
    }

    debug!(resource, lane, in_flight = in_flight.len(), "Lane closed, draining");
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!(resource, lane, error = %e, "Job task failed");
        }
    }
}
