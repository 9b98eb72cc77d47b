//! # Resource Client
//!
//! The view-facing handle of one resource: the command dispatcher plus read access to the
//! store.

use crate::command::{Command, CommandKind, ListRequest, PendingKey};
use crate::entity::SyncEntity;
use crate::error::NormalizedError;
use crate::message::{Job, Lanes};
use crate::state::{ResourceState, Resolution};
use crate::store::ResourceStore;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

/// ## ResourceClient
///
/// Dispatch is fire-and-forget and synchronous: every command method returns as soon as
/// the pending mark (and any optimistic change) is visible in the store. Outcomes are
/// observed through [`snapshot`](Self::snapshot), [`subscribe`](Self::subscribe), or by
/// awaiting the [`Receipt`] that [`submit`](Self::submit) returns.
///
/// * **Cloneable**: holds the store and the lane senders behind `Arc`s.
/// * **Non-blocking**: dispatch never waits on a worker or on the network.
/// * **Shutdown-safe**: once the workers are gone, a dispatch records an error
///   instead of panicking.
pub struct ResourceClient<T: SyncEntity> {
    store: ResourceStore<T>,
    lanes: Arc<Lanes<T>>,
}

impl<T: SyncEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            lanes: self.lanes.clone(),
        }
    }
}

impl<T: SyncEntity> ResourceClient<T> {
    pub(crate) fn new(store: ResourceStore<T>, lanes: Lanes<T>) -> Self {
        Self {
            store,
            lanes: Arc::new(lanes),
        }
    }

    /// Records the command in the store and hands it to its worker.
    pub fn dispatch(&self, command: Command<T>) {
        let job = self.store.modify(|state| state.begin(command));
        self.route(job);
    }

    /// Like [`dispatch`](Self::dispatch), but returns a receipt for this command's own
    /// outcome.
    pub fn submit(&self, command: Command<T>) -> Receipt<T> {
        let (reply, outcome) = oneshot::channel();
        let job = self.store.modify(|state| state.begin(command).with_reply(reply));
        let key = self.route(job);
        Receipt { key, outcome }
    }

    fn route(&self, job: Job<T>) -> PendingKey {
        let key = job.key();
        debug!(resource = T::LABEL, %key, "Dispatched");

        if let Err(job) = self.lanes.route(job) {
            warn!(resource = T::LABEL, %key, "Worker closed, command abandoned");
            self.store
                .modify(|state| state.abandon(job, NormalizedError::local("Console is shutting down")));
        }
        key
    }

    pub fn list(&self, request: ListRequest) {
        self.dispatch(Command::List(request));
    }

    /// Re-fetches with the current page and filters.
    pub fn refresh(&self) {
        self.list(ListRequest::default());
    }

    pub fn goto_page(&self, page: u32) {
        self.list(ListRequest::page(page));
    }

    pub fn create(&self, params: T::Create) {
        self.dispatch(Command::Create(params));
    }

    pub fn update(&self, id: T::Id, update: T::Update) {
        self.dispatch(Command::Update { id, update });
    }

    pub fn delete(&self, id: T::Id) {
        self.dispatch(Command::Delete { id });
    }

    pub fn act(&self, action: T::Action) {
        self.dispatch(Command::Action(action));
    }

    // --- UI cursor ---

    pub fn select(&self, id: T::Id) {
        self.store.modify(|state| state.select(Some(id)));
    }

    pub fn clear_selection(&self) {
        self.store.modify(|state| state.select(None));
    }

    pub fn clear_filters(&self) {
        self.store.modify(|state| state.clear_filters());
    }

    pub fn clear_error(&self, kind: CommandKind) {
        self.store.modify(|state| state.clear_error(kind));
    }

    // --- Observation ---

    pub fn snapshot(&self) -> ResourceState<T> {
        self.store.snapshot()
    }

    pub fn read<R>(&self, read: impl FnOnce(&ResourceState<T>) -> R) -> R {
        self.store.read(read)
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.store.subscribe()
    }

    pub fn is_pending(&self, key: &PendingKey) -> bool {
        self.store.read(|state| state.is_pending(key))
    }

    /// Waits until `key` is no longer pending and reports the standing error for its kind.
    ///
    /// With several commands under one key this is the kind's outcome, not any single
    /// command's; use [`submit`](Self::submit) for that.
    pub async fn settle(&self, key: &PendingKey) -> Result<(), NormalizedError> {
        let mut rx = self.store.subscribe();
        let error = match rx.wait_for(|state| !state.is_pending(key)).await {
            Ok(state) => state.error(key.kind).cloned(),
            Err(_) => None,
        };
        error.map_or(Ok(()), Err)
    }

    /// Waits until nothing is in flight and returns the resulting state.
    pub async fn settled(&self) -> ResourceState<T> {
        let mut rx = self.store.subscribe();
        let state = match rx.wait_for(|state| !state.has_pending()).await {
            Ok(state) => Some(state.clone()),
            Err(_) => None,
        };
        state.unwrap_or_else(|| self.store.snapshot())
    }
}

/// The outcome of one command, as reported to its dispatcher.
#[derive(Debug)]
pub struct Completion<T: SyncEntity> {
    pub resolution: Resolution,
    /// Value computed by an action that returned [`ActionOutcome::Result`](crate::ActionOutcome::Result).
    pub result: Option<T::ActionResult>,
}

impl<T: SyncEntity> Completion<T> {
    /// `Stale` counts as success: a newer list took over.
    pub fn into_result(self) -> Result<Option<T::ActionResult>, NormalizedError> {
        match self.resolution {
            Resolution::Failed(error) => Err(error),
            Resolution::Applied | Resolution::Stale => Ok(self.result),
        }
    }
}

/// Handle on one submitted command.
#[derive(Debug)]
pub struct Receipt<T: SyncEntity> {
    key: PendingKey,
    outcome: oneshot::Receiver<Completion<T>>,
}

impl<T: SyncEntity> Receipt<T> {
    pub fn key(&self) -> &PendingKey {
        &self.key
    }

    /// Waits for the command to settle.
    pub async fn outcome(self) -> Completion<T> {
        match self.outcome.await {
            Ok(completion) => completion,
            // The job task died before settling.
            Err(_) => Completion {
                resolution: Resolution::Failed(NormalizedError::local(format!(
                    "{} {} was dropped before it settled",
                    T::LABEL,
                    self.key
                ))),
                result: None,
            },
        }
    }
}
