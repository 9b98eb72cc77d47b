//! # Mock Backends & Testing Guide
//!
//! Test doubles for every port of the engine: [`ResourceBackend`], [`Notifier`] and
//! [`DownloadSink`]. They let you drive a real [`ResourceActor`](crate::ResourceActor)
//! deterministically, without HTTP.
//!
//! ## When to use which mock
//!
//! | Mock | Answers | Use Case |
//! |------|---------|----------|
//! | [`MockBackend`] | From the test, through a oneshot per call | Ordering and race tests: answer calls in any order |
//! | [`ScriptedBackend`] | From a queue of expectations | Flow tests: "list, then create fails with 422" |
//! | [`RecordingNotifier`] | n/a | Assert on emitted toasts |
//! | [`RecordingSink`] | n/a | Assert on saved downloads, inject save failures |
//!
//! ## Pattern 1: Answering calls out of order
//!
//! ```rust
//! use resource_sync::mock::{create_mock_backend, expect_list};
//! use resource_sync::{ListRequest, NoAction, Page, ResourceActor, ResourceSettings, SyncContext, SyncEntity};
//! use serde::Serialize;
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, Serialize)]
//! struct Tag { id: u32 }
//!
//! impl SyncEntity for Tag {
//!     type Id = u32; type Create = (); type Update = (); type Action = NoAction;
//!     type ActionResult = (); const LABEL: &'static str = "Tag";
//!     fn id(&self) -> u32 { self.id }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (backend, mut calls) = create_mock_backend::<Tag>();
//!     let (actor, client) = ResourceActor::<Tag>::new(ResourceSettings::default());
//!     tokio::spawn(actor.run(SyncContext::new(Arc::new(backend))));
//!
//!     client.list(ListRequest::page(1));
//!     let (_, first) = expect_list(&mut calls).await.unwrap();
//!     client.list(ListRequest::page(2));
//!     let (_, second) = expect_list(&mut calls).await.unwrap();
//!
//!     // The newer request answers first; the older answer arrives late and is ignored.
//!     second.send(Ok(Page::complete(vec![Tag { id: 2 }]))).unwrap();
//!     first.send(Ok(Page::complete(vec![Tag { id: 1 }]))).unwrap();
//!
//!     let state = client.settled().await;
//!     assert_eq!(state.items()[0].id, 2);
//! }
//! ```
//!
//! ## Pattern 2: Scripted flow
//!
//! ```rust
//! use resource_sync::mock::ScriptedBackend;
//! use resource_sync::{NoAction, ResourceActor, ResourceSettings, SyncContext, SyncEntity, TransportError};
//! use serde::Serialize;
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, Serialize)]
//! struct Tag { id: u32 }
//!
//! impl SyncEntity for Tag {
//!     type Id = u32; type Create = (); type Update = (); type Action = NoAction;
//!     type ActionResult = (); const LABEL: &'static str = "Tag";
//!     fn id(&self) -> u32 { self.id }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = ScriptedBackend::<Tag>::new();
//!     mock.expect_create().return_err(TransportError::Timeout);
//!
//!     let (actor, client) = ResourceActor::<Tag>::new(ResourceSettings::default());
//!     tokio::spawn(actor.run(SyncContext::new(Arc::new(mock.clone()))));
//!
//!     client.create(());
//!     let state = client.settled().await;
//!     assert_eq!(state.last_error().unwrap().status, 0);
//!     mock.verify();
//! }
//! ```

use crate::backend::{ActionOutcome, Download, DownloadSink, Page, ResourceBackend};
use crate::command::ListQuery;
use crate::entity::{EntityAction, SyncEntity};
use crate::error::TransportError;
use crate::notify::{Notification, NotificationKind, Notifier};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// CHANNEL BACKEND
// =============================================================================

/// Answer slot of a [`BackendCall`].
pub type Responder<R> = oneshot::Sender<Result<R, TransportError>>;

/// A backend call waiting for the test to answer it.
#[derive(Debug)]
pub enum BackendCall<T: SyncEntity> {
    List {
        query: ListQuery,
        respond_to: Responder<Page<T>>,
    },
    Create {
        params: T::Create,
        respond_to: Responder<T>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Responder<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Responder<()>,
    },
    Perform {
        action: T::Action,
        respond_to: Responder<ActionOutcome<T>>,
    },
}

/// Backend that forwards every call to a channel the test controls.
pub struct MockBackend<T: SyncEntity> {
    sender: mpsc::UnboundedSender<BackendCall<T>>,
}

impl<T: SyncEntity> Clone for MockBackend<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: SyncEntity> MockBackend<T> {
    async fn call<R>(&self, build: impl FnOnce(Responder<R>) -> BackendCall<T>) -> Result<R, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .map_err(|_| TransportError::Network("mock backend closed".into()))?;
        response
            .await
            .map_err(|_| TransportError::Network("mock responder dropped".into()))?
    }
}

#[async_trait]
impl<T: SyncEntity> ResourceBackend<T> for MockBackend<T> {
    async fn list(&self, query: ListQuery) -> Result<Page<T>, TransportError> {
        self.call(|respond_to| BackendCall::List { query, respond_to }).await
    }

    async fn create(&self, params: T::Create) -> Result<T, TransportError> {
        self.call(|respond_to| BackendCall::Create { params, respond_to })
            .await
    }

    async fn update(&self, id: T::Id, update: T::Update) -> Result<T, TransportError> {
        self.call(|respond_to| BackendCall::Update {
            id,
            update,
            respond_to,
        })
        .await
    }

    async fn delete(&self, id: T::Id) -> Result<(), TransportError> {
        self.call(|respond_to| BackendCall::Delete { id, respond_to }).await
    }

    async fn perform(&self, action: T::Action) -> Result<ActionOutcome<T>, TransportError> {
        self.call(|respond_to| BackendCall::Perform { action, respond_to })
            .await
    }
}

/// Creates a channel backend and the receiver the test answers calls from.
///
/// Calls whose responder is dropped fail with a network error.
pub fn create_mock_backend<T: SyncEntity>() -> (MockBackend<T>, mpsc::UnboundedReceiver<BackendCall<T>>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (MockBackend { sender }, receiver)
}

/// Helper to verify that the next call is a `list`.
pub async fn expect_list<T: SyncEntity>(
    receiver: &mut mpsc::UnboundedReceiver<BackendCall<T>>,
) -> Option<(ListQuery, Responder<Page<T>>)> {
    match receiver.recv().await {
        Some(BackendCall::List { query, respond_to }) => Some((query, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a `create`.
pub async fn expect_create<T: SyncEntity>(
    receiver: &mut mpsc::UnboundedReceiver<BackendCall<T>>,
) -> Option<(T::Create, Responder<T>)> {
    match receiver.recv().await {
        Some(BackendCall::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is an `update`.
pub async fn expect_update<T: SyncEntity>(
    receiver: &mut mpsc::UnboundedReceiver<BackendCall<T>>,
) -> Option<(T::Id, T::Update, Responder<T>)> {
    match receiver.recv().await {
        Some(BackendCall::Update {
            id,
            update,
            respond_to,
        }) => Some((id, update, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a `delete`.
pub async fn expect_delete<T: SyncEntity>(
    receiver: &mut mpsc::UnboundedReceiver<BackendCall<T>>,
) -> Option<(T::Id, Responder<()>)> {
    match receiver.recv().await {
        Some(BackendCall::Delete { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a custom action.
pub async fn expect_perform<T: SyncEntity>(
    receiver: &mut mpsc::UnboundedReceiver<BackendCall<T>>,
) -> Option<(T::Action, Responder<ActionOutcome<T>>)> {
    match receiver.recv().await {
        Some(BackendCall::Perform { action, respond_to }) => Some((action, respond_to)),
        _ => None,
    }
}

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected backend call and its canned answer.
enum Expectation<T: SyncEntity> {
    List(Result<Page<T>, TransportError>),
    Create(Result<T, TransportError>),
    Update {
        id: T::Id,
        response: Result<T, TransportError>,
    },
    Delete {
        id: T::Id,
        response: Result<(), TransportError>,
    },
    Perform {
        name: &'static str,
        response: Result<ActionOutcome<T>, TransportError>,
    },
}

impl<T: SyncEntity> Expectation<T> {
    fn describe(&self) -> String {
        match self {
            Expectation::List(_) => "list".into(),
            Expectation::Create(_) => "create".into(),
            Expectation::Update { id, .. } => format!("update:{id}"),
            Expectation::Delete { id, .. } => format!("delete:{id}"),
            Expectation::Perform { name, .. } => (*name).into(),
        }
    }
}

type Script<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// Backend that answers from a queue of expectations, in call order.
///
/// A call that does not match the head of the queue fails with
/// [`TransportError::Local`] and is reported by [`verify`](Self::verify).
///
/// # Example
/// ```ignore
/// let mock = ScriptedBackend::<Tenant>::new();
/// mock.expect_list().return_ok(Page::complete(vec![tenant]));
/// mock.expect_delete("t1".into()).return_err(TransportError::Timeout);
///
/// tokio::spawn(actor.run(SyncContext::new(Arc::new(mock.clone()))));
/// // Use client in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct ScriptedBackend<T: SyncEntity> {
    expectations: Script<T>,
    mismatches: Arc<Mutex<Vec<String>>>,
}

impl<T: SyncEntity> Clone for ScriptedBackend<T> {
    fn clone(&self) -> Self {
        Self {
            expectations: self.expectations.clone(),
            mismatches: self.mismatches.clone(),
        }
    }
}

impl<T: SyncEntity> Default for ScriptedBackend<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SyncEntity> ScriptedBackend<T> {
    pub fn new() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(VecDeque::new())),
            mismatches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Expects a `list` call.
    pub fn expect_list(&self) -> ExpectationBuilder<T, Page<T>> {
        self.builder(Expectation::List)
    }

    /// Expects a `create` call.
    pub fn expect_create(&self) -> ExpectationBuilder<T, T> {
        self.builder(Expectation::Create)
    }

    /// Expects an `update` of `id`.
    pub fn expect_update(&self, id: T::Id) -> ExpectationBuilder<T, T> {
        self.builder(move |response| Expectation::Update { id, response })
    }

    /// Expects a `delete` of `id`.
    pub fn expect_delete(&self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.builder(move |response| Expectation::Delete { id, response })
    }

    /// Expects a custom action named `name`.
    pub fn expect_perform(&self, name: &'static str) -> ExpectationBuilder<T, ActionOutcome<T>> {
        self.builder(move |response| Expectation::Perform { name, response })
    }

    /// Number of expectations not consumed yet.
    pub fn remaining(&self) -> usize {
        lock(&self.expectations).len()
    }

    /// Verifies that all expectations were met and no unexpected call happened.
    pub fn verify(&self) {
        let mismatches = lock(&self.mismatches);
        if !mismatches.is_empty() {
            panic!("Unexpected backend calls: {}", mismatches.join(", "));
        }
        let remaining: Vec<String> = lock(&self.expectations).iter().map(Expectation::describe).collect();
        if !remaining.is_empty() {
            panic!("Not all expectations were met. Remaining: {}", remaining.join(", "));
        }
    }

    fn builder<R>(
        &self,
        build: impl FnOnce(Result<R, TransportError>) -> Expectation<T> + Send + 'static,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            expectations: self.expectations.clone(),
            build: Box::new(build),
        }
    }

    fn next(&self, call: String) -> Option<Expectation<T>> {
        let next = lock(&self.expectations).pop_front();
        if next.is_none() {
            lock(&self.mismatches).push(call);
        }
        next
    }

    fn mismatch<R>(&self, call: String, expected: Expectation<T>) -> Result<R, TransportError> {
        let message = format!("{call} (expected {})", expected.describe());
        lock(&self.mismatches).push(message.clone());
        Err(TransportError::Local(format!("Unexpected call: {message}")))
    }

    fn exhausted<R>(call: &str) -> Result<R, TransportError> {
        Err(TransportError::Local(format!("Unexpected call: {call}")))
    }
}

#[async_trait]
impl<T: SyncEntity> ResourceBackend<T> for ScriptedBackend<T> {
    async fn list(&self, _query: ListQuery) -> Result<Page<T>, TransportError> {
        let call = "list".to_string();
        match self.next(call.clone()) {
            Some(Expectation::List(response)) => response,
            Some(other) => self.mismatch(call, other),
            None => Self::exhausted(&call),
        }
    }

    async fn create(&self, _params: T::Create) -> Result<T, TransportError> {
        let call = "create".to_string();
        match self.next(call.clone()) {
            Some(Expectation::Create(response)) => response,
            Some(other) => self.mismatch(call, other),
            None => Self::exhausted(&call),
        }
    }

    async fn update(&self, id: T::Id, _update: T::Update) -> Result<T, TransportError> {
        let call = format!("update:{id}");
        match self.next(call.clone()) {
            Some(Expectation::Update { id: expected, response }) if expected == id => response,
            Some(other) => self.mismatch(call, other),
            None => Self::exhausted(&call),
        }
    }

    async fn delete(&self, id: T::Id) -> Result<(), TransportError> {
        let call = format!("delete:{id}");
        match self.next(call.clone()) {
            Some(Expectation::Delete { id: expected, response }) if expected == id => response,
            Some(other) => self.mismatch(call, other),
            None => Self::exhausted(&call),
        }
    }

    async fn perform(&self, action: T::Action) -> Result<ActionOutcome<T>, TransportError> {
        let call = action.name().to_string();
        match self.next(call.clone()) {
            Some(Expectation::Perform { name, response }) if name == action.name() => response,
            Some(other) => self.mismatch(call, other),
            None => Self::exhausted(&call),
        }
    }
}

/// Builder returned by the `expect_*` methods of [`ScriptedBackend`].
pub struct ExpectationBuilder<T: SyncEntity, R> {
    expectations: Script<T>,
    build: Box<dyn FnOnce(Result<R, TransportError>) -> Expectation<T> + Send>,
}

impl<T: SyncEntity, R> ExpectationBuilder<T, R> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        lock(&self.expectations).push_back((self.build)(Ok(value)));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: TransportError) {
        lock(&self.expectations).push_back((self.build)(Err(error)));
    }
}

// =============================================================================
// NOTIFIER & DOWNLOAD SINK
// =============================================================================

/// Notifier that keeps everything it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.received).clone()
    }

    pub fn messages(&self, kind: NotificationKind) -> Vec<String> {
        lock(&self.received)
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        lock(&self.received).push(Notification {
            message: message.to_string(),
            kind,
        });
    }
}

/// Download sink that keeps files in memory; can be switched to fail every save.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    saved: Arc<Mutex<Vec<Download>>>,
    failing: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every save fails with a permission error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<Download> {
        lock(&self.saved).clone()
    }
}

#[async_trait]
impl DownloadSink for RecordingSink {
    async fn save(&self, download: Download) -> std::io::Result<PathBuf> {
        if self.failing {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        let path = PathBuf::from(download.file_name());
        lock(&self.saved).push(download);
        Ok(path)
    }
}
