//! # REST Backend
//!
//! [`RestBackend`] implements the engine's backend port once for every resource. What
//! differs per resource is declared on [`RestResource`]: the collection path, the key its
//! list may be wrapped in, the verb used for updates, and how each custom action maps onto
//! a request.
//!
//! | Command | Request |
//! |---------|---------|
//! | `list` | `GET {path}?page=..&pageSize=..&sortBy=..&sortOrder=..&<filters>` |
//! | `create` | `POST {path}` |
//! | `update` | `PUT`/`PATCH {path}/{id}` |
//! | `delete` | `DELETE {path}/{id}` |
//! | action | whatever [`RestResource::action_call`] returns |

use super::envelope;
use super::rest::RestTransport;
use async_trait::async_trait;
use reqwest::Method;
use resource_sync::{
    ActionOutcome, ListQuery, Page, ResourceBackend, SyncEntity, TransportError,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use tracing::debug;

/// How the response of an action is interpreted.
#[derive(Debug)]
pub enum Expect<T: SyncEntity> {
    /// Ignore the body.
    Nothing,
    /// The body is the updated item.
    Item,
    /// The item left the collection.
    Remove(T::Id),
    /// The body is a computed value (`T::ActionResult`).
    Result,
    /// The body is a file.
    File { file_stem: String },
}

/// One action, translated into a request.
#[derive(Debug)]
pub struct ActionCall<T: SyncEntity> {
    pub method: Method,
    /// Path segments below the resource's own path.
    pub segments: Vec<String>,
    pub body: Option<Value>,
    pub expect: Expect<T>,
}

impl<T: SyncEntity> ActionCall<T> {
    pub fn new(method: Method, segments: &[&str], expect: Expect<T>) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            body: None,
            expect,
        }
    }

    pub fn post(segments: &[&str], expect: Expect<T>) -> Self {
        Self::new(Method::POST, segments, expect)
    }

    pub fn get(segments: &[&str], expect: Expect<T>) -> Self {
        Self::new(Method::GET, segments, expect)
    }

    pub fn with_body(mut self, body: &impl Serialize) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// REST binding of a [`SyncEntity`].
pub trait RestResource: SyncEntity + DeserializeOwned {
    /// Collection path below the API base, e.g. `"compliance-rules"`.
    const PATH: &'static str;

    /// Key a list may be wrapped in, e.g. `"rules"`.
    const COLLECTION_KEY: &'static str;

    fn update_method() -> Method {
        Method::PUT
    }

    fn action_call(action: Self::Action) -> Result<ActionCall<Self>, serde_json::Error>;
}

/// Generic backend that speaks the console's REST conventions.
pub struct RestBackend<T> {
    transport: RestTransport,
    _resource: PhantomData<fn() -> T>,
}

impl<T: RestResource> RestBackend<T> {
    pub fn new(transport: RestTransport) -> Self {
        Self {
            transport,
            _resource: PhantomData,
        }
    }
}

fn encode(payload: &impl Serialize) -> Result<Value, TransportError> {
    serde_json::to_value(payload)
        .map_err(|e| TransportError::Local(format!("Could not encode request: {e}")))
}

#[async_trait]
impl<T> ResourceBackend<T> for RestBackend<T>
where
    T: RestResource,
    T::Create: Serialize,
    T::Update: Serialize,
    T::ActionResult: DeserializeOwned,
{
    async fn list(&self, query: ListQuery) -> Result<Page<T>, TransportError> {
        let request = self
            .transport
            .request(Method::GET, &[T::PATH])
            .query(&query.query_pairs());
        let (status, body) = self.transport.json(request).await?;
        envelope::list_page(status, body, T::COLLECTION_KEY)
    }

    async fn create(&self, params: T::Create) -> Result<T, TransportError> {
        let payload = encode(&params)?;
        let request = self.transport.request(Method::POST, &[T::PATH]).json(&payload);
        let (status, body) = self.transport.json(request).await?;
        envelope::item(status, body)
    }

    async fn update(&self, id: T::Id, update: T::Update) -> Result<T, TransportError> {
        let payload = encode(&update)?;
        let id = id.to_string();
        let request = self
            .transport
            .request(T::update_method(), &[T::PATH, id.as_str()])
            .json(&payload);
        let (status, body) = self.transport.json(request).await?;
        envelope::item(status, body)
    }

    async fn delete(&self, id: T::Id) -> Result<(), TransportError> {
        let id = id.to_string();
        let request = self.transport.request(Method::DELETE, &[T::PATH, id.as_str()]);
        self.transport.send(request).await?;
        Ok(())
    }

    async fn perform(&self, action: T::Action) -> Result<ActionOutcome<T>, TransportError> {
        let call = T::action_call(action)
            .map_err(|e| TransportError::Local(format!("Could not encode request: {e}")))?;
        debug!(resource = T::LABEL, method = %call.method, path = ?call.segments, "Action request");

        let mut segments = vec![T::PATH.to_string()];
        segments.extend(call.segments);
        let mut request = self.transport.request(call.method, segments.as_slice());
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        match call.expect {
            Expect::Nothing => {
                self.transport.send(request).await?;
                Ok(ActionOutcome::Done)
            }
            Expect::Remove(id) => {
                self.transport.send(request).await?;
                Ok(ActionOutcome::Remove(id))
            }
            Expect::Item => {
                let (status, body) = self.transport.json(request).await?;
                envelope::item(status, body).map(ActionOutcome::Upsert)
            }
            Expect::Result => {
                let (status, body) = self.transport.json(request).await?;
                envelope::item(status, body).map(ActionOutcome::Result)
            }
            Expect::File { file_stem } => self
                .transport
                .download(request, file_stem)
                .await
                .map(ActionOutcome::Download),
        }
    }
}
