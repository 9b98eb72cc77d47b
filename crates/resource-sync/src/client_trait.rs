//! # SyncClient Trait
//!
//! Provides a common interface for resource-specific clients, adding awaitable versions of
//! the standard commands on top of a generic `ResourceClient`.
use crate::{
    Command, CommandKind, FilterValue, ListRequest, NormalizedError, PendingKey, ResourceClient,
    ResourceState, Resolution, SyncEntity,
};
use async_trait::async_trait;

/// Trait for resource-specific clients to inherit the standard list/delete flows.
///
/// Each provided method submits a command and waits for that command's own outcome, so a
/// wrapper only has to expose what is specific to its resource.
///
/// # Example
///
/// ```rust
/// use resource_sync::{NoAction, NormalizedError, ResourceClient, SyncClient, SyncEntity};
/// use serde::Serialize;
///
/// // 1. Define Entity
/// #[derive(Clone, Debug, Serialize)]
/// struct Tag { id: u32 }
///
/// impl SyncEntity for Tag {
///     type Id = u32;
///     type Create = ();
///     type Update = ();
///     type Action = NoAction;
///     type ActionResult = ();
///     const LABEL: &'static str = "Tag";
///     fn id(&self) -> u32 { self.id }
/// }
///
/// // 2. Define Client Wrapper
/// struct TagClient {
///     inner: ResourceClient<Tag>,
/// }
///
/// // 3. Implement SyncClient
/// impl SyncClient<Tag> for TagClient {
///     type Error = NormalizedError;
///
///     fn inner(&self) -> &ResourceClient<Tag> {
///         &self.inner
///     }
/// }
///
/// // 4. Usage
/// async fn usage(client: TagClient) {
///     // refresh() and remove() are provided automatically!
///     let _ = client.refresh().await;
///     let _ = client.remove(1).await;
/// }
/// ```
#[async_trait]
pub trait SyncClient<T: SyncEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: From<NormalizedError> + Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Current state of the resource.
    fn state(&self) -> ResourceState<T> {
        self.inner().snapshot()
    }

    /// Re-fetch the current page.
    #[tracing::instrument(skip(self), fields(resource = T::LABEL))]
    async fn refresh(&self) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.load(ListRequest::default()).await
    }

    /// Move to another page.
    #[tracing::instrument(skip(self), fields(resource = T::LABEL))]
    async fn goto_page(&self, page: u32) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.load(ListRequest::page(page)).await
    }

    /// Set (or with `None`, remove) one filter and reload from page 1.
    #[tracing::instrument(skip(self), fields(resource = T::LABEL))]
    async fn search(&self, name: &str, value: Option<FilterValue>) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        let mut request = ListRequest::default();
        request.filters.insert(name.to_string(), value);
        self.load(request).await
    }

    /// Dispatch a list and wait for it to settle. If a newer list superseded it, wait for
    /// the newest one instead.
    async fn load(&self, request: ListRequest) -> Result<(), Self::Error> {
        let completion = self.inner().submit(Command::List(request)).outcome().await;
        match completion.resolution {
            Resolution::Applied => Ok(()),
            Resolution::Failed(error) => Err(Self::Error::from(error)),
            Resolution::Stale => {
                let key = PendingKey::new(CommandKind::List);
                self.inner().settle(&key).await.map_err(Self::Error::from)
            }
        }
    }

    /// Delete an entity by ID and wait for the server to confirm.
    #[tracing::instrument(skip(self), fields(resource = T::LABEL))]
    async fn remove(&self, id: T::Id) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        let receipt = self.inner().submit(Command::Delete { id });
        receipt.outcome().await.into_result().map(|_| ()).map_err(Self::Error::from)
    }

    /// Wait until nothing is in flight.
    async fn settled(&self) -> ResourceState<T> {
        self.inner().settled().await
    }
}
