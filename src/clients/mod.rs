//! Type-safe wrappers around [`ResourceClient`](resource_sync::ResourceClient).
//!
//! Every wrapper implements [`SyncClient`](resource_sync::SyncClient) for the shared
//! list/page/search/remove flows and adds awaitable methods for its own commands. The
//! plain dispatch methods stay reachable through `inner()` for views that only watch
//! the store.

pub mod activity_log_client;
pub mod deleted_document_client;
pub mod invoice_client;
pub mod notification_template_client;
pub mod rule_client;
pub mod setting_client;
pub mod tenant_client;

pub use activity_log_client::*;
pub use deleted_document_client::*;
pub use invoice_client::*;
pub use notification_template_client::*;
pub use rule_client::*;
pub use setting_client::*;
pub use tenant_client::*;

use crate::error::ConsoleError;
use resource_sync::{Command, NormalizedError, ResourceClient, SyncEntity};

pub(crate) async fn create_and_settle<T: SyncEntity>(
    inner: &ResourceClient<T>,
    params: T::Create,
) -> Result<(), ConsoleError> {
    inner.submit(Command::Create(params)).outcome().await.into_result()?;
    Ok(())
}

pub(crate) async fn update_and_settle<T: SyncEntity>(
    inner: &ResourceClient<T>,
    id: T::Id,
    update: T::Update,
) -> Result<(), ConsoleError> {
    inner.submit(Command::Update { id, update }).outcome().await.into_result()?;
    Ok(())
}

pub(crate) async fn act_and_settle<T: SyncEntity>(
    inner: &ResourceClient<T>,
    action: T::Action,
) -> Result<(), ConsoleError> {
    inner.submit(Command::Action(action)).outcome().await.into_result()?;
    Ok(())
}

/// Runs an action and returns the value it computed.
pub(crate) async fn compute<T: SyncEntity>(
    inner: &ResourceClient<T>,
    action: T::Action,
) -> Result<T::ActionResult, ConsoleError> {
    inner
        .submit(Command::Action(action))
        .outcome()
        .await
        .into_result()?
        .ok_or_else(|| NormalizedError::local(format!("{} returned no result", T::LABEL)).into())
}
