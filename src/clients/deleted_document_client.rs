use super::act_and_settle;
use crate::error::ConsoleError;
use crate::model::DeletedDocument;
use crate::resources::DeletedDocumentAction;
use async_trait::async_trait;
use resource_sync::{ResourceClient, SyncClient};
use tracing::{debug, instrument};

/// Client for the document recycle bin.
#[derive(Clone)]
pub struct DeletedDocumentClient {
    inner: ResourceClient<DeletedDocument>,
}

impl DeletedDocumentClient {
    pub fn new(inner: ResourceClient<DeletedDocument>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SyncClient<DeletedDocument> for DeletedDocumentClient {
    type Error = ConsoleError;

    fn inner(&self) -> &ResourceClient<DeletedDocument> {
        &self.inner
    }
}

impl DeletedDocumentClient {
    #[instrument(skip(self))]
    pub async fn restore(&self, id: String) -> Result<(), ConsoleError> {
        debug!("Sending request");
        act_and_settle(&self.inner, DeletedDocumentAction::Restore(id)).await
    }

    /// Permanently deletes the document.
    pub async fn purge(&self, id: String) -> Result<(), ConsoleError> {
        self.remove(id).await
    }
}
