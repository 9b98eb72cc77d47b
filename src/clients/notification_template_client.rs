use super::{act_and_settle, compute, create_and_settle, update_and_settle};
use crate::error::ConsoleError;
use crate::model::{NotificationTemplate, NotificationTemplateCreate, NotificationTemplateUpdate, RenderedTemplate};
use crate::resources::TemplateAction;
use async_trait::async_trait;
use resource_sync::{ResourceClient, SyncClient};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct TemplateClient {
    inner: ResourceClient<NotificationTemplate>,
}

impl TemplateClient {
    pub fn new(inner: ResourceClient<NotificationTemplate>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SyncClient<NotificationTemplate> for TemplateClient {
    type Error = ConsoleError;

    fn inner(&self) -> &ResourceClient<NotificationTemplate> {
        &self.inner
    }
}

impl TemplateClient {
    #[instrument(skip(self, template), fields(name = %template.name))]
    pub async fn add(&self, template: NotificationTemplateCreate) -> Result<(), ConsoleError> {
        debug!("Sending request");
        create_and_settle(&self.inner, template).await
    }

    #[instrument(skip(self, update))]
    pub async fn edit(&self, id: String, update: NotificationTemplateUpdate) -> Result<(), ConsoleError> {
        debug!("Sending request");
        update_and_settle(&self.inner, id, update).await
    }

    #[instrument(skip(self))]
    pub async fn preview(&self, id: String) -> Result<RenderedTemplate, ConsoleError> {
        debug!("Sending request");
        compute(&self.inner, TemplateAction::Preview(id)).await
    }

    #[instrument(skip(self))]
    pub async fn send_test(&self, id: String, recipient: String) -> Result<(), ConsoleError> {
        debug!("Sending request");
        act_and_settle(&self.inner, TemplateAction::SendTest { id, recipient }).await
    }
}
