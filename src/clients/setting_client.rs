use super::update_and_settle;
use crate::error::ConsoleError;
use crate::model::{SystemSetting, SystemSettingUpdate};
use async_trait::async_trait;
use resource_sync::{ResourceClient, SyncClient};
use serde_json::Value;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct SettingClient {
    inner: ResourceClient<SystemSetting>,
}

impl SettingClient {
    pub fn new(inner: ResourceClient<SystemSetting>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SyncClient<SystemSetting> for SettingClient {
    type Error = ConsoleError;

    fn inner(&self) -> &ResourceClient<SystemSetting> {
        &self.inner
    }
}

impl SettingClient {
    #[instrument(skip(self, value))]
    pub async fn set(&self, key: String, value: Value) -> Result<(), ConsoleError> {
        debug!("Sending request");
        update_and_settle(&self.inner, key, SystemSettingUpdate { value }).await
    }
}
