use super::{act_and_settle, compute, create_and_settle, update_and_settle};
use crate::error::ConsoleError;
use crate::model::{ComplianceRule, ComplianceRuleCreate, ComplianceRuleUpdate, RulePreview, RulePreviewRequest};
use crate::resources::RuleAction;
use async_trait::async_trait;
use resource_sync::{ResourceClient, SyncClient};
use tracing::{debug, instrument};

/// Client for compliance rules.
#[derive(Clone)]
pub struct RuleClient {
    inner: ResourceClient<ComplianceRule>,
}

impl RuleClient {
    pub fn new(inner: ResourceClient<ComplianceRule>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SyncClient<ComplianceRule> for RuleClient {
    type Error = ConsoleError;

    fn inner(&self) -> &ResourceClient<ComplianceRule> {
        &self.inner
    }
}

impl RuleClient {
    #[instrument(skip(self, rule), fields(name = %rule.name))]
    pub async fn add(&self, rule: ComplianceRuleCreate) -> Result<(), ConsoleError> {
        debug!("Sending request");
        create_and_settle(&self.inner, rule).await
    }

    #[instrument(skip(self, update))]
    pub async fn edit(&self, id: String, update: ComplianceRuleUpdate) -> Result<(), ConsoleError> {
        debug!("Sending request");
        update_and_settle(&self.inner, id, update).await
    }

    /// Evaluates an unsaved expression. The result is also kept as `last_result`.
    #[instrument(skip(self, request), fields(document_type = %request.document_type))]
    pub async fn preview(&self, request: RulePreviewRequest) -> Result<RulePreview, ConsoleError> {
        debug!("Sending request");
        compute(&self.inner, RuleAction::Preview(request)).await
    }

    #[instrument(skip(self))]
    pub async fn toggle(&self, id: String) -> Result<(), ConsoleError> {
        debug!("Sending request");
        act_and_settle(&self.inner, RuleAction::Toggle(id)).await
    }
}
