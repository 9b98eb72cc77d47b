use crate::model::{
    ComplianceRule, ComplianceRuleCreate, ComplianceRuleUpdate, RulePreview, RulePreviewRequest,
};
use crate::transport::{ActionCall, Expect, RestResource};
use reqwest::Method;
use resource_sync::{EntityAction, SyncEntity};

#[derive(Debug, Clone, PartialEq)]
pub enum RuleAction {
    /// Evaluate an expression against a sample document without saving it.
    Preview(RulePreviewRequest),
    /// Flip `enabled`.
    Toggle(String),
}

impl EntityAction for RuleAction {
    fn name(&self) -> &'static str {
        match self {
            RuleAction::Preview(_) => "preview",
            RuleAction::Toggle(_) => "toggle",
        }
    }

    fn target(&self) -> Option<String> {
        match self {
            RuleAction::Preview(_) => None,
            RuleAction::Toggle(id) => Some(id.clone()),
        }
    }

    fn success_message(&self) -> Option<String> {
        let message = match self {
            RuleAction::Preview(_) => "Preview ready",
            RuleAction::Toggle(_) => "Rule updated",
        };
        Some(message.to_string())
    }
}

impl SyncEntity for ComplianceRule {
    type Id = String;
    type Create = ComplianceRuleCreate;
    type Update = ComplianceRuleUpdate;
    type Action = RuleAction;
    type ActionResult = RulePreview;

    const LABEL: &'static str = "Rule";

    fn id(&self) -> String {
        self.id.clone()
    }

    /// New rules start disabled until the server has validated the expression.
    fn provisional(temp_id: &str, params: &ComplianceRuleCreate) -> Option<Self> {
        Some(ComplianceRule {
            id: temp_id.to_string(),
            name: params.name.clone(),
            description: params.description.clone(),
            jurisdiction: params.jurisdiction.clone(),
            document_type: params.document_type.clone(),
            severity: params.severity,
            enabled: false,
            expression: params.expression.clone(),
            updated_at: None,
        })
    }

    fn apply_update(&self, update: &ComplianceRuleUpdate) -> Option<Self> {
        let mut next = self.clone();
        if let Some(name) = &update.name {
            next.name = name.clone();
        }
        if let Some(description) = &update.description {
            next.description = description.clone();
        }
        if let Some(severity) = update.severity {
            next.severity = severity;
        }
        if let Some(expression) = &update.expression {
            next.expression = expression.clone();
        }
        Some(next)
    }
}

impl RestResource for ComplianceRule {
    const PATH: &'static str = "compliance-rules";
    const COLLECTION_KEY: &'static str = "rules";

    fn update_method() -> Method {
        Method::PATCH
    }

    fn action_call(action: RuleAction) -> Result<ActionCall<Self>, serde_json::Error> {
        match action {
            RuleAction::Preview(request) => {
                ActionCall::post(&["preview"], Expect::Result).with_body(&request)
            }
            RuleAction::Toggle(id) => Ok(ActionCall::post(&[id.as_str(), "toggle"], Expect::Item)),
        }
    }
}
