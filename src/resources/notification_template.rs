use crate::model::{
    NotificationTemplate, NotificationTemplateCreate, NotificationTemplateUpdate, RenderedTemplate,
};
use crate::transport::{ActionCall, Expect, RestResource};
use resource_sync::{EntityAction, SyncEntity};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateAction {
    /// Render with sample data.
    Preview(String),
    SendTest { id: String, recipient: String },
}

impl EntityAction for TemplateAction {
    fn name(&self) -> &'static str {
        match self {
            TemplateAction::Preview(_) => "preview",
            TemplateAction::SendTest { .. } => "send_test",
        }
    }

    fn target(&self) -> Option<String> {
        match self {
            TemplateAction::Preview(id) | TemplateAction::SendTest { id, .. } => Some(id.clone()),
        }
    }

    fn success_message(&self) -> Option<String> {
        match self {
            TemplateAction::Preview(_) => None,
            TemplateAction::SendTest { recipient, .. } => Some(format!("Test message sent to {recipient}")),
        }
    }
}

impl SyncEntity for NotificationTemplate {
    type Id = String;
    type Create = NotificationTemplateCreate;
    type Update = NotificationTemplateUpdate;
    type Action = TemplateAction;
    type ActionResult = RenderedTemplate;

    const LABEL: &'static str = "Template";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn provisional(temp_id: &str, params: &NotificationTemplateCreate) -> Option<Self> {
        Some(NotificationTemplate {
            id: temp_id.to_string(),
            name: params.name.clone(),
            channel: params.channel,
            locale: params.locale.clone(),
            subject: params.subject.clone(),
            body: params.body.clone(),
            updated_at: None,
        })
    }

    fn apply_update(&self, update: &NotificationTemplateUpdate) -> Option<Self> {
        let mut next = self.clone();
        if let Some(name) = &update.name {
            next.name = name.clone();
        }
        if update.subject.is_some() {
            next.subject = update.subject.clone();
        }
        if let Some(body) = &update.body {
            next.body = body.clone();
        }
        Some(next)
    }
}

impl RestResource for NotificationTemplate {
    const PATH: &'static str = "notification-templates";
    const COLLECTION_KEY: &'static str = "templates";

    fn action_call(action: TemplateAction) -> Result<ActionCall<Self>, serde_json::Error> {
        match action {
            TemplateAction::Preview(id) => Ok(ActionCall::post(&[id.as_str(), "preview"], Expect::Result)),
            TemplateAction::SendTest { id, recipient } => {
                ActionCall::post(&[id.as_str(), "test"], Expect::Nothing)
                    .with_body(&json!({ "recipient": recipient }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_test_ignores_response_body() {
        let action = TemplateAction::SendTest {
            id: "tpl_1".into(),
            recipient: "qa@example.com".into(),
        };
        assert_eq!(
            action.success_message().as_deref(),
            Some("Test message sent to qa@example.com")
        );

        let call = NotificationTemplate::action_call(action).unwrap();
        assert_eq!(call.segments, vec!["tpl_1", "test"]);
        assert_eq!(call.body, Some(json!({"recipient": "qa@example.com"})));
        assert!(matches!(call.expect, Expect::Nothing));
    }

    #[test]
    fn test_preview_targets_template() {
        let action = TemplateAction::Preview("tpl_2".into());
        assert_eq!(action.name(), "preview");
        assert_eq!(action.target().as_deref(), Some("tpl_2"));
        let call = NotificationTemplate::action_call(action).unwrap();
        assert!(matches!(call.expect, Expect::Result));
    }
}
