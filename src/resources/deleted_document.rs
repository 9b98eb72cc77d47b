use crate::model::DeletedDocument;
use crate::transport::{ActionCall, Expect, RestResource};
use resource_sync::{EntityAction, ReadOnly, SyncEntity};

/// Purging is a plain `delete` on this resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletedDocumentAction {
    Restore(String),
}

impl EntityAction for DeletedDocumentAction {
    fn name(&self) -> &'static str {
        match self {
            DeletedDocumentAction::Restore(_) => "restore",
        }
    }

    fn target(&self) -> Option<String> {
        match self {
            DeletedDocumentAction::Restore(id) => Some(id.clone()),
        }
    }

    fn success_message(&self) -> Option<String> {
        Some("Document restored".to_string())
    }
}

impl SyncEntity for DeletedDocument {
    type Id = String;
    type Create = ReadOnly;
    type Update = ReadOnly;
    type Action = DeletedDocumentAction;
    type ActionResult = ();

    const LABEL: &'static str = "Document";

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl RestResource for DeletedDocument {
    const PATH: &'static str = "deleted-documents";
    const COLLECTION_KEY: &'static str = "documents";

    fn action_call(action: DeletedDocumentAction) -> Result<ActionCall<Self>, serde_json::Error> {
        match action {
            DeletedDocumentAction::Restore(id) => Ok(ActionCall::post(
                &[id.as_str(), "restore"],
                Expect::Remove(id.clone()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_removes_from_bin() {
        let call = DeletedDocument::action_call(DeletedDocumentAction::Restore("doc_4".into())).unwrap();
        assert_eq!(call.segments, vec!["doc_4", "restore"]);
        match call.expect {
            Expect::Remove(id) => assert_eq!(id, "doc_4"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
