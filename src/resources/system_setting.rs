use crate::model::{SystemSetting, SystemSettingUpdate};
use crate::transport::{ActionCall, RestResource};
use resource_sync::{NoAction, ReadOnly, SyncEntity};

/// Settings are keyed by name and can only be changed, never added or removed.
impl SyncEntity for SystemSetting {
    type Id = String;
    type Create = ReadOnly;
    type Update = SystemSettingUpdate;
    type Action = NoAction;
    type ActionResult = ();

    const LABEL: &'static str = "Setting";

    fn id(&self) -> String {
        self.key.clone()
    }

    fn apply_update(&self, update: &SystemSettingUpdate) -> Option<Self> {
        Some(SystemSetting {
            value: update.value.clone(),
            ..self.clone()
        })
    }
}

impl RestResource for SystemSetting {
    const PATH: &'static str = "system-config";
    const COLLECTION_KEY: &'static str = "settings";

    fn action_call(action: NoAction) -> Result<ActionCall<Self>, serde_json::Error> {
        match action {}
    }
}
