//! # Effect Worker
//!
//! Performs the remote call for one [`Job`] and reconciles the outcome into the store.
//!
//! # Architecture Note
//! A worker never holds the store across an `.await`: it reads nothing before the call
//! and applies the result in a single [`ResourceStore::modify`] afterwards. The backend
//! call is the only suspension point, so any number of jobs can be in flight at once.
//!
//! Every failure, whatever its shape, goes through [`normalize`] and ends as a
//! [`Resolution::Failed`]: pending cleared, error recorded, one error notification.

use crate::actor::{ResourceSettings, SyncContext};
use crate::backend::ActionOutcome;
use crate::command::CommandKind;
use crate::entity::{EntityAction, SyncEntity};
use crate::error::{normalize, NormalizedError, TransportError};
use crate::message::{answer, Job};
use crate::notify::NotificationKind;
use crate::state::Resolution;
use crate::store::ResourceStore;
use tracing::{debug, info, warn};

pub(crate) struct EffectWorker<T: SyncEntity> {
    store: ResourceStore<T>,
    context: SyncContext<T>,
    settings: ResourceSettings,
}

impl<T: SyncEntity> Clone for EffectWorker<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            context: self.context.clone(),
            settings: self.settings,
        }
    }
}

impl<T: SyncEntity> EffectWorker<T> {
    pub(crate) fn new(store: ResourceStore<T>, context: SyncContext<T>, settings: ResourceSettings) -> Self {
        Self {
            store,
            context,
            settings,
        }
    }

    /// Runs one job to completion.
    pub(crate) async fn execute(&self, job: Job<T>) -> Resolution {
        let resource = T::LABEL;
        let backend = &self.context.backend;

        match job {
            Job::List { query, token, reply } => {
                debug!(resource, token, page = query.page, filters = query.filters.len(), "List");
                let result = backend.list(query).await.map_err(|e| self.normalize(CommandKind::List, e));
                let resolution = self.store.modify_if(
                    |state| state.apply_list(token, result),
                    |resolution| *resolution != Resolution::Stale,
                );
                match &resolution {
                    Resolution::Stale => debug!(resource, token, "Stale list result discarded"),
                    Resolution::Applied => {
                        let (count, total) = self.store.read(|s| (s.items().len(), s.pagination().total));
                        info!(resource, token, count, total, "Listed");
                        self.context.notifier.notify(
                            &format!("Loaded {count} of {total} {} records", T::LABEL.to_lowercase()),
                            NotificationKind::Info,
                        );
                    }
                    Resolution::Failed(error) => self.report_failure(CommandKind::List, error),
                }
                answer(reply, &resolution, None);
                resolution
            }
            Job::Create { params, ticket } => {
                debug!(resource, ?params, "Create");
                let result = backend
                    .create(params)
                    .await
                    .map_err(|e| self.normalize(CommandKind::Create, e));
                let created = result.as_ref().ok().map(|item| item.id().to_string());
                let resolution = self.store.modify(|state| state.settle_create(ticket, result));
                if let Some(id) = created.filter(|_| resolution == Resolution::Applied) {
                    info!(resource, %id, "Created");
                }
                self.report(CommandKind::Create, &resolution, || format!("{} created", T::LABEL));
                resolution
            }
            Job::Update { id, update, ticket } => {
                debug!(resource, %id, ?update, "Update");
                let result = backend
                    .update(id.clone(), update)
                    .await
                    .map_err(|e| self.normalize(CommandKind::Update, e));
                let resolution = self.store.modify(|state| state.settle_update(ticket, result));
                if resolution == Resolution::Applied {
                    info!(resource, %id, "Updated");
                }
                self.report(CommandKind::Update, &resolution, || format!("{} updated", T::LABEL));
                resolution
            }
            Job::Delete { id, ticket } => {
                debug!(resource, %id, "Delete");
                let result = backend
                    .delete(id.clone())
                    .await
                    .map_err(|e| self.normalize(CommandKind::Delete, e));
                let restore = self.settings.restore_failed_deletes;
                let resolution = self
                    .store
                    .modify(|state| state.settle_delete(ticket, result, restore));
                if resolution == Resolution::Applied {
                    info!(resource, %id, "Deleted");
                }
                self.report(CommandKind::Delete, &resolution, || format!("{} deleted", T::LABEL));
                resolution
            }
            Job::Action { action, ticket } => {
                let name = action.name();
                let kind = CommandKind::Action(name);
                let target = action.target();
                let message = action
                    .success_message()
                    .unwrap_or_else(|| format!("{} {name} completed", T::LABEL));
                debug!(resource, action = name, target = target.as_deref(), "Action");

                let result = match backend.perform(action).await {
                    Ok(ActionOutcome::Download(download)) => {
                        let file = download.file_name();
                        match self.context.downloads.save(download).await {
                            Ok(path) => {
                                info!(resource, action = name, path = %path.display(), "Download saved");
                                Ok(ActionOutcome::Done)
                            }
                            Err(e) => {
                                warn!(resource, action = name, %file, error = %e, "Download not saved");
                                Err(NormalizedError::local(format!("Could not save file: {e}")))
                            }
                        }
                    }
                    Ok(outcome) => Ok(outcome),
                    Err(e) => Err(self.normalize(kind, e)),
                };
                let resolution = self.store.modify(|state| state.settle_action(ticket, result));
                if resolution == Resolution::Applied {
                    info!(resource, action = name, target = target.as_deref(), "Action ok");
                }
                self.report(kind, &resolution, || message);
                resolution
            }
        }
    }

    fn normalize(&self, kind: CommandKind, error: TransportError) -> NormalizedError {
        debug!(resource = T::LABEL, %kind, raw = %error, "Backend call failed");
        normalize(&error)
    }

    fn report(&self, kind: CommandKind, resolution: &Resolution, success: impl FnOnce() -> String) {
        match resolution {
            Resolution::Applied => self
                .context
                .notifier
                .notify(&success(), NotificationKind::Success),
            Resolution::Failed(error) => self.report_failure(kind, error),
            Resolution::Stale => {}
        }
    }

    fn report_failure(&self, kind: CommandKind, error: &NormalizedError) {
        warn!(
            resource = T::LABEL,
            %kind,
            status = error.status,
            error = %error.message,
            "Command failed"
        );
        self.context
            .notifier
            .notify(&error.message, NotificationKind::Error);
    }
}
