use crate::clients::{
    ActivityLogClient, DeletedDocumentClient, InvoiceClient, RuleClient, SettingClient, TemplateClient,
    TenantClient,
};
use crate::config::ConsoleConfig;
use crate::downloads::DirectorySink;
use crate::error::ConsoleError;
use crate::transport::{RestBackend, RestResource, RestTransport};
use resource_sync::{
    BroadcastNotifier, DownloadSink, FrameworkError, Notification, Notifier, ResourceActor,
    ResourceClient, ResourceSettings, SyncContext,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The running console: one actor per resource, sharing a transport, a notification
/// channel and a download directory.
///
/// # Architecture
///
/// | Client | Resource | Path |
/// |--------|----------|------|
/// | `tenants` | [`Tenant`](crate::model::Tenant) | `tenants` |
/// | `invoices` | [`Invoice`](crate::model::Invoice) | `invoices` |
/// | `rules` | [`ComplianceRule`](crate::model::ComplianceRule) | `compliance-rules` |
/// | `templates` | [`NotificationTemplate`](crate::model::NotificationTemplate) | `notification-templates` |
/// | `activity` | [`ActivityLogEntry`](crate::model::ActivityLogEntry) | `activity-logs` |
/// | `deleted_documents` | [`DeletedDocument`](crate::model::DeletedDocument) | `deleted-documents` |
/// | `settings` | [`SystemSetting`](crate::model::SystemSetting) | `system-config` |
///
/// Resources are independent: nothing one of them does waits on another.
///
/// # Example
///
/// ```ignore
/// let config = ConsoleConfig::load()?;
/// let system = ConsoleSystem::new(&config)?;
///
/// let mut toasts = system.notifications();
/// system.tenants.refresh().await?;
/// system.invoices.export_csv().await?;
///
/// system.shutdown().await?;
/// ```
pub struct ConsoleSystem {
    pub tenants: TenantClient,
    pub invoices: InvoiceClient,
    pub rules: RuleClient,
    pub templates: TemplateClient,
    pub activity: ActivityLogClient,
    pub deleted_documents: DeletedDocumentClient,
    pub settings: SettingClient,

    notifier: Arc<BroadcastNotifier>,
    transport: RestTransport,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl ConsoleSystem {
    /// Builds the transport and spawns every resource actor.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: &ConsoleConfig) -> Result<Self, ConsoleError> {
        let transport = RestTransport::new(config)?;
        let notifier = Arc::new(BroadcastNotifier::new(config.channel_capacity));
        let downloads: Arc<dyn DownloadSink> = Arc::new(DirectorySink::new(&config.export_dir));
        let settings = ResourceSettings {
            page_size: config.page_size,
            restore_failed_deletes: config.restore_failed_deletes,
        };

        let mut launcher = Launcher {
            transport: transport.clone(),
            notifier: notifier.clone(),
            downloads,
            settings,
            handles: Vec::new(),
        };

        let system = Self {
            tenants: TenantClient::new(launcher.start()),
            invoices: InvoiceClient::new(launcher.start()),
            rules: RuleClient::new(launcher.start()),
            templates: TemplateClient::new(launcher.start()),
            activity: ActivityLogClient::new(launcher.start()),
            deleted_documents: DeletedDocumentClient::new(launcher.start()),
            settings: SettingClient::new(launcher.start()),
            notifier,
            transport,
            handles: launcher.handles,
        };

        info!(
            base_url = %config.api_base_url,
            resources = system.handles.len(),
            "Console started"
        );
        Ok(system)
    }

    /// Toasts from every resource. Slow receivers lose the oldest ones.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// Becomes `true` when the server rejects the credential.
    pub fn session_expired(&self) -> watch::Receiver<bool> {
        self.transport.session_expired()
    }

    pub fn transport(&self) -> &RestTransport {
        &self.transport
    }

    /// Drops the clients and waits for every actor to finish its in-flight commands.
    ///
    /// Clones of the clients held elsewhere keep their actors alive, so this only
    /// returns once those are gone too. Reports the first actor that panicked.
    pub async fn shutdown(self) -> Result<(), ConsoleError> {
        info!("Shutting down console...");

        drop(self.tenants);
        drop(self.invoices);
        drop(self.rules);
        drop(self.templates);
        drop(self.activity);
        drop(self.deleted_documents);
        drop(self.settings);

        let mut failure = None;
        for (resource, handle) in self.handles {
            if let Err(e) = handle.await {
                error!(resource, error = %e, "Actor task failed");
                failure.get_or_insert_with(|| FrameworkError::WorkerPanicked(format!("{resource}: {e}")));
            }
        }

        match failure {
            Some(e) => Err(e.into()),
            None => {
                info!("Console shutdown complete.");
                Ok(())
            }
        }
    }
}

/// Shared dependencies for spawning resource actors.
struct Launcher {
    transport: RestTransport,
    notifier: Arc<BroadcastNotifier>,
    downloads: Arc<dyn DownloadSink>,
    settings: ResourceSettings,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Launcher {
    fn start<T>(&mut self) -> ResourceClient<T>
    where
        T: RestResource,
        T::Create: Serialize,
        T::Update: Serialize,
        T::ActionResult: DeserializeOwned,
    {
        let (actor, client) = ResourceActor::<T>::new(self.settings);
        let notifier: Arc<dyn Notifier> = self.notifier.clone();
        let context = SyncContext::new(Arc::new(RestBackend::<T>::new(self.transport.clone())))
            .with_notifier(notifier)
            .with_downloads(self.downloads.clone());
        self.handles.push((T::LABEL, tokio::spawn(actor.run(context))));
        client
    }
}
