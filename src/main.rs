//! Console entry point: loads configuration, starts every resource, loads the first page
//! of the main tables and prints the resulting notifications.

use compliance_console::lifecycle::setup_tracing;
use compliance_console::selectors::invoice_totals;
use compliance_console::{ConsoleConfig, ConsoleError, ConsoleSystem};
use resource_sync::{NotificationKind, SyncClient};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), ConsoleError> {
    setup_tracing();

    let config = ConsoleConfig::load()?;
    info!(base_url = %config.api_base_url, page_size = config.page_size, "Configuration loaded");

    let system = ConsoleSystem::new(&config)?;

    let mut notifications = system.notifications();
    let printer = tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(notification) => match notification.kind {
                    NotificationKind::Error => error!(message = %notification.message, "Notification"),
                    NotificationKind::Info | NotificationKind::Success => {
                        info!(message = %notification.message, "Notification")
                    }
                },
                Err(RecvError::Lagged(missed)) => warn!(missed, "Notifications dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut session = system.session_expired();
    tokio::spawn(async move {
        if session.wait_for(|expired| *expired).await.is_ok() {
            warn!("The API rejected the token; set CONSOLE_API_TOKEN and restart");
        }
    });

    // Failures are already recorded in each store and reported as notifications.
    let (tenants, invoices, activity) = tokio::join!(
        system.tenants.refresh().instrument(tracing::info_span!("tenants")),
        system.invoices.refresh().instrument(tracing::info_span!("invoices")),
        system.activity.refresh().instrument(tracing::info_span!("activity")),
    );
    for result in [tenants, invoices, activity] {
        if let Err(e) = result {
            warn!(error = %e, "Initial load failed");
        }
    }

    let state = system.tenants.state();
    info!(
        loaded = state.items().len(),
        total = state.pagination().total,
        "Tenants"
    );
    for (currency, totals) in invoice_totals(system.invoices.state().items()) {
        info!(
            %currency,
            billed = totals.billed,
            paid = totals.paid,
            outstanding = totals.outstanding,
            "Invoice totals"
        );
    }

    system.shutdown().await?;
    // The channel closes with the last actor, after its final notification.
    let _ = printer.await;
    Ok(())
}
