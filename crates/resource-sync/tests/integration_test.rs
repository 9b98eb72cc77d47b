use resource_sync::mock::{
    create_mock_backend, expect_create, expect_delete, expect_list, BackendCall, RecordingNotifier,
    RecordingSink, ScriptedBackend,
};
use resource_sync::{
    ActionOutcome, Command, CommandKind, Download, EntityAction, ListRequest, NotificationKind, Page, PageMeta,
    PendingKey, ResourceActor, ResourceBackend, ResourceClient, ResourceSettings, ResponseBody,
    SyncContext, SyncEntity, TransportError,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// --- Test Entity ---

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Account {
    id: String,
    name: String,
    active: bool,
}

#[derive(Debug)]
struct AccountCreate {
    name: String,
}

#[derive(Debug)]
struct AccountUpdate {
    name: String,
}

#[derive(Debug)]
enum AccountAction {
    Suspend(String),
    Export,
}

impl EntityAction for AccountAction {
    fn name(&self) -> &'static str {
        match self {
            AccountAction::Suspend(_) => "suspend",
            AccountAction::Export => "exportCsv",
        }
    }

    fn target(&self) -> Option<String> {
        match self {
            AccountAction::Suspend(id) => Some(id.clone()),
            AccountAction::Export => None,
        }
    }

    fn success_message(&self) -> Option<String> {
        match self {
            AccountAction::Suspend(_) => Some("Account suspended".into()),
            AccountAction::Export => None,
        }
    }
}

impl SyncEntity for Account {
    type Id = String;
    type Create = AccountCreate;
    type Update = AccountUpdate;
    type Action = AccountAction;
    type ActionResult = String;
    const LABEL: &'static str = "Account";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn provisional(temp_id: &str, params: &AccountCreate) -> Option<Self> {
        Some(account(temp_id, &params.name))
    }

    fn apply_update(&self, update: &AccountUpdate) -> Option<Self> {
        Some(Self {
            name: update.name.clone(),
            ..self.clone()
        })
    }
}

fn account(id: &str, name: &str) -> Account {
    Account {
        id: id.to_string(),
        name: name.to_string(),
        active: true,
    }
}

fn accounts(count: usize) -> Vec<Account> {
    (1..=count)
        .map(|n| account(&n.to_string(), &format!("acme-{n}")))
        .collect()
}

fn server_error() -> TransportError {
    TransportError::Http {
        status: 500,
        body: ResponseBody::Json(json!({"success": false})),
    }
}

struct Harness {
    client: ResourceClient<Account>,
    notifier: RecordingNotifier,
}

fn start(backend: Arc<dyn ResourceBackend<Account>>, settings: ResourceSettings) -> Harness {
    let notifier = RecordingNotifier::new();
    let (actor, client) = ResourceActor::<Account>::new(settings);
    let context = SyncContext::new(backend).with_notifier(Arc::new(notifier.clone()));
    tokio::spawn(actor.run(context));
    Harness { client, notifier }
}

fn start_mock(settings: ResourceSettings) -> (Harness, mpsc::UnboundedReceiver<BackendCall<Account>>) {
    let (backend, calls) = create_mock_backend::<Account>();
    (start(Arc::new(backend), settings), calls)
}

/// Loads `items` through a scripted list so later commands start from a known state.
async fn loaded(items: Vec<Account>, total: u64, settings: ResourceSettings) -> (Harness, ScriptedBackend<Account>) {
    let mock = ScriptedBackend::<Account>::new();
    mock.expect_list().return_ok(Page::new(
        items,
        PageMeta {
            total: Some(total),
            ..PageMeta::default()
        },
    ));
    let harness = start(Arc::new(mock.clone()), settings);
    harness.client.refresh();
    harness.client.settled().await;
    (harness, mock)
}

async fn wait_until_idle(client: &ResourceClient<Account>, key: &PendingKey) {
    let mut rx = client.subscribe();
    rx.wait_for(|state| !state.is_pending(key)).await.unwrap();
}

#[tokio::test]
async fn test_filtered_list_populates_store() {
    let mock = ScriptedBackend::<Account>::new();
    mock.expect_list().return_ok(Page::new(
        accounts(12),
        PageMeta {
            total: Some(12),
            total_pages: Some(1),
            ..PageMeta::default()
        },
    ));
    let harness = start(Arc::new(mock.clone()), ResourceSettings::default());

    harness
        .client
        .list(ListRequest::page(1).with_filter("search", "acme"));
    assert!(harness.client.is_pending(&PendingKey::new(CommandKind::List)));

    let state = harness.client.settled().await;
    assert_eq!(state.items().len(), 12);
    assert_eq!(state.pagination().total, 12);
    assert_eq!(state.pagination().total_pages, 1);
    assert!(!state.has_pending());
    assert!(state.last_error().is_none());
    assert_eq!(
        harness.notifier.messages(NotificationKind::Info),
        vec!["Loaded 12 of 12 account records".to_string()]
    );
    mock.verify();
}

#[tokio::test]
async fn test_late_list_response_is_discarded() {
    let (harness, mut calls) = start_mock(ResourceSettings::default());
    let client = &harness.client;

    client.list(ListRequest::page(1));
    let (first_query, first) = expect_list(&mut calls).await.unwrap();
    client.list(ListRequest::page(2));
    let (second_query, second) = expect_list(&mut calls).await.unwrap();
    assert_eq!(first_query.page, 1);
    assert_eq!(second_query.page, 2);

    second
        .send(Ok(Page::complete(vec![account("b", "second")])))
        .unwrap();
    let applied = client.settled().await;
    assert_eq!(applied.items()[0].id, "b");
    let before = serde_json::to_value(&applied).unwrap();

    let mut rx = client.subscribe();
    rx.borrow_and_update();
    first
        .send(Ok(Page::complete(vec![account("a", "first")])))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!rx.has_changed().unwrap(), "stale result must not touch the store");
    assert_eq!(serde_json::to_value(client.snapshot()).unwrap(), before);
}

#[tokio::test]
async fn test_pending_cleared_once_per_command() {
    let (harness, mut calls) = start_mock(ResourceSettings::default());
    let client = &harness.client;
    let key = PendingKey::new(CommandKind::Create);

    client.create(AccountCreate { name: "one".into() });
    client.create(AccountCreate { name: "two".into() });
    assert!(client.is_pending(&key));

    let (_, first) = expect_create(&mut calls).await.unwrap();
    let (_, second) = expect_create(&mut calls).await.unwrap();

    first.send(Ok(account("1", "one"))).unwrap();
    let mut rx = client.subscribe();
    rx.wait_for(|state| state.items().iter().any(|a| a.id == "1"))
        .await
        .unwrap();
    assert!(client.is_pending(&key), "second create is still in flight");

    second.send(Err(server_error())).unwrap();
    wait_until_idle(client, &key).await;
    let state = client.snapshot();
    assert!(!state.has_pending());
    assert_eq!(state.error(CommandKind::Create).map(|e| e.status), Some(500));
}

#[tokio::test]
async fn test_failed_create_rolls_back_provisional_item() {
    let (harness, mock) = loaded(accounts(3), 3, ResourceSettings::default()).await;
    mock.expect_create().return_err(TransportError::Http {
        status: 422,
        body: ResponseBody::Json(json!({"errors": {"name": "already taken"}})),
    });

    let mut rx = harness.client.subscribe();
    harness.client.create(AccountCreate { name: "acme-1".into() });
    {
        let state = rx.borrow_and_update();
        assert_eq!(state.items().len(), 4);
        assert!(state.items()[0].id.starts_with("tmp-"));
        assert_eq!(state.pagination().total, 4);
    }

    let state = harness.client.settled().await;
    assert_eq!(state.items().len(), 3);
    assert_eq!(state.pagination().total, 3);
    let error = state.error(CommandKind::Create).unwrap();
    assert_eq!(error.status, 422);
    assert_eq!(error.field_errors.get("name").map(String::as_str), Some("already taken"));
    assert_eq!(
        harness.notifier.messages(NotificationKind::Error),
        vec!["name: already taken".to_string()]
    );
    mock.verify();
}

#[tokio::test]
async fn test_failed_update_restores_previous_version() {
    let (harness, mock) = loaded(accounts(2), 2, ResourceSettings::default()).await;
    mock.expect_update("2".into()).return_err(TransportError::Network("offline".into()));

    harness.client.update("2".into(), AccountUpdate { name: "renamed".into() });
    assert_eq!(harness.client.snapshot().items()[1].name, "renamed");

    let state = harness.client.settled().await;
    assert_eq!(state.items()[1].name, "acme-2");
    assert_eq!(state.last_error().map(|e| e.message.as_str()), Some("Unable to reach server"));
    mock.verify();
}

#[tokio::test]
async fn test_failed_delete_is_not_restored_by_default() {
    let items = vec![
        account("3", "c"),
        account("7", "g"),
        account("9", "i"),
        account("11", "k"),
        account("12", "l"),
    ];
    let (harness, mock) = loaded(items, 5, ResourceSettings::default()).await;
    mock.expect_delete("7".into()).return_err(server_error());

    harness.client.delete("7".into());
    let optimistic = harness.client.snapshot();
    assert_eq!(optimistic.pagination().total, 4);
    assert!(optimistic.get(&"7".to_string()).is_none());

    let state = harness.client.settled().await;
    assert!(state.get(&"7".to_string()).is_none());
    assert_eq!(state.pagination().total, 4);
    assert_eq!(
        state.error(CommandKind::Delete).map(|e| e.message.as_str()),
        Some("Server error, try again later")
    );
    assert_eq!(
        harness.notifier.messages(NotificationKind::Error),
        vec!["Server error, try again later".to_string()]
    );
    mock.verify();
}

#[tokio::test]
async fn test_failed_delete_restored_when_configured() {
    let settings = ResourceSettings {
        restore_failed_deletes: true,
        ..ResourceSettings::default()
    };
    let (harness, mock) = loaded(accounts(3), 3, settings).await;
    mock.expect_delete("2".into()).return_err(server_error());

    harness.client.delete("2".into());
    let state = harness.client.settled().await;
    let ids: Vec<_> = state.items().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(state.pagination().total, 3);
    mock.verify();
}

#[tokio::test]
async fn test_back_to_back_creates_land_in_arrival_order() {
    let (harness, mut calls) = start_mock(ResourceSettings::default());
    let client = &harness.client;

    client.create(AccountCreate { name: "first".into() });
    client.create(AccountCreate { name: "second".into() });
    let provisional: Vec<String> = client.read(|s| s.items().iter().map(|a| a.id.clone()).collect());
    assert_eq!(provisional.len(), 2);
    assert_ne!(provisional[0], provisional[1]);

    let (first_params, first) = expect_create(&mut calls).await.unwrap();
    let (second_params, second) = expect_create(&mut calls).await.unwrap();

    // The later dispatch resolves first.
    second.send(Ok(account("20", &second_params.name))).unwrap();
    let mut rx = client.subscribe();
    rx.wait_for(|s| s.get(&"20".to_string()).is_some()).await.unwrap();
    first.send(Ok(account("10", &first_params.name))).unwrap();

    let state = client.settled().await;
    let ids: Vec<_> = state.items().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["10", "20"]);
    assert_eq!(state.pagination().total, 2);
    assert_eq!(harness.notifier.messages(NotificationKind::Success).len(), 2);
}

#[tokio::test]
async fn test_concurrent_creates_report_their_own_outcome() {
    let (harness, mut calls) = start_mock(ResourceSettings::default());
    let client = &harness.client;

    let first = client.submit(Command::Create(AccountCreate { name: "first".into() }));
    let second = client.submit(Command::Create(AccountCreate { name: "second".into() }));
    assert_eq!(first.key(), &PendingKey::new(CommandKind::Create));

    let (_, first_reply) = expect_create(&mut calls).await.unwrap();
    let (second_params, second_reply) = expect_create(&mut calls).await.unwrap();
    first_reply.send(Err(server_error())).unwrap();
    second_reply.send(Ok(account("20", &second_params.name))).unwrap();

    let first = first.outcome().await.into_result();
    let second = second.outcome().await.into_result();
    assert_eq!(first.map_err(|e| e.status), Err(500));
    assert!(second.is_ok());

    // The kind's error slot was cleared by the later success.
    let state = client.settled().await;
    assert!(state.error(CommandKind::Create).is_none());
    assert_eq!(state.items().len(), 1);
    assert_eq!(state.items()[0].id, "20");
}

#[tokio::test]
async fn test_concurrent_previews_return_their_own_result() {
    let (harness, mut calls) = start_mock(ResourceSettings::default());
    let client = &harness.client;

    let first = client.submit(Command::Action(AccountAction::Export));
    let second = client.submit(Command::Action(AccountAction::Export));
    let Some(BackendCall::Perform { respond_to: first_reply, .. }) = calls.recv().await else {
        panic!("expected an action call")
    };
    let Some(BackendCall::Perform { respond_to: second_reply, .. }) = calls.recv().await else {
        panic!("expected an action call")
    };

    second_reply.send(Ok(ActionOutcome::Result("second".into()))).unwrap();
    let second = second.outcome().await.into_result().unwrap();
    first_reply.send(Ok(ActionOutcome::Result("first".into()))).unwrap();
    let first = first.outcome().await.into_result().unwrap();

    assert_eq!(first.as_deref(), Some("first"));
    assert_eq!(second.as_deref(), Some("second"));
    assert_eq!(client.snapshot().last_result().map(String::as_str), Some("first"));
}

#[tokio::test]
async fn test_slow_list_does_not_block_delete() {
    let (harness, mut calls) = start_mock(ResourceSettings::default());
    let client = &harness.client;

    client.refresh();
    let (_, hung_list) = expect_list(&mut calls).await.unwrap();

    client.delete("4".into());
    let (id, responder) = expect_delete(&mut calls).await.unwrap();
    assert_eq!(id, "4");
    responder.send(Ok(())).unwrap();

    let key = PendingKey::targeting(CommandKind::Delete, "4");
    wait_until_idle(client, &key).await;
    assert!(client.is_pending(&PendingKey::new(CommandKind::List)));

    hung_list.send(Ok(Page::complete(Vec::new()))).unwrap();
    assert!(!client.settled().await.has_pending());
}

#[tokio::test]
async fn test_actions_and_downloads() {
    let mock = ScriptedBackend::<Account>::new();
    mock.expect_list().return_ok(Page::complete(accounts(2)));
    mock.expect_perform("suspend").return_ok(ActionOutcome::Upsert(Account {
        active: false,
        ..account("1", "acme-1")
    }));
    mock.expect_perform("exportCsv").return_ok(ActionOutcome::Download(Download {
        file_stem: "accounts".into(),
        content_type: "text/csv".into(),
        bytes: b"id,name\n1,acme-1\n".to_vec(),
    }));

    let sink = RecordingSink::new();
    let notifier = RecordingNotifier::new();
    let (actor, client) = ResourceActor::<Account>::new(ResourceSettings::default());
    tokio::spawn(actor.run(
        SyncContext::new(Arc::new(mock.clone()))
            .with_notifier(Arc::new(notifier.clone()))
            .with_downloads(Arc::new(sink.clone())),
    ));

    client.refresh();
    client.settled().await;
    client.act(AccountAction::Suspend("1".into()));
    assert!(client.is_pending(&PendingKey::targeting(CommandKind::Action("suspend"), "1")));
    client.act(AccountAction::Export);
    let state = client.settled().await;

    assert!(!state.get(&"1".to_string()).unwrap().active);
    assert_eq!(sink.saved().len(), 1);
    assert_eq!(sink.saved()[0].file_name(), "accounts.csv");
    let successes = notifier.messages(NotificationKind::Success);
    assert!(successes.contains(&"Account suspended".to_string()));
    assert!(successes.contains(&"Account exportCsv completed".to_string()));
    mock.verify();
}

#[tokio::test]
async fn test_failed_save_is_reported_as_command_error() {
    let mock = ScriptedBackend::<Account>::new();
    mock.expect_perform("exportCsv").return_ok(ActionOutcome::Download(Download {
        file_stem: "accounts".into(),
        content_type: "application/pdf".into(),
        bytes: vec![0x25, 0x50],
    }));

    let (actor, client) = ResourceActor::<Account>::new(ResourceSettings::default());
    tokio::spawn(actor.run(
        SyncContext::new(Arc::new(mock.clone())).with_downloads(Arc::new(RecordingSink::failing())),
    ));

    client.act(AccountAction::Export);
    let state = client.settled().await;
    let error = state.error(CommandKind::Action("exportCsv")).unwrap();
    assert_eq!(error.status, 0);
    assert!(error.message.starts_with("Could not save file"));
    mock.verify();
}

#[tokio::test]
async fn test_dispatch_after_shutdown_records_error() {
    let (actor, client) = ResourceActor::<Account>::new(ResourceSettings::default());
    drop(actor);

    client.create(AccountCreate { name: "late".into() });
    client.delete("1".into());

    let state = client.snapshot();
    assert!(!state.has_pending());
    assert!(state.items().is_empty());
    assert_eq!(
        state.error(CommandKind::Create).map(|e| e.message.as_str()),
        Some("Console is shutting down")
    );
}

#[tokio::test]
async fn test_resource_stops_when_clients_are_dropped() {
    let mock = ScriptedBackend::<Account>::new();
    let (actor, client) = ResourceActor::<Account>::new(ResourceSettings::default());
    let handle = tokio::spawn(actor.run(SyncContext::new(Arc::new(mock))));

    drop(client);
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("resource did not shut down")
        .unwrap();
}
