//! End-to-end tests: a real `ConsoleSystem` talking HTTP to an in-process stub server.

use compliance_console::model::{RulePreviewRequest, TenantCreate, TenantStatus};
use compliance_console::{ConsoleConfig, ConsoleError, ConsoleSystem};
use resource_sync::{CommandKind, ErrorKind, FilterValue, NotificationKind, SyncClient};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

// --- Stub server ---

#[derive(Clone)]
struct Route {
    method: &'static str,
    path: &'static str,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

fn route(method: &'static str, path: &'static str, status: u16, body: Value) -> Route {
    Route {
        method,
        path,
        status,
        content_type: "application/json",
        body: body.to_string().into_bytes(),
    }
}

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    target: String,
    authorization: Option<String>,
    body: String,
}

struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let log = requests.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(respond(socket, routes.clone(), log.clone()));
            }
        });

        Self { addr, requests }
    }

    fn config(&self, export_dir: &Path) -> ConsoleConfig {
        let vars = HashMap::from([
            ("CONSOLE_API_BASE_URL".to_string(), format!("http://{}/api", self.addr)),
            ("CONSOLE_API_TOKEN".to_string(), "secret".to_string()),
            ("CONSOLE_REQUEST_TIMEOUT_SECS".to_string(), "5".to_string()),
            ("CONSOLE_EXPORT_DIR".to_string(), export_dir.display().to_string()),
        ]);
        ConsoleConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn respond(socket: TcpStream, routes: Arc<Vec<Route>>, log: Arc<Mutex<Vec<Recorded>>>) {
    let mut reader = BufReader::new(socket);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "authorization" => authorization = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).await.unwrap();

    log.lock().unwrap().push(Recorded {
        method: method.clone(),
        target: target.clone(),
        authorization,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let path = target.split('?').next().unwrap_or_default();
    let matched = routes
        .iter()
        .find(|route| route.method == method && route.path == path)
        .cloned()
        .unwrap_or_else(|| route("ANY", "", 404, json!({"message": "no such route"})));

    let head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        matched.status,
        matched.content_type,
        matched.body.len()
    );
    let mut socket = reader.into_inner();
    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(&matched.body).await;
    let _ = socket.shutdown().await;
}

fn tenant_json(id: &str, name: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "plan": "pro",
        "status": status,
        "contactEmail": format!("ops@{id}.test"),
        "createdAt": "2026-01-01T00:00:00Z",
    })
}

// --- Tests ---

#[tokio::test]
async fn test_list_unwraps_envelope_and_sends_credentials() {
    let server = StubServer::start(vec![route(
        "GET",
        "/api/tenants",
        200,
        json!({
            "success": true,
            "data": {"tenants": [tenant_json("t_1", "Acme", "active"), tenant_json("t_2", "Globex", "trial")]},
            "pagination": {"page": 1, "limit": 20, "totalItems": 42, "pages": 3},
        }),
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let system = ConsoleSystem::new(&server.config(dir.path())).unwrap();
    let mut notifications = system.notifications();

    system.tenants.refresh().await.unwrap();

    let state = system.tenants.state();
    assert_eq!(state.items().len(), 2);
    assert_eq!(state.items()[1].status, TenantStatus::Trial);
    assert_eq!(state.pagination().total, 42);
    assert_eq!(state.pagination().total_pages, 3);

    let requests = server.requests();
    assert_eq!(requests[0].method, "GET");
    assert!(requests[0].target.starts_with("/api/tenants?"));
    assert!(requests[0].target.contains("page=1"));
    assert!(requests[0].target.contains("pageSize=20"));
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer secret"));

    let toast = notifications.recv().await.unwrap();
    assert_eq!(toast.kind, NotificationKind::Info);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_rejected_create_rolls_back_and_reports_fields() {
    let server = StubServer::start(vec![route(
        "POST",
        "/api/tenants",
        422,
        json!({"success": false, "errors": {"contactEmail": "must be a valid address"}}),
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let system = ConsoleSystem::new(&server.config(dir.path())).unwrap();
    let mut notifications = system.notifications();

    let result = system
        .tenants
        .onboard(TenantCreate::new("Initech", "starter", "not-an-email"))
        .await;

    let Err(ConsoleError::Command(error)) = result else {
        panic!("expected a command error, got {result:?}");
    };
    assert_eq!(error.status, 422);
    assert_eq!(error.kind, ErrorKind::Validation);
    assert_eq!(error.message, "contactEmail: must be a valid address");

    let state = system.tenants.state();
    assert!(state.items().is_empty());
    assert_eq!(state.error(CommandKind::Create), Some(&error));

    let toast = notifications.recv().await.unwrap();
    assert_eq!(toast.kind, NotificationKind::Error);
    assert_eq!(toast.message, error.message);

    let body: Value = serde_json::from_str(&server.requests()[0].body).unwrap();
    assert_eq!(body, json!({"name": "Initech", "plan": "starter", "contactEmail": "not-an-email"}));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_flags_session() {
    let server = StubServer::start(vec![route(
        "GET",
        "/api/invoices",
        401,
        json!({"message": "Token expired"}),
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let system = ConsoleSystem::new(&server.config(dir.path())).unwrap();
    let mut session = system.session_expired();
    assert!(!*session.borrow());

    let error = system.invoices.refresh().await.unwrap_err();

    assert!(matches!(&error, ConsoleError::Command(e) if e.kind == ErrorKind::Auth && e.message == "Token expired"));
    tokio::time::timeout(Duration::from_secs(1), session.wait_for(|expired| *expired))
        .await
        .unwrap()
        .unwrap();

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_export_is_saved_to_export_dir() {
    let server = StubServer::start(vec![
        route("GET", "/api/invoices", 200, json!({"invoices": []})),
        Route {
            method: "POST",
            path: "/api/invoices/export",
            status: 200,
            content_type: "text/csv; charset=utf-8",
            body: b"number,total\n2026-0001,1000\n".to_vec(),
        },
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let system = ConsoleSystem::new(&server.config(dir.path())).unwrap();

    system
        .invoices
        .search("status", Some(FilterValue::from("issued")))
        .await
        .unwrap();
    system.invoices.export_csv().await.unwrap();

    let export = server.requests().pop().unwrap();
    assert_eq!(export.method, "POST");
    assert_eq!(export.target, "/api/invoices/export");
    let body: Value = serde_json::from_str(&export.body).unwrap();
    assert_eq!(body, json!({"filters": {"status": "issued"}}));

    let saved: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(saved.len(), 1);
    let name = saved[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("invoices-") && name.ends_with(".csv"), "{name}");
    assert_eq!(std::fs::read(&saved[0]).unwrap(), b"number,total\n2026-0001,1000\n");

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_restore_removes_document_from_bin() {
    let document = |id: &str| {
        json!({
            "id": id,
            "tenantId": "t_1",
            "title": format!("Contract {id}"),
            "documentType": "contract",
            "deletedBy": "admin@example.com",
            "deletedAt": "2026-03-01T00:00:00Z",
        })
    };
    let server = StubServer::start(vec![
        route("GET", "/api/deleted-documents", 200, json!([document("d_1"), document("d_2")])),
        route("POST", "/api/deleted-documents/d_1/restore", 200, json!({"success": true})),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let system = ConsoleSystem::new(&server.config(dir.path())).unwrap();

    system.deleted_documents.refresh().await.unwrap();
    system.deleted_documents.restore("d_1".to_string()).await.unwrap();

    let ids: Vec<String> = system
        .deleted_documents
        .state()
        .items()
        .iter()
        .map(|doc| doc.id.clone())
        .collect();
    assert_eq!(ids, vec!["d_2"]);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_rule_preview_returns_computed_result() {
    let server = StubServer::start(vec![route(
        "POST",
        "/api/compliance-rules/preview",
        200,
        json!({"success": true, "data": {"passed": false, "violations": ["amount must be positive"]}}),
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let system = ConsoleSystem::new(&server.config(dir.path())).unwrap();

    let preview = system
        .rules
        .preview(RulePreviewRequest {
            expression: "amount > 0".into(),
            document_type: "invoice".into(),
            sample: json!({"amount": -5}),
        })
        .await
        .unwrap();

    assert!(!preview.passed);
    assert_eq!(preview.violations, vec!["amount must be positive"]);
    assert_eq!(system.rules.state().last_result(), Some(&preview));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let vars = HashMap::from([
        ("CONSOLE_API_BASE_URL", format!("http://{addr}/api/")),
        ("CONSOLE_EXPORT_DIR", dir.path().display().to_string()),
    ]);
    let config = ConsoleConfig::from_lookup(|name| vars.get(name).cloned()).unwrap();
    let system = ConsoleSystem::new(&config).unwrap();

    let error = system.templates.refresh().await.unwrap_err();

    let ConsoleError::Command(error) = error else {
        panic!("expected a command error");
    };
    assert_eq!(error.status, 0);
    assert_eq!(error.kind, ErrorKind::Network);
    assert_eq!(error.message, "Unable to reach server");
    assert!(!system.templates.state().has_pending());

    system.shutdown().await.unwrap();
}
