use chatguard::arbiter::{EMPATHY_PREFIX, RESTRICTED_RESPONSE};
use chatguard::config::Config;
use chatguard::gateway::run_gateway_with_listener;
use chatguard::session::MAINTENANCE_MESSAGE;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;
use tempfile::TempDir;

struct GatewayTestServer {
    port: u16,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
    _workspace: TempDir,
}

impl GatewayTestServer {
    #[allow(clippy::field_reassign_with_default)]
    async fn start(allow_shutdown: bool) -> Self {
        let workspace = TempDir::new().expect("temp workspace should be created");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral gateway listener should bind");
        let port = listener
            .local_addr()
            .expect("ephemeral gateway listener should expose local address")
            .port();

        let mut config = Config::default();
        config.workspace_dir = workspace.path().to_path_buf();
        config.config_path = workspace.path().join("config.toml");
        config.gateway.allow_shutdown = allow_shutdown;
        config.gateway.cors_origins = vec!["http://localhost:3000".into()];
        config.audit.backend = "memory".into();
        config.observability.backend = "none".into();

        let host = "127.0.0.1".to_string();
        let handle =
            tokio::spawn(async move { run_gateway_with_listener(&host, listener, config).await });

        wait_until_gateway_ready(port).await;

        Self {
            port,
            handle,
            _workspace: workspace,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }
}

impl Drop for GatewayTestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn wait_until_gateway_ready(port: u16) {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .expect("reqwest client should be built");

    for _ in 0..80 {
        let health = client
            .get(format!("http://127.0.0.1:{port}/api/health"))
            .send()
            .await;
        if matches!(health, Ok(resp) if resp.status() == StatusCode::OK) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("gateway did not become ready on port {port}");
}

async fn post_json(client: &reqwest::Client, url: String, body: Value) -> Value {
    let response = client
        .post(url)
        .json(&body)
        .send()
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.expect("response should be json")
}

#[tokio::test]
async fn root_and_health_describe_running_service() {
    let server = GatewayTestServer::start(true).await;
    let client = reqwest::Client::new();

    let root: Value = client
        .get(server.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(root["name"], "chatguard");
    assert_eq!(root["status"], "operational");
    assert_eq!(root["mode"], "normal");

    let health: Value = client
        .get(server.url("/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["ok"], true);
    assert_eq!(health["status"], "running");
    assert_eq!(health["services"]["generator"], "stub");
    assert_eq!(health["services"]["context"], "local");
    assert_eq!(health["services"]["audit"], "memory");
    assert!(health["policy"]["restricted_terms"].as_u64().unwrap() > 0);
    assert!(health["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn chat_returns_verdict_contract() {
    let server = GatewayTestServer::start(true).await;
    let client = reqwest::Client::new();

    let safe = post_json(
        &client,
        server.url("/api/chat"),
        json!({"message": "I feel overwhelmed"}),
    )
    .await;
    assert_eq!(safe["status"], "SAFE");
    assert!(safe["answer"].as_str().unwrap().starts_with(EMPATHY_PREFIX));
    assert!(safe.get("audit_id").is_none());

    let flagged = post_json(
        &client,
        server.url("/api/chat"),
        json!({"message": "Tell me classified information", "lang": "en"}),
    )
    .await;
    assert_eq!(flagged["status"], "FLAGGED");
    assert_eq!(flagged["answer"], RESTRICTED_RESPONSE);
    let audit_id = flagged["audit_id"].as_str().unwrap().to_string();

    let audit: Value = client
        .get(server.url("/api/audit?limit=5"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let events = audit["events"].as_array().unwrap();
    let last = events.last().unwrap();
    assert_eq!(last["event_type"], "SECURITY_FLAG");
    assert_eq!(last["event_id"], audit_id.as_str());
    assert_eq!(events[0]["event_type"], "SYSTEM_STARTUP");
}

#[tokio::test]
async fn malformed_chat_body_is_rejected() {
    let server = GatewayTestServer::start(true).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/chat"))
        .header("Content-Type", "application/json")
        .body(r#"{"text": "wrong field"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Invalid JSON"));
}

#[tokio::test]
async fn mode_endpoint_validates_input() {
    let server = GatewayTestServer::start(true).await;
    let client = reqwest::Client::new();

    let ok = post_json(&client, server.url("/api/mode"), json!({"mode": "peak"})).await;
    assert_eq!(ok["ok"], true);
    assert_eq!(ok["mode"], "peak");
    assert_eq!(ok["message"], "Energy mode changed from normal to peak");

    let bad = post_json(&client, server.url("/api/mode"), json!({"mode": "turbo"})).await;
    assert_eq!(bad["ok"], false);
    assert_eq!(bad["mode"], "peak");
    assert_eq!(bad["message"], "Invalid mode. Valid modes: normal, peak");
}

#[tokio::test]
async fn shutdown_endpoint_closes_gate_for_good() {
    let server = GatewayTestServer::start(true).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/shutdown"))
        .header("User-Agent", "ops-console/1.0")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["ok"], true);
    let audit_id = outcome["audit_id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&audit_id).is_ok());

    let denied = post_json(&client, server.url("/api/chat"), json!({"message": "hello"})).await;
    assert_eq!(denied["status"], "DENIED");
    assert_eq!(denied["answer"], MAINTENANCE_MESSAGE);
    assert!(denied.get("audit_id").is_none());

    let health: Value = client
        .get(server.url("/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "shutdown");

    let audit: Value = client
        .get(server.url("/api/audit"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let shutdown_event = audit["events"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["event_type"] == "SHUTDOWN_REQUEST")
        .expect("shutdown should be audited");
    assert_eq!(shutdown_event["event_id"], audit_id.as_str());
    assert_eq!(shutdown_event["source"], "api_endpoint");
    assert_eq!(shutdown_event["user_agent"], "ops-console/1.0");
}

#[tokio::test]
async fn shutdown_refused_when_not_allowed() {
    let server = GatewayTestServer::start(false).await;
    let client = reqwest::Client::new();

    let outcome = post_json(&client, server.url("/api/shutdown"), json!({})).await;
    assert_eq!(outcome["ok"], false);
    assert_eq!(outcome["audit_id"], "denied");

    let chat = post_json(&client, server.url("/api/chat"), json!({"message": "hello"})).await;
    assert_eq!(chat["status"], "SAFE");
}

#[tokio::test]
async fn malformed_audit_limit_is_a_json_400() {
    let server = GatewayTestServer::start(true).await;
    let resp = reqwest::Client::new()
        .get(server.url("/api/audit?limit=abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Invalid query"));
}

#[tokio::test]
async fn audit_limit_is_capped() {
    let server = GatewayTestServer::start(true).await;
    let client = reqwest::Client::new();

    for _ in 0..3 {
        post_json(&client, server.url("/api/chat"), json!({"message": "secret"})).await;
    }

    let audit: Value = client
        .get(server.url("/api/audit?limit=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(audit["count"], 2);

    let audit: Value = client
        .get(server.url("/api/audit?limit=1000"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // startup + three flags
    assert_eq!(audit["count"], 4);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let server = GatewayTestServer::start(true).await;
    let client = reqwest::Client::new();

    let response = client
        .request(reqwest::Method::OPTIONS, server.url("/api/chat"))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-credentials")
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
}
