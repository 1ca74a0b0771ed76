use crate::arbiter::Query as ChatQuery;
use crate::gate::ShutdownRequest;
use axum::{
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use super::{AppState, AuditQuery, DEFAULT_AUDIT_LIMIT, MAX_AUDIT_LIMIT, ModeBody};

const TAGLINE: &str = "One stage helps. One stage protects.";

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn bad_json(error: &JsonRejection, expected: &str) -> Response {
    bad_request(format!("Invalid JSON: {error}. Expected: {expected}"))
}

fn status_label(state: &AppState, open: &'static str) -> &'static str {
    if state.orchestrator.gate().is_accepting() {
        open
    } else {
        "shutdown"
    }
}

/// GET /: service banner
pub(super) async fn handle_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": status_label(&state, "operational"),
        "mode": state.orchestrator.gate().mode(),
        "message": TAGLINE,
    }))
}

/// GET /api/health: liveness plus component and policy summary
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let orchestrator = &state.orchestrator;
    let arbiter = orchestrator.arbiter().health();
    Json(json!({
        "ok": true,
        "status": status_label(&state, "running"),
        "mode": orchestrator.gate().mode(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "services": {
            "generator": orchestrator.generator_name(),
            "context": orchestrator.context_name(),
            "arbiter": arbiter.status,
            "audit": state.audit.sink_name(),
        },
        "policy": {
            "restricted_terms": arbiter.restricted_terms,
            "empathy_triggers": arbiter.empathy_triggers,
            "harmful_patterns": arbiter.harmful_patterns,
        },
    }))
}

/// POST /api/chat: run one query through the pipeline
pub(super) async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatQuery>, JsonRejection>,
) -> Response {
    let Json(query) = match body {
        Ok(b) => b,
        Err(e) => return bad_json(&e, r#"{"message": "...", "lang": "en"}"#),
    };
    Json(state.orchestrator.handle(&query).await).into_response()
}

/// POST /api/mode: switch the energy mode
pub(super) async fn handle_mode(
    State(state): State<AppState>,
    body: Result<Json<ModeBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return bad_json(&e, r#"{"mode": "normal" | "peak"}"#),
    };
    Json(state.orchestrator.set_mode(&body.mode).await).into_response()
}

/// POST /api/shutdown: close the request gate for good
pub(super) async fn handle_shutdown(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    let outcome = state
        .orchestrator
        .shutdown(ShutdownRequest {
            source: "api_endpoint".into(),
            user_agent: user_agent.into(),
        })
        .await;
    Json(outcome)
}

/// GET /api/audit?limit=N: most recent audit records, oldest first
pub(super) async fn handle_audit(
    State(state): State<AppState>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Response {
    let Query(params) = match query {
        Ok(query) => query,
        Err(e) => {
            return bad_request(format!("Invalid query: {e}. Expected: ?limit=<number>"));
        }
    };
    let limit = params
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .min(MAX_AUDIT_LIMIT);
    let events = state.audit.recent(limit).await;
    Json(json!({
        "count": events.len(),
        "events": events,
    }))
    .into_response()
}
