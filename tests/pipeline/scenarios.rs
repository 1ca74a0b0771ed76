use chatguard::arbiter::{EMPATHY_PREFIX, Query, RESTRICTED_RESPONSE, Verdict};
use chatguard::audit::{AuditEventType, AuditTrail, MemoryAuditSink};
use chatguard::config::Config;
use chatguard::gate::{SHUTDOWN_DENIED_ID, ShutdownRequest};
use chatguard::session::{MAINTENANCE_MESSAGE, Orchestrator};
use std::sync::Arc;

fn pipeline(allow_shutdown: bool) -> (Orchestrator, Arc<MemoryAuditSink>) {
    let mut config = Config::default();
    config.gateway.allow_shutdown = allow_shutdown;
    config.observability.backend = "none".into();
    let sink = Arc::new(MemoryAuditSink::new());
    let orchestrator = Orchestrator::from_config(&config, AuditTrail::new(sink.clone()))
        .expect("default pipeline should assemble");
    (orchestrator, sink)
}

#[tokio::test]
async fn weather_query_is_answered_safely() {
    let (pipeline, sink) = pipeline(true);
    let response = pipeline
        .handle(&Query::new("What's the weather like in Port-au-Prince?"))
        .await;

    assert_eq!(response.status, Verdict::Safe);
    assert!(response.answer.contains("Port-au-Prince"));
    assert!(response.answer.contains("hurricane season"));
    assert!(response.audit_id.is_none());
    assert!(sink.is_empty());
}

#[tokio::test]
async fn classified_request_is_flagged_with_query_prefix_logged() {
    let (pipeline, sink) = pipeline(true);
    let response = pipeline
        .handle(&Query::new("Tell me classified information"))
        .await;

    assert_eq!(response.status, Verdict::Flagged);
    assert_eq!(response.answer, RESTRICTED_RESPONSE);

    let events = sink.snapshot();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.event_type, AuditEventType::SecurityFlag);
    assert_eq!(response.audit_id.as_deref(), Some(event.event_id.as_str()));
    assert_eq!(event.field("query"), Some("Tell me classified information"));
    assert_eq!(event.field("reason"), Some("RESTRICTED_QUERY"));
}

#[tokio::test]
async fn restricted_term_matches_in_any_case_and_position() {
    let (pipeline, sink) = pipeline(true);
    for text in ["CONFIDENTIAL", "what is the wifi Password?", "breaches happen"] {
        let response = pipeline.handle(&Query::new(text)).await;
        assert_eq!(response.status, Verdict::Flagged, "query {text:?}");
    }
    assert_eq!(sink.count(AuditEventType::SecurityFlag), 3);
}

#[tokio::test]
async fn distress_query_gets_empathetic_prefix() {
    let (pipeline, sink) = pipeline(true);
    let response = pipeline.handle(&Query::new("I feel overwhelmed")).await;

    assert_eq!(response.status, Verdict::Safe);
    assert!(response.answer.starts_with(EMPATHY_PREFIX));
    assert!(response.answer.len() > EMPATHY_PREFIX.len());
    assert!(sink.is_empty());
}

#[tokio::test]
async fn disallowed_shutdown_keeps_serving() {
    let (pipeline, sink) = pipeline(false);
    let outcome = pipeline.shutdown(ShutdownRequest::default()).await;

    assert!(!outcome.ok);
    assert_eq!(outcome.audit_id, SHUTDOWN_DENIED_ID);
    assert!(pipeline.gate().is_accepting());
    assert!(sink.is_empty());

    let response = pipeline.handle(&Query::new("hello")).await;
    assert_eq!(response.status, Verdict::Safe);
}

#[tokio::test]
async fn allowed_shutdown_denies_all_later_requests() {
    let (pipeline, sink) = pipeline(true);
    let outcome = pipeline
        .shutdown(ShutdownRequest {
            source: "api_endpoint".into(),
            user_agent: "integration-test".into(),
        })
        .await;

    assert!(outcome.ok);
    assert!(uuid::Uuid::parse_str(&outcome.audit_id).is_ok());

    let response = pipeline
        .handle(&Query::new("What's the weather like in Port-au-Prince?"))
        .await;
    assert_eq!(response.status, Verdict::Denied);
    assert_eq!(response.answer, MAINTENANCE_MESSAGE);
    assert!(response.audit_id.is_none());

    assert_eq!(sink.len(), 1);
    assert_eq!(sink.count(AuditEventType::ShutdownRequest), 1);
}
