use super::event::{AuditEvent, AuditEventType, AuditPayload, FlagReason, payload};
use super::traits::AuditSink;
use crate::gate::OperatingMode;
use crate::utils::prefix_chars;
use serde_json::json;
use std::sync::Arc;

/// Queries are cut to this many characters before they reach the log.
pub const AUDIT_QUERY_PREFIX_CHARS: usize = 100;

/// Issues audit events and hands them to the configured sink.
///
/// Recording never fails from the caller's point of view: the event id is
/// returned even when the sink rejects the write, and the failure is only
/// logged. Responses stay available when the audit log is not.
#[derive(Clone)]
pub struct AuditTrail {
    sink: Arc<dyn AuditSink>,
}

impl AuditTrail {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    pub async fn record(&self, event_type: AuditEventType, payload: AuditPayload) -> String {
        let event = AuditEvent::new(event_type, payload);
        match self.sink.append(&event).await {
            Ok(()) => {
                tracing::info!(
                    event_id = %event.event_id,
                    event_type = %event_type,
                    "audit.recorded"
                );
            }
            Err(error) => {
                tracing::error!(
                    event_id = %event.event_id,
                    event_type = %event_type,
                    sink = self.sink.name(),
                    %error,
                    "failed to write audit record"
                );
            }
        }
        event.event_id
    }

    /// Most recent events, oldest first. Read failures degrade to empty.
    pub async fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        match self.sink.recent(limit).await {
            Ok(events) => events,
            Err(error) => {
                tracing::error!(sink = self.sink.name(), %error, "failed to read audit log");
                Vec::new()
            }
        }
    }

    pub async fn security_flag(&self, query: &str, reason: FlagReason, matched: &str) -> String {
        self.record(
            AuditEventType::SecurityFlag,
            payload(json!({
                "query": prefix_chars(query, AUDIT_QUERY_PREFIX_CHARS),
                "reason": reason.as_str(),
                "matched": matched,
                "action": "blocked",
                "service": "arbiter",
            })),
        )
        .await
    }

    pub async fn shutdown_request(&self, source: &str, user_agent: &str) -> String {
        self.record(
            AuditEventType::ShutdownRequest,
            payload(json!({
                "source": source,
                "user_agent": user_agent,
                "message": "System shutdown requested",
            })),
        )
        .await
    }

    pub async fn mode_change(&self, old_mode: OperatingMode, new_mode: OperatingMode) -> String {
        self.record(
            AuditEventType::ModeChange,
            payload(json!({
                "old_mode": old_mode.to_string(),
                "new_mode": new_mode.to_string(),
            })),
        )
        .await
    }

    pub async fn system_startup(&self, version: &str, mode: OperatingMode) -> String {
        self.record(
            AuditEventType::SystemStartup,
            payload(json!({
                "version": version,
                "energy_mode": mode.to_string(),
            })),
        )
        .await
    }

    pub async fn system_shutdown(&self, reason: &str) -> String {
        self.record(
            AuditEventType::SystemShutdown,
            payload(json!({ "reason": reason })),
        )
        .await
    }
}
