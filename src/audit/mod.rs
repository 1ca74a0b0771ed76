//! Append-only audit trail for consequential decisions.

pub mod event;
pub mod jsonl;
pub mod memory;
pub mod trail;
pub mod traits;

pub use event::{AuditEvent, AuditEventType, AuditPayload, FlagReason};
pub use jsonl::JsonlAuditSink;
pub use memory::MemoryAuditSink;
pub use trail::{AUDIT_QUERY_PREFIX_CHARS, AuditTrail};
pub use traits::AuditSink;

use crate::config::Config;
use std::sync::Arc;

/// Factory: create the audit sink named by `[audit] backend`.
pub fn create_audit_sink(config: &Config) -> Arc<dyn AuditSink> {
    match config.audit.backend.as_str() {
        "memory" => Arc::new(MemoryAuditSink::new()),
        "jsonl" => Arc::new(JsonlAuditSink::new(config.audit_log_path())),
        other => {
            tracing::warn!(
                "Unknown audit backend '{other}', falling back to jsonl at {}",
                config.audit_log_path().display()
            );
            Arc::new(JsonlAuditSink::new(config.audit_log_path()))
        }
    }
}
