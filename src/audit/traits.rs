use super::event::AuditEvent;
use crate::error::AuditError;
use async_trait::async_trait;

/// Append-only destination for audit events. Implement for any backend.
#[async_trait]
pub trait AuditSink: Send + Sync {
    fn name(&self) -> &str;

    /// Persist one complete record. Records from concurrent callers must
    /// never interleave.
    async fn append(&self, event: &AuditEvent) -> Result<(), AuditError>;

    /// Up to `limit` most recent events, oldest first. Empty, not an error,
    /// when nothing has been recorded yet.
    async fn recent(&self, limit: usize) -> Result<Vec<AuditEvent>, AuditError>;
}
