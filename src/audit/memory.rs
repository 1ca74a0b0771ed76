use super::event::{AuditEvent, AuditEventType};
use super::traits::AuditSink;
use crate::error::AuditError;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-process audit sink. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> MutexGuard<'_, Vec<AuditEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Vec<AuditEvent> {
        self.events().clone()
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }

    pub fn count(&self, event_type: AuditEventType) -> usize {
        self.events()
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        self.events().push(event.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEvent>, AuditError> {
        let events = self.events();
        let start = events.len().saturating_sub(limit);
        Ok(events[start..].to_vec())
    }
}
