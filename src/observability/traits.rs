use crate::arbiter::Verdict;
use crate::error::CollaboratorKind;
use crate::gate::OperatingMode;
use std::time::Duration;

/// Events the observer can record
#[derive(Debug, Clone)]
pub enum ObserverEvent {
    Verdict {
        status: Verdict,
        duration: Duration,
    },
    CollaboratorFallback {
        component: CollaboratorKind,
        reason: String,
    },
    GateClosed {
        audit_id: String,
    },
    ModeChanged {
        old_mode: OperatingMode,
        new_mode: OperatingMode,
    },
}

/// Numeric metrics
#[derive(Debug, Clone)]
pub enum ObserverMetric {
    RequestLatency(Duration),
    ContextPassages(u64),
}

/// Core observability trait, one implementation per backend
pub trait Observer: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &ObserverEvent);

    /// Record a numeric metric
    fn record_metric(&self, metric: &ObserverMetric);

    /// Flush any buffered data (no-op for most backends)
    fn flush(&self) {}

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}
