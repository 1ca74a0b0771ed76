use super::traits::{Observer, ObserverEvent, ObserverMetric};
use tracing::{info, warn};

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Log-based observer; writes through `tracing`
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::Verdict { status, duration } => {
                info!(status = %status, duration_ms = millis(*duration), "pipeline.verdict");
            }
            ObserverEvent::CollaboratorFallback { component, reason } => {
                warn!(component = %component, reason = %reason, "pipeline.fallback");
            }
            ObserverEvent::GateClosed { audit_id } => {
                info!(audit_id = %audit_id, "gate.closed");
            }
            ObserverEvent::ModeChanged { old_mode, new_mode } => {
                info!(old_mode = %old_mode, new_mode = %new_mode, "gate.mode_changed");
            }
        }
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        match metric {
            ObserverMetric::RequestLatency(d) => {
                info!(latency_ms = millis(*d), "metric.request_latency");
            }
            ObserverMetric::ContextPassages(n) => {
                info!(passages = n, "metric.context_passages");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}
