//! Per-request pipeline: context → draft → arbiter, under the request gate.

pub mod fallback;

pub use fallback::{
    GENERATION_FALLBACK, GENERIC_FALLBACK, KNOWLEDGE_BASE_FALLBACK, fallback_draft,
};

use crate::arbiter::{Arbiter, ChatResponse, Query};
use crate::audit::AuditTrail;
use crate::config::{Config, RuntimeConfig};
use crate::context::{ContextProvider, create_context_provider, render_context};
use crate::error::{CollaboratorError, CollaboratorKind};
use crate::gate::{
    ModeUpdate, RequestGate, SHUTDOWN_COMPLETE, ShutdownOutcome, ShutdownRequest,
};
use crate::generator::{AnswerGenerator, create_generator};
use crate::observability::{Observer, ObserverEvent, ObserverMetric, create_observer};
use crate::policy::PolicySet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const MAINTENANCE_MESSAGE: &str =
    "System is currently shut down for maintenance. Please try again later.";

/// Per-call budgets for the collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBudgets {
    pub context_timeout: Duration,
    pub generator_timeout: Duration,
    pub max_context_results: usize,
}

impl SessionBudgets {
    pub fn from_runtime(runtime: &RuntimeConfig) -> Self {
        Self {
            context_timeout: Duration::from_millis(runtime.context_timeout_ms),
            generator_timeout: Duration::from_millis(runtime.generator_timeout_ms),
            max_context_results: runtime.max_context_results.max(1),
        }
    }
}

impl Default for SessionBudgets {
    fn default() -> Self {
        Self::from_runtime(&RuntimeConfig::default())
    }
}

/// Run `call` under `budget`; expiry becomes a `Timeout` for `component`.
async fn bounded<T, F>(
    component: CollaboratorKind,
    budget: Duration,
    call: F,
) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorError::Timeout {
            component,
            after_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Composes the collaborators and the arbiter for each request. Cheap to
/// share behind an `Arc`; holds no per-request state.
pub struct Orchestrator {
    gate: Arc<RequestGate>,
    context: Arc<dyn ContextProvider>,
    generator: Arc<dyn AnswerGenerator>,
    arbiter: Arbiter,
    observer: Arc<dyn Observer>,
    budgets: SessionBudgets,
}

impl Orchestrator {
    pub fn new(
        gate: Arc<RequestGate>,
        context: Arc<dyn ContextProvider>,
        generator: Arc<dyn AnswerGenerator>,
        arbiter: Arbiter,
        observer: Arc<dyn Observer>,
        budgets: SessionBudgets,
    ) -> Self {
        Self {
            gate,
            context,
            generator,
            arbiter,
            observer,
            budgets,
        }
    }

    /// Wire every component from configuration, sharing one audit trail.
    pub fn from_config(config: &Config, audit: AuditTrail) -> anyhow::Result<Self> {
        let gate = Arc::new(RequestGate::new(
            config.runtime.energy_mode,
            config.gateway.allow_shutdown,
            audit.clone(),
        ));
        let arbiter = Arbiter::new(Arc::new(PolicySet::from_config(&config.policy)), audit);
        let generator = create_generator(config)?;
        let context = create_context_provider(config);
        tracing::info!(
            context = context.name(),
            generator = generator.name(),
            mode = %gate.mode(),
            allow_shutdown = gate.allows_shutdown(),
            "pipeline assembled"
        );
        Ok(Self::new(
            gate,
            context,
            generator,
            arbiter,
            create_observer(&config.observability),
            SessionBudgets::from_runtime(&config.runtime),
        ))
    }

    pub fn gate(&self) -> &RequestGate {
        &self.gate
    }

    pub fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }

    pub fn context_name(&self) -> &str {
        self.context.name()
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Run one query through the pipeline.
    pub async fn handle(&self, query: &Query) -> ChatResponse {
        let started = Instant::now();

        if !self.gate.is_accepting() {
            tracing::debug!("request refused, gate closed");
            let response = ChatResponse::denied(MAINTENANCE_MESSAGE);
            self.record_verdict(&response, started);
            return response;
        }

        let (context_text, context_failed) = self.fetch_context(&query.text).await;
        let mode = self.gate.mode();

        let generated = bounded(
            CollaboratorKind::GenerationEngine,
            self.budgets.generator_timeout,
            self.generator.generate(&query.text, &context_text, mode),
        )
        .await
        .and_then(|draft| {
            if draft.trim().is_empty() {
                Err(CollaboratorError::malformed(
                    CollaboratorKind::GenerationEngine,
                    "empty draft",
                ))
            } else {
                Ok(draft)
            }
        });

        let draft = match generated {
            Ok(draft) => draft,
            Err(error) => {
                self.record_fallback(&error);
                fallback_draft(&error, context_failed).to_string()
            }
        };

        let response = self.arbiter.evaluate(&query.text, &draft).await;
        self.record_verdict(&response, started);
        response
    }

    /// Rendered context plus whether retrieval failed. Failure and timeout
    /// both degrade to the empty rendering.
    async fn fetch_context(&self, query: &str) -> (String, bool) {
        let max_results = self.budgets.max_context_results;
        let searched = bounded(
            CollaboratorKind::ContextStore,
            self.budgets.context_timeout,
            self.context.search(query, max_results),
        )
        .await;

        match searched {
            Ok(mut passages) => {
                passages.truncate(max_results);
                let count = u64::try_from(passages.len()).unwrap_or(u64::MAX);
                self.observer
                    .record_metric(&ObserverMetric::ContextPassages(count));
                (render_context(&passages), false)
            }
            Err(error) => {
                self.record_fallback(&error);
                (render_context(&[]), true)
            }
        }
    }

    pub async fn set_mode(&self, requested: &str) -> ModeUpdate {
        let update = self.gate.set_mode(requested).await;
        if let Some(old_mode) = update.previous_mode {
            self.observer.record_event(&ObserverEvent::ModeChanged {
                old_mode,
                new_mode: update.mode,
            });
        }
        update
    }

    pub async fn shutdown(&self, request: ShutdownRequest) -> ShutdownOutcome {
        let outcome = self.gate.shutdown(request).await;
        if outcome.ok && outcome.message == SHUTDOWN_COMPLETE {
            self.observer.record_event(&ObserverEvent::GateClosed {
                audit_id: outcome.audit_id.clone(),
            });
        }
        outcome
    }

    fn record_fallback(&self, error: &CollaboratorError) {
        tracing::warn!(component = %error.component(), %error, "collaborator degraded");
        self.observer.record_event(&ObserverEvent::CollaboratorFallback {
            component: error.component(),
            reason: error.to_string(),
        });
    }

    fn record_verdict(&self, response: &ChatResponse, started: Instant) {
        let duration = started.elapsed();
        self.observer.record_event(&ObserverEvent::Verdict {
            status: response.status,
            duration,
        });
        self.observer
            .record_metric(&ObserverMetric::RequestLatency(duration));
    }
}
