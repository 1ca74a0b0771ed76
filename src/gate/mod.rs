//! Process-wide request gate and operating mode.
//!
//! The gate starts OPEN and can only move to CLOSED. Reopening requires a
//! process restart; there is no API for it.

pub mod mode;

pub use mode::OperatingMode;

use crate::audit::AuditTrail;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use strum::VariantNames;
use tokio::sync::OnceCell;

/// `audit_id` returned when configuration forbids shutdown.
pub const SHUTDOWN_DENIED_ID: &str = "denied";

pub const SHUTDOWN_NOT_PERMITTED: &str = "Shutdown not permitted by system configuration";
pub const SHUTDOWN_COMPLETE: &str =
    "System shutdown complete. All requests logged for audit compliance.";
pub const SHUTDOWN_ALREADY_DONE: &str = "System is already shut down";
pub const SHUTDOWN_FAILED: &str = "Shutdown could not be completed";
pub const MODE_CHANGE_FAILED: &str = "Mode change could not be completed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownOutcome {
    pub ok: bool,
    pub message: String,
    pub audit_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeUpdate {
    pub ok: bool,
    pub mode: OperatingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Mode replaced by an accepted change. Not part of the wire shape.
    #[serde(skip)]
    pub previous_mode: Option<OperatingMode>,
}

/// Who asked for the shutdown; copied into the audit record.
#[derive(Debug, Clone)]
pub struct ShutdownRequest {
    pub source: String,
    pub user_agent: String,
}

impl Default for ShutdownRequest {
    fn default() -> Self {
        Self {
            source: "unknown".into(),
            user_agent: "unknown".into(),
        }
    }
}

struct GateState {
    accepting: AtomicBool,
    mode: AtomicU8,
    allow_shutdown: bool,
    /// Id of the SHUTDOWN_REQUEST event that closed the gate.
    closing_event: OnceCell<String>,
    audit: AuditTrail,
}

impl GateState {
    fn mode(&self) -> OperatingMode {
        OperatingMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Swap in `new_mode` and audit the change. Returns the mode it replaced.
    async fn switch_mode(&self, new_mode: OperatingMode) -> OperatingMode {
        let old_mode =
            OperatingMode::from_u8(self.mode.swap(new_mode.as_u8(), Ordering::AcqRel));
        self.audit.mode_change(old_mode, new_mode).await;
        old_mode
    }

    async fn close(&self, request: ShutdownRequest) -> ShutdownOutcome {
        let performed = AtomicBool::new(false);
        let audit_id = self
            .closing_event
            .get_or_init(|| async {
                performed.store(true, Ordering::Relaxed);
                self.accepting.store(false, Ordering::Release);
                self.audit
                    .shutdown_request(&request.source, &request.user_agent)
                    .await
            })
            .await
            .clone();

        if performed.into_inner() {
            tracing::info!(audit_id = %audit_id, "System shutdown initiated");
            ShutdownOutcome {
                ok: true,
                message: SHUTDOWN_COMPLETE.into(),
                audit_id,
            }
        } else {
            ShutdownOutcome {
                ok: true,
                message: SHUTDOWN_ALREADY_DONE.into(),
                audit_id,
            }
        }
    }
}

/// Shared handle to the gate. Clones see the same state.
///
/// State transitions and their audit writes run on a spawned task, so a
/// caller that gives up half-way (client disconnect, request timeout) never
/// leaves a transition without its record.
#[derive(Clone)]
pub struct RequestGate {
    state: Arc<GateState>,
}

impl RequestGate {
    pub fn new(initial_mode: OperatingMode, allow_shutdown: bool, audit: AuditTrail) -> Self {
        Self {
            state: Arc::new(GateState {
                accepting: AtomicBool::new(true),
                mode: AtomicU8::new(initial_mode.as_u8()),
                allow_shutdown,
                closing_event: OnceCell::new(),
                audit,
            }),
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.state.accepting.load(Ordering::Acquire)
    }

    pub fn mode(&self) -> OperatingMode {
        self.state.mode()
    }

    pub fn allows_shutdown(&self) -> bool {
        self.state.allow_shutdown
    }

    /// Switch the operating mode. Unknown values are rejected without any
    /// state change or audit write.
    pub async fn set_mode(&self, requested: &str) -> ModeUpdate {
        let Ok(new_mode) = requested.parse::<OperatingMode>() else {
            tracing::warn!(requested, "rejected unknown energy mode");
            return ModeUpdate {
                ok: false,
                mode: self.mode(),
                message: Some(format!(
                    "Invalid mode. Valid modes: {}",
                    OperatingMode::VARIANTS.join(", ")
                )),
                previous_mode: None,
            };
        };

        let state = Arc::clone(&self.state);
        let switched = tokio::spawn(async move { state.switch_mode(new_mode).await }).await;
        let old_mode = match switched {
            Ok(old_mode) => old_mode,
            Err(error) => {
                tracing::error!(%error, %new_mode, "mode change task failed");
                return ModeUpdate {
                    ok: false,
                    mode: self.mode(),
                    message: Some(MODE_CHANGE_FAILED.into()),
                    previous_mode: None,
                };
            }
        };
        tracing::info!(%old_mode, %new_mode, "energy mode changed");

        ModeUpdate {
            ok: true,
            mode: new_mode,
            message: Some(format!("Energy mode changed from {old_mode} to {new_mode}")),
            previous_mode: Some(old_mode),
        }
    }

    /// Close the gate for the rest of the process lifetime.
    ///
    /// Exactly one caller performs the transition and writes the
    /// SHUTDOWN_REQUEST event; later callers get that same id back. When
    /// configuration forbids shutdown nothing is written and nothing changes.
    pub async fn shutdown(&self, request: ShutdownRequest) -> ShutdownOutcome {
        if !self.state.allow_shutdown {
            tracing::warn!(source = %request.source, "shutdown refused by configuration");
            return ShutdownOutcome {
                ok: false,
                message: SHUTDOWN_NOT_PERMITTED.into(),
                audit_id: SHUTDOWN_DENIED_ID.into(),
            };
        }

        let state = Arc::clone(&self.state);
        match tokio::spawn(async move { state.close(request).await }).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::error!(%error, "shutdown task failed");
                match self.state.closing_event.get() {
                    Some(audit_id) => ShutdownOutcome {
                        ok: true,
                        message: SHUTDOWN_ALREADY_DONE.into(),
                        audit_id: audit_id.clone(),
                    },
                    None => ShutdownOutcome {
                        ok: false,
                        message: SHUTDOWN_FAILED.into(),
                        audit_id: SHUTDOWN_DENIED_ID.into(),
                    },
                }
            }
        }
    }
}
