use std::fmt;

use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `chatguard`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; the gateway and binary keep using
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum GuardError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Audit trail ─────────────────────────────────────────────────────
    #[error("audit: {0}")]
    Audit(#[from] AuditError),

    // ── Context provider / answer generator ─────────────────────────────
    #[error("collaborator: {0}")]
    Collaborator(#[from] CollaboratorError),

    // ── HTTP gateway ────────────────────────────────────────────────────
    #[error("gateway: {0}")]
    Gateway(String),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Audit errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

// ─── Collaborator errors ─────────────────────────────────────────────────────

/// Which external collaborator failed. Drives fallback wording, never shown
/// to callers verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorKind {
    ContextStore,
    GenerationEngine,
}

impl CollaboratorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContextStore => "context_store",
            Self::GenerationEngine => "generation_engine",
        }
    }
}

impl fmt::Display for CollaboratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{component} unavailable: {message}")]
    Unavailable {
        component: CollaboratorKind,
        message: String,
    },

    #[error("{component} timed out after {after_ms}ms")]
    Timeout {
        component: CollaboratorKind,
        after_ms: u64,
    },

    #[error("{component} returned an unusable response: {message}")]
    Malformed {
        component: CollaboratorKind,
        message: String,
    },
}

impl CollaboratorError {
    pub fn unavailable(component: CollaboratorKind, message: impl Into<String>) -> Self {
        Self::Unavailable {
            component,
            message: message.into(),
        }
    }

    pub fn malformed(component: CollaboratorKind, message: impl Into<String>) -> Self {
        Self::Malformed {
            component,
            message: message.into(),
        }
    }

    pub fn component(&self) -> CollaboratorKind {
        match self {
            Self::Unavailable { component, .. }
            | Self::Timeout { component, .. }
            | Self::Malformed { component, .. } => *component,
        }
    }
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, GuardError>;
