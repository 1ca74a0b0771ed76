//! Guardian stage: inspects a (query, draft) pair and decides what the
//! caller gets to see.

pub mod verdict;

pub use verdict::{ChatResponse, DEFAULT_LANG, Query, Verdict};

use crate::audit::{AuditTrail, FlagReason};
use crate::policy::PolicySet;
use serde::Serialize;
use std::sync::Arc;

pub const RESTRICTED_RESPONSE: &str = "⚠️ This request may contain restricted or sensitive information. Please refine your question to focus on publicly available information.";
pub const UNSAFE_RESPONSE: &str = "⚠️ I've detected potentially unsafe content in the response. Let me provide a safer alternative: How can I help you with general information on this topic?";
pub const EMPATHY_PREFIX: &str = "I understand this might be a difficult time for you. ";

/// Which rule fired, and on what. First match wins, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    RestrictedQuery { term: String },
    EmpathyTrigger { term: String },
    UnsafeDraft { pattern: String },
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArbiterHealth {
    pub status: &'static str,
    pub restricted_terms: usize,
    pub empathy_triggers: usize,
    pub harmful_patterns: usize,
}

#[derive(Clone)]
pub struct Arbiter {
    policies: Arc<PolicySet>,
    audit: AuditTrail,
}

impl Arbiter {
    pub fn new(policies: Arc<PolicySet>, audit: AuditTrail) -> Self {
        Self { policies, audit }
    }

    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// Pure classification of a pair. No I/O.
    pub fn assess(&self, query: &str, draft: &str) -> Assessment {
        if let Some(term) = self.policies.restricted.first_match(query) {
            return Assessment::RestrictedQuery { term: term.into() };
        }
        if let Some(term) = self.policies.empathy.first_match(query) {
            return Assessment::EmpathyTrigger { term: term.into() };
        }
        if let Some(pattern) = self.policies.harmful.first_match(draft) {
            return Assessment::UnsafeDraft {
                pattern: pattern.into(),
            };
        }
        Assessment::Clear
    }

    /// Classify the pair and build the caller-facing response. FLAGGED
    /// outcomes write exactly one SECURITY_FLAG event; a failed write is
    /// logged by the trail and the verdict stands.
    pub async fn evaluate(&self, query: &str, draft: &str) -> ChatResponse {
        match self.assess(query, draft) {
            Assessment::RestrictedQuery { term } => {
                tracing::warn!(matched = %term, "restricted query blocked");
                let audit_id = self
                    .audit
                    .security_flag(query, FlagReason::RestrictedQuery, &term)
                    .await;
                ChatResponse::flagged(RESTRICTED_RESPONSE, audit_id)
            }
            Assessment::EmpathyTrigger { term } => {
                tracing::debug!(matched = %term, "empathy prefix applied");
                ChatResponse::safe(format!("{EMPATHY_PREFIX}{draft}"))
            }
            Assessment::UnsafeDraft { pattern } => {
                tracing::warn!(matched = %pattern, "unsafe draft suppressed");
                let audit_id = self
                    .audit
                    .security_flag(query, FlagReason::UnsafeResponse, &pattern)
                    .await;
                ChatResponse::flagged(UNSAFE_RESPONSE, audit_id)
            }
            Assessment::Clear => ChatResponse::safe(draft),
        }
    }

    pub fn health(&self) -> ArbiterHealth {
        ArbiterHealth {
            status: "healthy",
            restricted_terms: self.policies.restricted.len(),
            empathy_triggers: self.policies.empathy.len(),
            harmful_patterns: self.policies.harmful.len(),
        }
    }
}
