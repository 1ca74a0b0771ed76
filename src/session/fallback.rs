use crate::error::CollaboratorError;

pub const KNOWLEDGE_BASE_FALLBACK: &str = "I'm having trouble accessing my knowledge base right now, but I can still help you! What's your question about?";
pub const GENERATION_FALLBACK: &str =
    "My AI systems are experiencing a brief hiccup, but I'm still here to assist you with your questions!";
pub const GENERIC_FALLBACK: &str =
    "I encountered a technical issue, but let me try to help you anyway. What would you like to know?";

/// Draft to use when the generator did not deliver one. The wording depends
/// only on the failure category; error detail never reaches the caller.
pub fn fallback_draft(generator_error: &CollaboratorError, context_failed: bool) -> &'static str {
    match generator_error {
        CollaboratorError::Malformed { .. } => GENERIC_FALLBACK,
        CollaboratorError::Unavailable { .. } | CollaboratorError::Timeout { .. } => {
            if context_failed {
                KNOWLEDGE_BASE_FALLBACK
            } else {
                GENERATION_FALLBACK
            }
        }
    }
}
