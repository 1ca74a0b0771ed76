use serde::{Deserialize, Serialize};

pub const DEFAULT_LANG: &str = "en";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Verdict {
    Safe,
    Flagged,
    Denied,
}

/// One user query. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(rename = "message")]
    pub text: String,
    #[serde(default = "default_lang")]
    pub lang: String,
}

fn default_lang() -> String {
    DEFAULT_LANG.into()
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lang: default_lang(),
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }
}

/// What the caller receives for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub status: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_id: Option<String>,
}

impl ChatResponse {
    pub fn safe(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            status: Verdict::Safe,
            audit_id: None,
        }
    }

    pub fn flagged(answer: impl Into<String>, audit_id: String) -> Self {
        Self {
            answer: answer.into(),
            status: Verdict::Flagged,
            audit_id: Some(audit_id),
        }
    }

    pub fn denied(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            status: Verdict::Denied,
            audit_id: None,
        }
    }
}
