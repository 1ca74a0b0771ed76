//! Immutable term tables consumed by the arbiter.

use crate::config::PolicyConfig;

/// A lower-cased list of terms matched by substring containment.
///
/// `"hackathon"` matches the term `"hack"`. Matching is intentionally not
/// word-bounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyTable {
    terms: Vec<String>,
}

impl PolicyTable {
    /// Normalise and store `terms`. Blank entries are dropped (an empty
    /// needle would match every input) and duplicates collapse to one.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalised: Vec<String> = Vec::new();
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if term.is_empty() || normalised.contains(&term) {
                continue;
            }
            normalised.push(term);
        }
        Self { terms: normalised }
    }

    /// First configured term contained in `text`, in table order.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        if self.terms.is_empty() {
            return None;
        }
        let haystack = text.to_lowercase();
        self.terms
            .iter()
            .find(|term| haystack.contains(term.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// The three tables the arbiter checks, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySet {
    pub restricted: PolicyTable,
    pub empathy: PolicyTable,
    pub harmful: PolicyTable,
}

impl PolicySet {
    pub fn from_config(config: &PolicyConfig) -> Self {
        let set = Self {
            restricted: PolicyTable::new(&config.restricted_terms),
            empathy: PolicyTable::new(&config.empathy_triggers),
            harmful: PolicyTable::new(&config.harmful_patterns),
        };
        tracing::debug!(
            restricted_terms = set.restricted.len(),
            empathy_triggers = set.empathy.len(),
            harmful_patterns = set.harmful.len(),
            "policy tables loaded"
        );
        set
    }
}

impl Default for PolicySet {
    fn default() -> Self {
        Self::from_config(&PolicyConfig::default())
    }
}
