use super::{ContextProvider, Passage};
use crate::error::CollaboratorError;
use async_trait::async_trait;

#[derive(Debug, Clone)]
struct Document {
    title: String,
    content: String,
    source: String,
}

/// Small in-process corpus scored by keyword overlap.
pub struct LocalCorpus {
    documents: Vec<Document>,
}

impl LocalCorpus {
    /// `(title, content, source)` triples.
    pub fn new<'a>(documents: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>) -> Self {
        Self {
            documents: documents
                .into_iter()
                .map(|(title, content, source)| Document {
                    title: title.into(),
                    content: content.into(),
                    source: source.into(),
                })
                .collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new([
            (
                "Haiti Disaster Response Guidelines",
                "Port-au-Prince weather patterns show frequent afternoon thunderstorms during hurricane season (June-November). Emergency responders should monitor local conditions and prepare for rapid weather changes.",
                "Haiti Emergency Management",
            ),
            (
                "Naval Training Protocol - Basic Navigation",
                "Standard maritime navigation requires continuous monitoring of weather conditions, especially in Caribbean waters where conditions can change rapidly.",
                "Naval Training Manual (Unclassified)",
            ),
            (
                "Multilingual Support Guidelines",
                "When providing assistance in Haiti, responders should be prepared to communicate in French, Haitian Creole, and English to ensure effective community engagement.",
                "International Response Guidelines",
            ),
        ])
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// +2 for each query word inside the title, +1 for each inside the
    /// content. Substring containment, same as the policy tables.
    fn score(document: &Document, words: &[String]) -> u32 {
        let title = document.title.to_lowercase();
        let content = document.content.to_lowercase();
        words
            .iter()
            .map(|word| {
                let mut score = 0;
                if title.contains(word.as_str()) {
                    score += 2;
                }
                if content.contains(word.as_str()) {
                    score += 1;
                }
                score
            })
            .sum()
    }

    pub fn rank(&self, query: &str, max_results: usize) -> Vec<Passage> {
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let mut scored: Vec<(u32, &Document)> = self
            .documents
            .iter()
            .map(|doc| (Self::score(doc, &words), doc))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable sort keeps corpus order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(max_results)
            .map(|(score, doc)| Passage {
                title: doc.title.clone(),
                content: doc.content.clone(),
                source: doc.source.clone(),
                score: f64::from(score),
            })
            .collect()
    }
}

#[async_trait]
impl ContextProvider for LocalCorpus {
    fn name(&self) -> &str {
        "local"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Passage>, CollaboratorError> {
        Ok(self.rank(query, max_results))
    }
}
