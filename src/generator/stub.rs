use super::AnswerGenerator;
use crate::context::EMPTY_CONTEXT;
use crate::error::CollaboratorError;
use crate::gate::OperatingMode;
use crate::utils::prefix_chars;
use async_trait::async_trait;

const WEATHER_WORDS: [&str; 4] = ["weather", "temperature", "rain", "climate"];
const WEATHER_PLACES: [&str; 2] = ["port-au-prince", "haiti"];
const DISTRESS_WORDS: [&str; 4] = ["overwhelmed", "stressed", "anxious", "help"];

const CONTEXT_EXCERPT_CHARS: usize = 150;

pub const HAITI_WEATHER_ANSWER: &str = "Port-au-Prince typically experiences tropical weather with temperatures around 25-30°C. During hurricane season (June-November), expect afternoon thunderstorms. Please monitor local weather services for current conditions.";
pub const SUPPORTIVE_ANSWER: &str = "I understand you're going through a difficult time. It's completely normal to feel overwhelmed sometimes. Take a moment to breathe, and remember that you don't have to face this alone. Would you like to talk about what's causing these feelings?";

/// Deterministic templated answers. Used when no model backend is
/// configured, and in tests.
pub struct StubGenerator;

impl StubGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn answer(query: &str, context: &str, mode: OperatingMode) -> String {
        let lowered = query.to_lowercase();

        if WEATHER_WORDS.iter().any(|w| lowered.contains(w))
            && WEATHER_PLACES.iter().any(|p| lowered.contains(p))
        {
            return HAITI_WEATHER_ANSWER.to_string();
        }

        if DISTRESS_WORDS.iter().any(|w| lowered.contains(w)) {
            return SUPPORTIVE_ANSWER.to_string();
        }

        if mode == OperatingMode::Peak {
            return format!(
                "Short response to '{query}' - system operating in reduced capacity mode."
            );
        }

        if !context.is_empty() && !context.contains(EMPTY_CONTEXT) {
            return format!(
                "Based on available information about '{query}', I can provide some guidance. {}...",
                prefix_chars(context, CONTEXT_EXCERPT_CHARS)
            );
        }

        format!(
            "I'd be happy to help you with '{query}'. While I don't have specific information immediately available, I can provide general assistance and guidance on this topic."
        )
    }
}

#[async_trait]
impl AnswerGenerator for StubGenerator {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(
        &self,
        query: &str,
        context: &str,
        mode: OperatingMode,
    ) -> Result<String, CollaboratorError> {
        Ok(Self::answer(query, context, mode))
    }
}
