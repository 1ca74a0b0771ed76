//! Answer generators: produce a draft from (query, context, mode).

pub mod chat_completions;
pub mod stub;

pub use chat_completions::ChatCompletionsGenerator;
pub use stub::StubGenerator;

use crate::config::Config;
use crate::error::{CollaboratorError, ConfigError};
use crate::gate::OperatingMode;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(
        &self,
        query: &str,
        context: &str,
        mode: OperatingMode,
    ) -> Result<String, CollaboratorError>;
}

/// Factory keyed by `[generator] provider`.
pub fn create_generator(config: &Config) -> Result<Arc<dyn AnswerGenerator>, ConfigError> {
    let generator = &config.generator;
    match generator.provider.as_str() {
        "stub" => Ok(Arc::new(StubGenerator::new())),
        "openai-compatible" => {
            let base_url = generator
                .base_url
                .as_deref()
                .filter(|url| !url.trim().is_empty())
                .ok_or_else(|| {
                    ConfigError::Validation(
                        "generator.base_url is required for the openai-compatible provider"
                            .into(),
                    )
                })?;
            Ok(Arc::new(ChatCompletionsGenerator::new(
                base_url,
                generator.api_key.as_deref(),
                &generator.model,
                generator.temperature,
                config.runtime.generator_timeout_ms,
            )))
        }
        other => Err(ConfigError::Validation(format!(
            "unknown generator provider '{other}' (expected stub or openai-compatible)"
        ))),
    }
}
