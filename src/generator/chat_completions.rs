use super::AnswerGenerator;
use crate::error::{CollaboratorError, CollaboratorKind};
use crate::gate::OperatingMode;
use crate::utils::http_client::{api_error, build_client_with_timeout, transport_error};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const COMPONENT: CollaboratorKind = CollaboratorKind::GenerationEngine;

const NORMAL_SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer using the provided context when it is relevant. If the context does not cover the question, give general guidance.";
const PEAK_SYSTEM_PROMPT: &str = "You are a helpful assistant running in reduced-capacity mode. Answer in one or two short sentences. Use the provided context when it is relevant.";

const NORMAL_MAX_TOKENS: u32 = 512;
const PEAK_MAX_TOKENS: u32 = 128;

/// Any OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsGenerator {
    endpoint: String,
    model: String,
    temperature: f64,
    /// Pre-computed `"Bearer <key>"` header value.
    cached_auth_header: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatCompletionsGenerator {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        temperature: f64,
        timeout_ms: u64,
    ) -> Self {
        Self {
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            temperature,
            cached_auth_header: api_key
                .filter(|k| !k.is_empty())
                .map(|k| format!("Bearer {k}")),
            client: build_client_with_timeout(timeout_ms),
        }
    }

    fn build_request(&self, query: &str, context: &str, mode: OperatingMode) -> ChatRequest<'_> {
        let (system, max_tokens) = match mode {
            OperatingMode::Normal => (NORMAL_SYSTEM_PROMPT, NORMAL_MAX_TOKENS),
            OperatingMode::Peak => (PEAK_SYSTEM_PROMPT, PEAK_MAX_TOKENS),
        };
        ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system.to_string(),
                },
                Message {
                    role: "user",
                    content: format!("Context:\n{context}\n\nQuestion: {query}"),
                },
            ],
            temperature: self.temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl AnswerGenerator for ChatCompletionsGenerator {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn generate(
        &self,
        query: &str,
        context: &str,
        mode: OperatingMode,
    ) -> Result<String, CollaboratorError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&self.build_request(query, context, mode));
        if let Some(header) = &self.cached_auth_header {
            request = request.header("Authorization", header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(COMPONENT, &e))?;
        if !response.status().is_success() {
            return Err(api_error(COMPONENT, response).await);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::malformed(COMPONENT, e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| CollaboratorError::malformed(COMPONENT, "no content in completion"))
    }
}
