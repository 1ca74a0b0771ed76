use super::{ContextProvider, Passage};
use crate::config::RetrievalConfig;
use crate::error::{CollaboratorError, CollaboratorKind};
use crate::utils::http_client::{api_error, build_client_with_timeout, transport_error};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const COMPONENT: CollaboratorKind = CollaboratorKind::ContextStore;

enum Auth {
    None,
    ApiKey(String),
    Basic { username: String, password: String },
}

/// Full-text search against one Elasticsearch index.
pub struct ElasticsearchProvider {
    search_url: String,
    auth: Auth,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: HitSource,
}

#[derive(Debug, Default, Deserialize)]
struct HitSource {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    source: String,
}

impl ElasticsearchProvider {
    pub fn new(endpoint: &str, config: &RetrievalConfig, timeout_ms: u64) -> Self {
        let auth = match (&config.api_key, &config.username, &config.password) {
            (Some(key), _, _) if !key.is_empty() => Auth::ApiKey(key.clone()),
            (_, Some(username), Some(password)) => Auth::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => Auth::None,
        };
        Self {
            search_url: format!("{}/{}/_search", endpoint.trim_end_matches('/'), config.index),
            auth,
            client: build_client_with_timeout(timeout_ms),
        }
    }

    fn search_body(query: &str, max_results: usize) -> serde_json::Value {
        json!({
            "query": {
                "multi_match": {
                    "query": query,
                    "fields": ["title^2", "content", "source"],
                    "type": "best_fields"
                }
            },
            "size": max_results,
            "_source": ["title", "content", "source"]
        })
    }
}

#[async_trait]
impl ContextProvider for ElasticsearchProvider {
    fn name(&self) -> &str {
        "elasticsearch"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Passage>, CollaboratorError> {
        let mut request = self
            .client
            .post(&self.search_url)
            .json(&Self::search_body(query, max_results));
        request = match &self.auth {
            Auth::None => request,
            Auth::ApiKey(key) => request.header("Authorization", format!("ApiKey {key}")),
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
        };

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(COMPONENT, &e))?;
        if !response.status().is_success() {
            return Err(api_error(COMPONENT, response).await);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::malformed(COMPONENT, e.to_string()))?;

        Ok(parsed
            .hits
            .hits
            .into_iter()
            .take(max_results)
            .map(|hit| Passage {
                title: hit.source.title,
                content: hit.source.content,
                source: hit.source.source,
                score: hit.score.unwrap_or_default(),
            })
            .collect())
    }
}
