use crate::error::{CollaboratorError, CollaboratorKind};
use reqwest::Client;
use std::time::Duration;

const MAX_API_ERROR_CHARS: usize = 200;

/// Outbound client for collaborators. The per-call budget is enforced by the
/// orchestrator; this timeout is the backstop.
pub fn build_client_with_timeout(timeout_ms: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| Client::new())
}

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

/// Redact credential-looking values that backends sometimes echo back in
/// error bodies.
pub fn scrub_secrets(input: &str) -> String {
    const MARKERS: [&str; 6] = [
        "sk-",
        "Bearer ",
        "ApiKey ",
        "Basic ",
        "api_key=",
        "\"api_key\":\"",
    ];

    let mut scrubbed = input.to_string();
    for marker in MARKERS {
        let mut search_from = 0;
        while let Some(rel) = scrubbed[search_from..].find(marker) {
            let content_start = search_from + rel + marker.len();
            let end = scrubbed[content_start..]
                .char_indices()
                .find(|(_, c)| !is_secret_char(*c))
                .map_or(scrubbed.len(), |(i, _)| content_start + i);
            if end == content_start {
                search_from = content_start;
                continue;
            }
            scrubbed.replace_range(content_start..end, "[REDACTED]");
            search_from = content_start + "[REDACTED]".len();
        }
    }
    scrubbed
}

pub fn sanitize_api_error(input: &str) -> String {
    super::truncate_with_ellipsis(&scrub_secrets(input), MAX_API_ERROR_CHARS)
}

/// Turn a non-success response into a collaborator error carrying the
/// status and a sanitised body excerpt.
pub async fn api_error(component: CollaboratorKind, response: reqwest::Response) -> CollaboratorError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    CollaboratorError::unavailable(
        component,
        format!("HTTP {status}: {}", sanitize_api_error(&body)),
    )
}

/// Transport-level failure (connect, timeout, decode).
pub fn transport_error(component: CollaboratorKind, error: &reqwest::Error) -> CollaboratorError {
    if error.is_decode() {
        CollaboratorError::malformed(component, sanitize_api_error(&error.to_string()))
    } else {
        CollaboratorError::unavailable(component, sanitize_api_error(&error.to_string()))
    }
}
