use http::header;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

use crate::models::Completion;

pub mod deepseek;
pub mod openai;

/// Upstream failure. The display text is what callers see in the `error`
/// field of the GraphQL response.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} API Error: {status} - {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Request(e.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Request(e.to_string())
    }
}

/// Sends one bearer-authenticated JSON POST and returns the body of a 2xx
/// response. No retries.
pub async fn send_chat_request<T: Serialize>(
    client: &Client,
    provider: &'static str,
    url: &str,
    api_key: &str,
    request: &T,
) -> Result<String, ProviderError> {
    let body = serde_json::to_string(request)?;
    debug!("Sending request to {} API: {}\nbody:\n{}", provider, url, body);

    let response = client
        .post(url)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", api_key))
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let response_text = response.text().await?;
    debug!("{} API responded {}: {}", provider, status, response_text);

    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            body: response_text,
        });
    }
    Ok(response_text)
}

/// Folds an upstream failure into the response body instead of raising it.
pub fn in_band<R: Completion>(provider: &str, result: Result<R, ProviderError>) -> R {
    match result {
        Ok(response) => response,
        Err(e) => {
            error!("{} call failed: {}", provider, e);
            R::failed(e.to_string())
        }
    }
}
