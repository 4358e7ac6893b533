use reqwest::Client;
use tracing::info;

use crate::config::Env;
use crate::models::chat_request::DeepSeekChatRequest;
use crate::models::chat_response::DeepSeekResponse;

use super::{in_band, send_chat_request, ProviderError};

const PROVIDER: &str = "DeepSeek";

/// One chat completion against DeepSeek. Failures come back in the
/// response's `error` field.
pub async fn chat(client: &Client, env: &Env, request: &DeepSeekChatRequest) -> DeepSeekResponse {
    info!(
        "DeepSeek chat: model={} messages={}",
        request.model,
        request.messages.len()
    );
    in_band(PROVIDER, try_chat(client, env, request).await)
}

async fn try_chat(
    client: &Client,
    env: &Env,
    request: &DeepSeekChatRequest,
) -> Result<DeepSeekResponse, ProviderError> {
    let body = send_chat_request(
        client,
        PROVIDER,
        &env.deepseek_base_url,
        &env.deepseek_api_key,
        request,
    )
    .await?;
    Ok(DeepSeekResponse::from_json(&body)?)
}
