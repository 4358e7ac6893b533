use reqwest::Client;
use tracing::info;

use crate::config::Env;
use crate::models::chat_request::OpenAiChatRequest;
use crate::models::chat_response::OpenAiResponse;

use super::{in_band, send_chat_request, ProviderError};

const PROVIDER: &str = "OpenAI";

/// Sends `input` as a single user message. Both the chat-completions and
/// the Responses API envelope are accepted on the way back.
pub async fn respond(client: &Client, env: &Env, model: &str, input: &str) -> OpenAiResponse {
    info!("OpenAI response: model={} input_chars={}", model, input.chars().count());
    let request = OpenAiChatRequest::new(model.to_string(), input);
    in_band(PROVIDER, try_respond(client, env, &request).await)
}

async fn try_respond(
    client: &Client,
    env: &Env,
    request: &OpenAiChatRequest,
) -> Result<OpenAiResponse, ProviderError> {
    let body = send_chat_request(
        client,
        PROVIDER,
        &env.openai_base_url,
        &env.openai_api_key,
        request,
    )
    .await?;
    Ok(OpenAiResponse::from_json(&body)?)
}
