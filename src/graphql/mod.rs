//! GraphQL surface: a single `Query` root whose two fields each proxy one
//! upstream chat completion.

use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Result, Schema};
use reqwest::Client;
use tracing::info;

use crate::clients::{deepseek, openai};
use crate::config::Env;
use crate::models::chat_request::{DeepSeekChatRequest, DEFAULT_DEEPSEEK_MODEL, DEFAULT_OPENAI_MODEL};
use crate::models::chat_response::{DeepSeekResponse, OpenAiResponse};
use crate::models::MessageInput;

pub type AppSchema = Schema<Query, EmptyMutation, EmptySubscription>;

/// Identifies one GraphQL request in the logs.
#[derive(Debug, Clone)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn new() -> Self {
        TraceId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

fn trace_id<'a>(ctx: &'a Context<'_>) -> &'a str {
    ctx.data_opt::<TraceId>().map_or("-", |t| t.0.as_str())
}

pub struct Query;

#[Object]
impl Query {
    /// Chat completion from DeepSeek. Upstream failures are reported in `error`.
    async fn deepseek_chat(
        &self,
        ctx: &Context<'_>,
        messages: Vec<MessageInput>,
        #[graphql(default_with = "Some(DEFAULT_DEEPSEEK_MODEL.to_string())")] model: Option<String>,
        #[graphql(default_with = "Some(false)")] stream: Option<bool>,
        temperature: Option<f64>,
        #[graphql(name = "max_tokens")] max_tokens: Option<i32>,
    ) -> Result<Option<DeepSeekResponse>> {
        let client = ctx.data::<Client>()?;
        let env = ctx.data::<Env>()?;
        info!("[{}] deepseekChat", trace_id(ctx));

        let model = model.unwrap_or_else(|| DEFAULT_DEEPSEEK_MODEL.to_string());
        let request = DeepSeekChatRequest::new(model, messages)
            .with_stream(stream.unwrap_or(false))
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);

        Ok(Some(deepseek::chat(client, env, &request).await))
    }

    /// Single-turn completion from OpenAI for `input`.
    async fn openai_response(
        &self,
        ctx: &Context<'_>,
        #[graphql(default_with = "Some(DEFAULT_OPENAI_MODEL.to_string())")] model: Option<String>,
        input: String,
    ) -> Result<Option<OpenAiResponse>> {
        let client = ctx.data::<Client>()?;
        let env = ctx.data::<Env>()?;
        info!("[{}] openaiResponse", trace_id(ctx));

        let model = model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
        Ok(Some(openai::respond(client, env, &model, &input).await))
    }
}

pub fn build_schema(client: Client) -> AppSchema {
    Schema::build(Query, EmptyMutation, EmptySubscription)
        .data(client)
        .finish()
}

pub fn sdl() -> String {
    build_schema(Client::new()).sdl()
}
