use async_graphql::{InputObject, SimpleObject};
use serde::{Deserialize, Serialize};

pub mod chat_request;
pub mod chat_response;
pub mod health;

/// A caller-supplied chat message, forwarded upstream verbatim.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, InputObject)]
pub struct MessageInput {
    pub role: String,
    pub content: String,
}

impl MessageInput {
    pub fn user(content: &str) -> Self {
        MessageInput {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// A message as the provider returned it. Refusals and tool calls come back
/// with `content: null`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, SimpleObject)]
pub struct Message {
    pub role: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Usage {
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Choice {
    pub index: Option<i64>,
    pub message: Option<Message>,
    pub finish_reason: Option<String>,
}

/// A provider response that can also carry an in-band failure.
pub trait Completion: Sized {
    fn failed(error: String) -> Self;
}
