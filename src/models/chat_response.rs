use async_graphql::SimpleObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Choice, Completion, Message, Usage};

// GraphQL output shapes. Every field is nullable so a failed call can
// come back with only `error` set.

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, SimpleObject)]
#[graphql(name = "DeepSeekResponse")]
pub struct DeepSeekResponse {
    pub id: Option<String>,
    pub object: Option<String>,
    pub created: Option<i64>,
    pub model: Option<String>,
    pub choices: Option<Vec<Choice>>,
    pub usage: Option<Usage>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeepSeekResponse {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Completion for DeepSeekResponse {
    fn failed(error: String) -> Self {
        DeepSeekResponse {
            error: Some(error),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, SimpleObject)]
#[graphql(name = "OpenAIResponse")]
pub struct OpenAiResponse {
    pub id: Option<String>,
    pub object: Option<String>,
    pub created: Option<i64>,
    pub model: Option<String>,
    pub choices: Option<Vec<Choice>>,
    pub usage: Option<Usage>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OpenAiResponse {
    /// Accepts either a chat-completions body or a Responses API body and
    /// normalizes both into the chat-completions shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        if value.get("output").map_or(false, Value::is_array) {
            let envelope: ResponsesEnvelope = serde_json::from_value(value.clone())?;
            if let Some(response) = envelope.into_completion() {
                return Ok(response);
            }
        }
        serde_json::from_value(value)
    }
}

impl Completion for OpenAiResponse {
    fn failed(error: String) -> Self {
        OpenAiResponse {
            error: Some(error),
            ..Default::default()
        }
    }
}

// Responses API envelope

#[derive(Debug, Deserialize)]
pub struct ResponsesEnvelope {
    pub id: Option<String>,
    pub object: Option<String>,
    pub created_at: Option<i64>,
    pub model: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub output: Vec<OutputItem>,
    pub usage: Option<ResponsesUsage>,
}

#[derive(Debug, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub content: Option<Vec<OutputContent>>,
}

#[derive(Debug, Deserialize)]
pub struct OutputContent {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsesUsage {
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
}

impl ResponsesEnvelope {
    /// Text of the first `output_text` part across the `message` items. Items
    /// with `content: null` are skipped.
    pub fn output_text(&self) -> Option<&str> {
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .filter_map(|item| item.content.as_deref())
            .flatten()
            .find(|part| part.kind == "output_text")?
            .text
            .as_deref()
    }

    pub fn finish_reason(&self) -> &'static str {
        match self.status.as_deref() {
            Some("completed") => "stop",
            _ => "length",
        }
    }

    /// Repackages the envelope as a single-choice completion, or `None` when
    /// there is no output text to carry over.
    pub fn into_completion(self) -> Option<OpenAiResponse> {
        let text = self.output_text()?.to_string();
        let finish_reason = self.finish_reason().to_string();
        let usage = self.usage.map(|usage| Usage {
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
            total_tokens: usage.total_tokens.or_else(|| {
                Some(usage.input_tokens.unwrap_or(0) + usage.output_tokens.unwrap_or(0))
            }),
        });

        Some(OpenAiResponse {
            id: self.id,
            object: self.object,
            created: self.created_at,
            model: self.model,
            choices: Some(vec![Choice {
                index: Some(0),
                message: Some(Message {
                    role: Some("assistant".to_string()),
                    content: Some(text),
                }),
                finish_reason: Some(finish_reason),
            }]),
            usage,
            error: None,
        })
    }
}
