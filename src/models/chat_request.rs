use serde::{Deserialize, Serialize};

use super::MessageInput;

pub const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const OPENAI_MAX_TOKENS: i32 = 1000;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeepSeekChatRequest {
    pub model: String,
    pub messages: Vec<MessageInput>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i32>,
}

impl DeepSeekChatRequest {
    pub fn new(model: String, messages: Vec<MessageInput>) -> Self {
        DeepSeekChatRequest {
            model,
            messages,
            stream: false,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<i32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Chat-completions body sent on behalf of `openaiResponse`: the caller's
/// input becomes a single user message.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAiChatRequest {
    pub model: String,
    pub messages: Vec<MessageInput>,
    pub max_tokens: i32,
}

impl OpenAiChatRequest {
    pub fn new(model: String, input: &str) -> Self {
        OpenAiChatRequest {
            model,
            messages: vec![MessageInput::user(input)],
            max_tokens: OPENAI_MAX_TOKENS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_dummy_message(role: &str, content: &str) -> MessageInput {
        MessageInput {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_deepseek_body_omits_unset_optionals() {
        let request = DeepSeekChatRequest::new(
            DEFAULT_DEEPSEEK_MODEL.to_string(),
            vec![create_dummy_message("user", "hello")],
        );

        let body = serde_json::to_value(&request).unwrap();
        let object = body.as_object().unwrap();

        assert!(!object.contains_key("temperature"));
        assert!(!object.contains_key("max_tokens"));
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_deepseek_body_keeps_messages_verbatim() {
        let messages = vec![
            create_dummy_message("system", "be terse"),
            create_dummy_message("user", "what is rust?"),
            create_dummy_message("assistant", "a language"),
            create_dummy_message("user", "and?"),
        ];
        let request = DeepSeekChatRequest::new("deepseek-reasoner".to_string(), messages)
            .with_stream(true)
            .with_temperature(Some(0.2))
            .with_max_tokens(Some(64));

        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body["messages"],
            json!([
                {"role": "system", "content": "be terse"},
                {"role": "user", "content": "what is rust?"},
                {"role": "assistant", "content": "a language"},
                {"role": "user", "content": "and?"}
            ])
        );
        assert_eq!(body["temperature"], 0.2);
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn test_openai_body_wraps_input_as_user_message() {
        let request = OpenAiChatRequest::new(DEFAULT_OPENAI_MODEL.to_string(), "hi");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "hi"}],
                "max_tokens": 1000
            })
        );
    }
}
