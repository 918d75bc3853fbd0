use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::provider::{LlmError, LlmProvider, Message, Role};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

pub struct ClaudeProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: super::http_client(),
            api_key,
            model,
        }
    }

    /// The messages API takes the system prompt as a top-level field; all
    /// system messages are joined into it.
    fn build_request_body(
        model: &str,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
    ) -> Value {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let api_messages: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let mut body = json!({
            "model": model,
            "messages": api_messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });
        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }
        body
    }

    fn parse_response(resp: &Value) -> Result<String, LlmError> {
        let blocks = resp["content"]
            .as_array()
            .ok_or_else(|| LlmError::ParseError("missing content array".into()))?;
        let text: String = blocks
            .iter()
            .filter(|b| b["type"] == "text")
            .filter_map(|b| b["text"].as_str())
            .collect();
        if text.is_empty() {
            return Err(LlmError::ParseError("no text blocks in content".into()));
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let body = Self::build_request_body(&self.model, &messages, temperature, max_tokens);

        debug!(model = %self.model, "Claude request to {}", MESSAGES_URL);

        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: Value = response.json().await?;
        Self::parse_response(&resp)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_moves_to_top_level() {
        let messages = vec![
            Message::system("You write LinkedIn posts."),
            Message::user("Topic: hiring"),
        ];
        let body = ClaudeProvider::build_request_body("claude-x", &messages, 0.7, 800);
        assert_eq!(body["system"], "You write LinkedIn posts.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 800);
    }

    #[test]
    fn no_system_field_without_system_message() {
        let body = ClaudeProvider::build_request_body("m", &[Message::user("hi")], 0.0, 10);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn parse_joins_text_blocks() {
        let resp = json!({ "content": [
            { "type": "text", "text": "Hello " },
            { "type": "tool_use", "id": "x" },
            { "type": "text", "text": "world" }
        ]});
        assert_eq!(ClaudeProvider::parse_response(&resp).unwrap(), "Hello world");
    }

    #[test]
    fn parse_rejects_missing_content() {
        assert!(ClaudeProvider::parse_response(&json!({})).is_err());
        assert!(ClaudeProvider::parse_response(&json!({ "content": [] })).is_err());
    }
}
