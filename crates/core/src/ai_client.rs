// crates/core/src/ai_client.rs

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Abstract LLM client for plain chat completions.
///
/// Implementations can use OpenAI, Azure, Ollama, or a scripted fake in tests.
pub trait CompletionClient: Send + Sync {
    /// Send a chat completion request and return the text of the first choice.
    fn complete(&self, request: ChatRequest) -> Result<String>;
}

/// A chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: 1.0,
        }
    }

    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new("system", content));
        self
    }

    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new("user", content));
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Content of the first message with the given role, if any.
    pub fn content_of(&self, role: &str) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// A chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if the model produced any.
    pub fn first_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_message_order() {
        let req = ChatRequest::new("gpt-4")
            .system("rules")
            .user("hello")
            .with_temperature(0.3);

        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, "system");
        assert_eq!(req.content_of("user"), Some("hello"));
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn first_text_reads_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"hi"}},{"message":{"role":"assistant","content":"other"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.first_text().as_deref(), Some("hi"));
    }

    #[test]
    fn first_text_is_none_without_choices() {
        let resp: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.first_text().is_none());
    }
}
