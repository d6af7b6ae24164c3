//! Chat completion wire types.

use derive_builder::Builder;
use derive_getters::Getters;
use relay_core::ChatMessage;
use serde::{Deserialize, Serialize};

/// Body of `POST /v1/chat/completions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder, Getters)]
#[builder(setter(into))]
pub struct ChatCompletionRequest {
    /// Model identifier
    model: String,
    /// Conversation, system prompt first
    messages: Vec<ChatMessage>,
    /// Open WebUI tool identifiers to enable
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_ids: Option<Vec<String>>,
}

impl ChatCompletionRequest {
    /// Creates a new builder for `ChatCompletionRequest`.
    pub fn builder() -> ChatCompletionRequestBuilder {
        ChatCompletionRequestBuilder::default()
    }
}

/// One completion alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Choice {
    /// Position in the choice list
    #[serde(default)]
    index: u32,
    /// Generated message
    message: ChatMessage,
    /// Why generation stopped
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Token accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Usage {
    /// Tokens in the prompt
    #[serde(default)]
    prompt_tokens: u64,
    /// Tokens generated
    #[serde(default)]
    completion_tokens: u64,
    /// Sum of both
    #[serde(default)]
    total_tokens: u64,
}

/// Successful completion response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ChatCompletionResponse {
    /// Response identifier
    #[serde(default)]
    id: String,
    /// Object type, normally `chat.completion`
    #[serde(default)]
    object: String,
    /// Unix creation time
    #[serde(default)]
    created: i64,
    /// Model that answered
    #[serde(default)]
    model: String,
    /// Generated alternatives
    choices: Vec<Choice>,
    /// Token accounting
    #[serde(default)]
    usage: Usage,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
    }
}

/// Error details in an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ApiErrorBody {
    /// Human readable message
    message: String,
    /// Error category
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    /// Machine readable code
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Error response body, `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ApiErrorResponse {
    /// Error details
    error: ApiErrorBody,
}

impl ApiErrorResponse {
    /// One-line description used as the status error message.
    pub fn describe(&self) -> String {
        let mut text = self.error.message.clone();
        if let Some(kind) = &self.error.error_type {
            text.push_str(&format!(" (type: {})", kind));
        }
        match &self.error.code {
            Some(serde_json::Value::String(code)) => text.push_str(&format!(" (code: {})", code)),
            Some(serde_json::Value::Null) | None => {}
            Some(code) => text.push_str(&format!(" (code: {})", code)),
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::Role;

    #[test]
    fn test_request_omits_missing_tool_ids() {
        let request = ChatCompletionRequest::builder()
            .model("llama3")
            .messages(vec![ChatMessage::new(Role::User, "hi")])
            .build()
            .unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "llama3",
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.first_content(), Some("hello"));
        assert_eq!(response.usage().total_tokens(), &0);
    }

    #[test]
    fn test_error_description() {
        let body: ApiErrorResponse = serde_json::from_str(
            r#"{"error":{"message":"model not found","type":"invalid_request_error","code":"model_not_found"}}"#,
        )
        .unwrap();
        assert_eq!(
            body.describe(),
            "model not found (type: invalid_request_error) (code: model_not_found)"
        );
    }
}
