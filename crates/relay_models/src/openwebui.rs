//! Open WebUI chat completion client.

use crate::{
    ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse, CompletionClient,
    OpenWebUiConfig,
};
use async_trait::async_trait;
use relay_core::ChatMessage;
use relay_error::{RemoteError, RemoteErrorKind};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// Every call is bounded by the client's own timeout, which applies
/// independently of any retry deadline around it.
#[derive(Debug, Clone)]
pub struct OpenWebUiClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    tool_ids: Vec<String>,
}

impl OpenWebUiClient {
    /// Creates a client for `endpoint` with a per-call `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint or key is empty, or if the HTTP client
    /// cannot be initialized.
    #[instrument(skip(api_key))]
    pub fn new(
        endpoint: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let endpoint = endpoint.trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(RemoteError::new(RemoteErrorKind::Validation(
                "endpoint must not be empty".to_string(),
            )));
        }
        if api_key.is_empty() {
            return Err(RemoteError::new(RemoteErrorKind::Validation(
                "api key must not be empty".to_string(),
            )));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            RemoteError::new(RemoteErrorKind::Transport(format!(
                "Failed to build HTTP client: {}",
                e
            )))
        })?;

        Ok(Self {
            client,
            url: format!("{}/v1/chat/completions", endpoint),
            api_key: api_key.to_string(),
            model: model.to_string(),
            tool_ids: Vec::new(),
        })
    }

    /// Creates a client from the `[openwebui]` section.
    pub fn from_config(config: &OpenWebUiConfig) -> Result<Self, RemoteError> {
        Ok(Self::new(
            config.endpoint(),
            config.api_key(),
            config.model(),
            config.timeout(),
        )?
        .with_tool_ids(config.tool_ids().clone()))
    }

    /// Enable Open WebUI tools on every request.
    pub fn with_tool_ids(mut self, tool_ids: Vec<String>) -> Self {
        self.tool_ids = tool_ids;
        self
    }

    /// Full completion URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one completion request and decode the full response.
    #[instrument(skip(self, messages), fields(message_count = messages.len(), model = %self.model))]
    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
    ) -> Result<ChatCompletionResponse, RemoteError> {
        let tool_ids = (!self.tool_ids.is_empty()).then(|| self.tool_ids.clone());
        let request = ChatCompletionRequest::builder()
            .model(self.model.clone())
            .messages(messages.to_vec())
            .tool_ids(tool_ids)
            .build()
            .map_err(|e| RemoteError::new(RemoteErrorKind::Validation(e.to_string())))?;

        debug!(url = %self.url, "Sending completion request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_reqwest)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|err| err.describe())
                .unwrap_or(body);
            return Err(RemoteError::new(RemoteErrorKind::Status {
                status_code: status.as_u16(),
                message,
            }));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            RemoteError::new(RemoteErrorKind::MalformedResponse(format!(
                "Failed to parse response: {}",
                e
            )))
        })?;

        debug!(
            choices = completion.choices().len(),
            total_tokens = completion.usage().total_tokens(),
            "Received completion"
        );
        Ok(completion)
    }
}

#[async_trait]
impl CompletionClient for OpenWebUiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, RemoteError> {
        let completion = self.chat_completion(messages).await?;
        completion
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::EmptyCompletion))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Map a transport failure onto the retry classification.
fn classify_reqwest(err: reqwest::Error) -> RemoteError {
    let kind = if err.is_timeout() {
        RemoteErrorKind::Timeout
    } else if err.is_body() || err.is_decode() {
        RemoteErrorKind::StreamTerminated(err.to_string())
    } else {
        RemoteErrorKind::Transport(err.to_string())
    };
    RemoteError::new(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_strips_trailing_slash() {
        let client =
            OpenWebUiClient::new("http://localhost:8080/", "key", "m", Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = OpenWebUiClient::new("http://localhost:8080", "", "m", Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err.kind(), RemoteErrorKind::Validation(_)));
    }

    #[test]
    fn test_from_config_keeps_tools() {
        let config = OpenWebUiConfig::new("http://localhost:8080", "key", "llama3")
            .with_tool_ids(vec!["web_search".to_string()]);
        let client = OpenWebUiClient::from_config(&config).unwrap();
        assert_eq!(client.model_name(), "llama3");
        assert_eq!(client.tool_ids, vec!["web_search"]);
    }
}
