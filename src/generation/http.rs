//! Generation provider backed by a chat-completions HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::GenerationProvider;
use crate::types::LexError;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Calls a hosted chat model over HTTP with the standard
/// `{"model", "messages", "temperature"}` request shape.
///
/// Temperature defaults to 0.2: answers should stay close to the grounding
/// context rather than paraphrase freely.
#[derive(Clone, Debug)]
pub struct HttpGenerationProvider {
    client: Client,
    endpoint: Url,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl HttpGenerationProvider {
    pub fn new(endpoint: Url, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            model: model.into(),
            temperature: 0.2,
            api_key: None,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl GenerationProvider for HttpGenerationProvider {
    async fn generate(&self, prompt: &str) -> Result<String, LexError> {
        let mut request = self.client.post(self.endpoint.clone()).json(&ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response: ChatResponse = request
            .send()
            .await
            .map_err(|err| LexError::GenerationFailed(err.to_string()))?
            .error_for_status()
            .map_err(|err| LexError::GenerationFailed(err.to_string()))?
            .json()
            .await
            .map_err(|err| {
                LexError::GenerationFailed(format!("malformed generation response: {err}"))
            })?;

        let text = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(LexError::GenerationFailed(
                "generator returned an empty response".to_string(),
            ));
        }
        Ok(text)
    }
}
