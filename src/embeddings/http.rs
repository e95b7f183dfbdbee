//! Embedding provider backed by an OpenAI-style `/embeddings` HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::EmbeddingProvider;
use crate::types::LexError;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

/// Calls a hosted embedding model over HTTP.
///
/// The endpoint is expected to accept `{"model", "input": [..]}` and return
/// `{"data": [{"index", "embedding"}, ..]}`, the de facto shape of hosted
/// embedding APIs. Response rows are re-ordered by their `index` field so
/// the output always matches the input order.
#[derive(Clone, Debug)]
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: Url,
    model: String,
    dimension: usize,
    api_key: Option<String>,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: Url, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            model: model.into(),
            dimension,
            api_key: None,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Supplies a pre-configured client (custom TLS, proxies, timeouts).
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LexError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self.client.post(self.endpoint.clone()).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response: EmbeddingResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|err| LexError::Embedding(format!("malformed embedding response: {err}")))?;

        if response.data.len() != texts.len() {
            return Err(LexError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }

        let mut rows = response.data;
        rows.sort_by_key(|row| row.index);
        let vectors: Vec<Vec<f32>> = rows.into_iter().map(|row| row.embedding).collect();

        for vector in &vectors {
            if vector.len() != self.dimension {
                return Err(LexError::Embedding(format!(
                    "expected dimension {}, got {}",
                    self.dimension,
                    vector.len()
                )));
            }
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }
}
