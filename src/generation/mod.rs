//! Generation collaborator contract and implementations.
//!
//! Prompt in, text out. Retries are the collaborator's responsibility; this
//! crate surfaces every failure as [`LexError::GenerationFailed`] instead of
//! returning a partial or guessed answer.

mod http;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::LexError;

pub use http::HttpGenerationProvider;

/// Language-model collaborator used by the answer composer.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LexError>;
}

/// Canned-reply provider that records every prompt it receives.
#[derive(Debug)]
pub struct MockGenerationProvider {
    reply: String,
    fail: bool,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self::with_reply("Mock answer grounded in the supplied context.")
    }

    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every call fails, for error-path tests.
    pub fn failing() -> Self {
        Self {
            reply: String::new(),
            fail: true,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl Default for MockGenerationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn generate(&self, prompt: &str) -> Result<String, LexError> {
        self.prompts.lock().push(prompt.to_string());
        if self.fail {
            return Err(LexError::GenerationFailed(
                "mock generation failure".to_string(),
            ));
        }
        Ok(self.reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_records_prompts() {
        let provider = MockGenerationProvider::with_reply("done");
        let reply = provider.generate("first prompt").await.unwrap();
        assert_eq!(reply, "done");
        provider.generate("second prompt").await.unwrap();
        assert_eq!(provider.prompts(), vec!["first prompt", "second prompt"]);
    }

    #[tokio::test]
    async fn failing_mock_surfaces_generation_failed() {
        let provider = MockGenerationProvider::failing();
        let err = provider.generate("prompt").await.unwrap_err();
        assert!(matches!(err, LexError::GenerationFailed(_)));
    }
}
