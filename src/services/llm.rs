use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::BookConfig;
use crate::error::LlmError;
use crate::models::{GenerateContentRequest, GenerateContentResponse, GenerationStep};

/// A text-generation collaborator: prompt in, free text out.
///
/// `step` identifies the call (and the chapter index for chapters); the
/// prompt itself is entirely built by the caller.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, step: GenerationStep) -> Result<String, LlmError>;
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, config: &BookConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(GeminiClient {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model, self.api_key
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, step: GenerationStep) -> Result<String, LlmError> {
        tracing::debug!(%step, model = %self.model, prompt_chars = prompt.len(), "Sending prompt");

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LlmError::Auth(format!(
                "Gemini rejected the API key: {}",
                response_text
            )));
        }
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: response_text,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response_text)?;
        match parsed.text() {
            Some(text) => Ok(text),
            None => {
                let finish_reason = parsed
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.as_deref())
                    .unwrap_or("none");
                tracing::warn!(%step, finish_reason, "Gemini returned no text");
                Err(LlmError::EmptyResponse)
            }
        }
    }
}
