//! The LM collaborator: a single `complete`-shaped operation per schema,
//! used by stages 1, 2 and 4. Retries, timeouts and authentication are this
//! client's concern, not the pipeline's — the core only depends on the
//! [`LMClient`] trait, never on a concrete transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, thiserror::Error)]
pub enum LMError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response did not match the expected schema: {0}")]
    Schema(String),
}

/// Output of the `identify` schema (stage 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyOutput {
    pub chapter_count: u64,
    pub chapter_list: String,
    #[serde(default)]
    pub analysis: String,
}

/// Output of the `boundaries` schema (stage 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundariesOutput {
    pub start_pattern: String,
    pub end_pattern: String,
    #[serde(default)]
    pub pattern_explanation: String,
}

/// Output of the `verify` schema (stage 4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOutput {
    pub is_correct: bool,
    pub confidence: f64,
    #[serde(default)]
    pub notes: String,
}

/// The pipeline's only view of the language model. Implementations MUST
/// either return the structured output or raise [`LMError`] — the core
/// never retries.
#[async_trait]
pub trait LMClient: Send + Sync {
    async fn identify(&self, text_sample: &str) -> Result<IdentifyOutput, LMError>;

    async fn boundaries(
        &self,
        full_text: &str,
        chapter_number: u64,
        chapter_title: &str,
    ) -> Result<BoundariesOutput, LMError>;

    async fn verify(
        &self,
        extracted_text: &str,
        expected_chapter_number: u64,
        expected_chapter_title: &str,
    ) -> Result<VerifyOutput, LMError>;
}

/// HTTP-backed [`LMClient`] for an OpenAI/Ollama-compatible completion
/// endpoint. Reads its endpoint and key from configuration/environment,
/// tolerating an unset key the same way the teacher's `LLMClient::new` did
/// for local/offline testing.
pub struct HttpLMClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpLMClient {
    pub fn new(model: String) -> Self {
        let api_key = env::var("LLM_API_KEY").unwrap_or_else(|_| "dummy_key".to_string());
        let api_url = env::var("LLM_API_URL")
            .unwrap_or_else(|_| "http://localhost:11434/api/generate".to_string());

        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            model,
        }
    }

    async fn complete<T: for<'de> Deserialize<'de>>(
        &self,
        prompt: String,
        schema_hint: &str,
    ) -> Result<T, LMError> {
        let mut request = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "format": "json",
                "options": { "temperature": 0.1 },
            }));

        if self.api_key != "dummy_key" {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| LMError::Transport(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| LMError::Transport(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| {
            LMError::Schema(format!("expected `{schema_hint}` fields: {e}"))
        })
    }
}

#[async_trait]
impl LMClient for HttpLMClient {
    async fn identify(&self, text_sample: &str) -> Result<IdentifyOutput, LMError> {
        let prompt = format!(
            "Identify all chapters in this text sample. Respond with JSON: \
             {{\"chapter_count\": int, \"chapter_list\": \"one per line, format '1. Title'\", \"analysis\": string}}\n\n\
             Text sample:\n{text_sample}"
        );
        self.complete(prompt, "identify").await
    }

    async fn boundaries(
        &self,
        full_text: &str,
        chapter_number: u64,
        chapter_title: &str,
    ) -> Result<BoundariesOutput, LMError> {
        let prompt = format!(
            "Generate a regex that uniquely matches the start of chapter {chapter_number} \
             (\"{chapter_title}\") and a regex that uniquely matches its end (start of the next \
             chapter, or an end-of-book marker for the final chapter). Respond with JSON: \
             {{\"start_pattern\": string, \"end_pattern\": string, \"pattern_explanation\": string}}\n\n\
             Full text:\n{full_text}"
        );
        self.complete(prompt, "boundaries").await
    }

    async fn verify(
        &self,
        extracted_text: &str,
        expected_chapter_number: u64,
        expected_chapter_title: &str,
    ) -> Result<VerifyOutput, LMError> {
        let prompt = format!(
            "Does this text match chapter {expected_chapter_number} (\"{expected_chapter_title}\")? \
             Respond with JSON: {{\"is_correct\": bool, \"confidence\": float in [0,1], \"notes\": string}}\n\n\
             Extracted text:\n{extracted_text}"
        );
        self.complete(prompt, "verify").await
    }
}
