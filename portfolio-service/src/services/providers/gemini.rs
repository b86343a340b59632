//! Gemini `generateContent` client used by the proxy endpoint.
//!
//! Sends one prompt plus a system instruction and returns the first text part
//! of the first candidate.

use crate::config::GeminiConfig;
use crate::services::metrics::UPSTREAM_DURATION;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use service_core::observability::TracedClientExt;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Gemini API key is not configured on the server.")]
    NotConfigured,

    #[error("External API request failed: {0}")]
    Request(String),

    #[error("External API request failed: {status} {body}")]
    Status { status: StatusCode, body: String },

    #[error("Gemini returned empty content.")]
    EmptyContent,
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::NotConfigured => AppError::ServiceUnavailable(err.to_string()),
            GenerationError::Request(_)
            | GenerationError::Status { .. }
            | GenerationError::EmptyContent => AppError::UpstreamError(err.to_string()),
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Whether a usable credential is available.
    fn is_configured(&self) -> bool;

    async fn generate(&self, prompt: &str, system_instruction: &str)
        -> Result<String, GenerationError>;
}

pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn is_configured(&self) -> bool {
        self.config.usable_api_key().is_some()
    }

    async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<String, GenerationError> {
        let api_key = self
            .config
            .usable_api_key()
            .ok_or(GenerationError::NotConfigured)?;

        let request = GenerateContentRequest {
            contents: vec![Content::text(prompt)],
            system_instruction: Content::text(system_instruction),
        };

        tracing::debug!(
            prompt_len = prompt.len(),
            system_instruction_len = system_instruction.len(),
            "Sending request to Gemini API"
        );

        let started = Instant::now();

        let response = self
            .client
            .traced_post(&self.config.api_url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // The URL carries the key; keep it out of logs and responses.
                let e = e.without_url();
                UPSTREAM_DURATION
                    .with_label_values(&["error"])
                    .observe(started.elapsed().as_secs_f64());
                tracing::warn!(error = %e, "Gemini request failed");
                GenerationError::Request(e.to_string())
            })?;

        let status = response.status();
        UPSTREAM_DURATION
            .with_label_values(&[status.as_str()])
            .observe(started.elapsed().as_secs_f64());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Gemini API returned an error status");
            return Err(GenerationError::Status { status, body });
        }

        let api_response: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::warn!(error = %e.without_url(), "Failed to parse Gemini response");
            GenerationError::EmptyContent
        })?;

        api_response
            .first_text()
            .ok_or(GenerationError::EmptyContent)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, if present and non-empty.
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.is_empty())
    }
}
