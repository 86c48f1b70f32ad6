/// LLM client: the single point of entry for all Gemini API calls in TeamUp.
///
/// No other module may call the Gemini API directly.
///
/// Model: gemini-2.0-flash (hardcoded, it is the PDF-capable model the prompts are tuned for)
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all LLM calls in TeamUp.
pub const MODEL: &str = "gemini-2.0-flash";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    InlineData { inline_data: InlineData },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl LlmResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// A file handed to the model alongside the prompt.
#[derive(Debug, Clone)]
pub struct Attachment<'a> {
    pub mime_type: &'a str,
    pub bytes: &'a [u8],
}

/// The single LLM client used by all services in TeamUp.
/// Wraps the Gemini `generateContent` API with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(120)).build()?,
            api_key,
        })
    }

    /// Sends the attachment (base64 inline data) followed by the text prompt and
    /// returns the full response. Retries on 429 and 5xx with exponential backoff.
    pub async fn generate(
        &self,
        attachment: Option<Attachment<'_>>,
        prompt: &str,
    ) -> Result<LlmResponse, LlmError> {
        let mut parts = Vec::with_capacity(2);
        if let Some(file) = attachment {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: file.mime_type.to_string(),
                    data: STANDARD.encode(file.bytes),
                },
            });
        }
        parts.push(Part::Text { text: prompt });

        let request_body = GenerateRequest {
            contents: vec![Content { role: "user", parts }],
        };
        let url = format!("{GEMINI_API_BASE}/{MODEL}:generateContent");

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GeminiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            if let Some(usage) = &llm_response.usage_metadata {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                    usage.prompt_token_count, usage.candidates_token_count
                );
            }

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the model and returns the raw response text.
    pub async fn generate_text(
        &self,
        attachment: Option<Attachment<'_>>,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let response = self.generate(attachment, prompt).await?;
        response.text().ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_inline_data_before_text() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "application/pdf".to_string(),
                            data: STANDARD.encode(b"%PDF"),
                        },
                    },
                    Part::Text { text: "rate this" },
                ],
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"inline_data": {"mime_type": "application/pdf", "data": "JVBERg=="}},
                        {"text": "rate this"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: LlmResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"backend\": "}, {"text": "7}"}]}}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"backend\": 7}"));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: LlmResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.text().is_none());
    }
}
