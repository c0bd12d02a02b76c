use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use filament_core::error::{FilamentError, Result};
use filament_core::traits::{GenerateRequest, TextModel};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Gemini native API client (non-streaming `generateContent`).
pub struct GeminiClient {
    http: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Override the API base URL (used by tests against a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

// ── Request types ────────────────────────────────────────────────

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

// ── Response types ───────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

/// Concatenated text of the first candidate's parts.
fn first_candidate_text(response: GeminiResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| FilamentError::ModelParse("response has no candidates".into()))?;

    let content = candidate
        .content
        .ok_or_else(|| FilamentError::ModelParse("first candidate has no content".into()))?;

    let text: String = content
        .parts
        .into_iter()
        .map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(FilamentError::ModelParse(
            "first candidate produced no text".into(),
        ));
    }
    Ok(text)
}

impl GeminiClient {
    async fn generate_content(&self, request: &GenerateRequest) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, request.model_id, request.api_key
        );

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(request.max_output_tokens),
                temperature: if request.temperature > 0.0 {
                    Some(request.temperature)
                } else {
                    None
                },
            }),
        };

        debug!(model = %request.model_id, prompt_len = request.prompt.len(), "Sending generateContent request");

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| FilamentError::ModelRequest(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(FilamentError::ModelRequest(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| FilamentError::ModelParse(e.to_string()))?;

        first_candidate_text(parsed)
    }
}

impl TextModel for GeminiClient {
    fn generate(&self, request: GenerateRequest) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move { self.generate_content(&request).await })
    }

    fn validate_key(&self, api_key: &str, model_id: &str) -> BoxFuture<'_, Result<()>> {
        let request = GenerateRequest {
            api_key: api_key.to_string(),
            model_id: model_id.to_string(),
            prompt: "ping".to_string(),
            temperature: 0.0,
            max_output_tokens: 1,
        };
        Box::pin(async move {
            self.generate_content(&request).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: "Summarize this".into(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(256),
                temperature: Some(0.7),
            }),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Summarize this");
        assert_eq!(json["generation_config"]["maxOutputTokens"], 256);
    }

    #[test]
    fn test_zero_temperature_omitted() {
        let config = GenerationConfig {
            max_output_tokens: Some(1),
            temperature: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("temperature"));
    }

    #[test]
    fn test_first_candidate_text() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "Hello, "}, {"text": "world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_candidate_text(response).unwrap(), "Hello, world");
    }

    #[test]
    fn test_no_candidates_is_parse_error() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        let err = first_candidate_text(response).unwrap_err();
        assert!(matches!(err, FilamentError::ModelParse(_)));
    }

    #[test]
    fn test_empty_parts_is_parse_error() {
        let response: GeminiResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": []}}]}"#).unwrap();
        assert!(first_candidate_text(response).is_err());
    }
}
