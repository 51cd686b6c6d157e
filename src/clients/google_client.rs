use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::sync::atomic::{AtomicUsize, Ordering};
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::settings::GeminiConfig;

// Generation Request Structs
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GoogleGenerateRequest {
    pub contents: Vec<GoogleContent>,
    pub generation_config: Option<GoogleGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GoogleContent {
    pub role: String,
    pub parts: Vec<GoogleRequestPart>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GoogleRequestPart {
    pub text: String,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GoogleGenerationConfig {
    pub response_modalities: Option<Vec<ResponseModality>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseModality {
    Text,
    Image,
}

impl GoogleGenerateRequest {
    pub fn from_prompt(prompt: &str, modalities: &[ResponseModality]) -> Self {
        let generation_config = if modalities.is_empty() {
            None
        } else {
            Some(GoogleGenerationConfig {
                response_modalities: Some(modalities.to_vec()),
            })
        };

        Self {
            contents: vec![GoogleContent {
                role: "user".to_string(),
                parts: vec![GoogleRequestPart { text: prompt.to_string() }],
            }],
            generation_config,
        }
    }
}

// Generation Response Structs
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GoogleGenerateResponse {
    #[serde(default)]
    pub candidates: Vec<GoogleCandidate>,
    pub usage_metadata: Option<GoogleUsageMetadata>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCandidate {
    pub content: Option<GoogleResponseContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GoogleResponseContent {
    #[serde(default)]
    pub parts: Vec<GoogleResponsePart>,
    pub role: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GoogleResponsePart {
    pub text: Option<String>,
    pub inline_data: Option<GoogleInlineData>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GoogleInlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct GoogleUsageMetadata {
    pub prompt_token_count: i32,
    pub candidates_token_count: Option<i32>,
    pub total_token_count: i32,
}

impl GoogleGenerateResponse {
    /// Content of the first candidate, if the model produced any.
    pub fn first_content(&self) -> Option<&GoogleResponseContent> {
        self.candidates.first().and_then(|c| c.content.as_ref())
    }

    /// Text of the first part of the first candidate.
    pub fn first_text(&self) -> Option<&str> {
        self.first_content()
            .and_then(|content| content.parts.first())
            .and_then(|part| part.text.as_deref())
            .filter(|text| !text.is_empty())
    }

    #[cfg(test)]
    pub fn text_response(text: &str) -> Self {
        Self {
            candidates: vec![GoogleCandidate {
                content: Some(GoogleResponseContent {
                    parts: vec![GoogleResponsePart {
                        text: Some(text.to_string()),
                        inline_data: None,
                    }],
                    role: Some("model".to_string()),
                }),
                finish_reason: Some("STOP".to_string()),
            }],
            usage_metadata: None,
        }
    }
}

/// A hosted model that turns a single prompt into candidates.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        modalities: &[ResponseModality],
    ) -> Result<GoogleGenerateResponse, AppError>;
}

struct RequestFailure {
    error: AppError,
    retryable: bool,
}

// Google Client
pub struct GoogleClient {
    client: Client,
    api_keys: Vec<String>,
    current_key_index: AtomicUsize,
    base_url: String,
}

impl GoogleClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, AppError> {
        if config.api_keys.is_empty() {
            return Err(AppError::Configuration("Gemini API keys list cannot be empty".to_string()));
        }

        let client = crate::utils::http_client::new_api_client()?;

        Ok(Self {
            client,
            api_keys: config.api_keys.clone(),
            current_key_index: AtomicUsize::new(0),
            base_url: config.base_url.clone(),
        })
    }

    fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
    }

    async fn send_with_key(
        &self,
        url: &str,
        api_key: &str,
        request_id: &str,
        request: &GoogleGenerateRequest,
    ) -> Result<GoogleGenerateResponse, RequestFailure> {
        let response = self.client
            .post(url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .header("X-Request-ID", request_id)
            .json(request)
            .send()
            .await
            .map_err(|e| RequestFailure {
                retryable: e.is_timeout() || e.is_connect() || e.is_request(),
                error: AppError::External(format!("Gemini request failed: {}", e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response".to_string());
            return Err(RequestFailure {
                retryable: Self::is_retryable_status(status),
                error: AppError::External(format!(
                    "Gemini request failed with status {}: {}",
                    status, error_text
                )),
            });
        }

        let response_text = response.text().await.map_err(|e| RequestFailure {
            retryable: false,
            error: AppError::External(format!("Failed to get response text: {}", e)),
        })?;

        serde_json::from_str::<GoogleGenerateResponse>(&response_text).map_err(|e| {
            error!("Gemini deserialization failed: {} | Response: {}", e, response_text);
            RequestFailure {
                retryable: false,
                error: AppError::External(format!("Gemini deserialization failed: {}", e)),
            }
        })
    }
}

#[async_trait]
impl GenerativeModel for GoogleClient {
    async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        modalities: &[ResponseModality],
    ) -> Result<GoogleGenerateResponse, AppError> {
        let request = GoogleGenerateRequest::from_prompt(prompt, modalities);
        let request_id = Uuid::new_v4().to_string();
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let num_keys = self.api_keys.len();
        let start_index = self.current_key_index.fetch_add(1, Ordering::Relaxed) % num_keys;
        let mut last_error = None;

        for i in 0..num_keys {
            let key_index = (start_index + i) % num_keys;
            debug!("Attempting Gemini request {} with key {} (attempt {} of {})", request_id, key_index + 1, i + 1, num_keys);

            match self.send_with_key(&url, &self.api_keys[key_index], &request_id, &request).await {
                Ok(result) => {
                    info!("Gemini request successful for model: {} with key {}", model, key_index + 1);
                    debug!("Response candidates count: {}", result.candidates.len());
                    return Ok(result);
                }
                Err(failure) if failure.retryable => {
                    warn!("Gemini request failed with retryable error, trying next key: {}", failure.error);
                    last_error = Some(failure.error);
                }
                Err(failure) => return Err(failure.error),
            }
        }

        // If we get here, all keys failed
        Err(last_error.unwrap_or_else(|| AppError::External("All Gemini API keys failed".to_string())))
    }
}
