//! Gemini upstream service
//!
//! Performs the actual HTTP calls against the Gemini generateContent API.
//! Each call carries exactly one key from the pool; retry and failover are
//! delegated to the [`FailoverController`]. The service itself is
//! stateless with respect to key identity.

use crate::config::{ClassifierConfig, RotationConfig, UpstreamConfig};
use crate::schemas::gemini::{GeminiError, GeminiRequest, GeminiResponse, Part};
use crate::services::classify::OutcomeClassifier;
use crate::services::failover::{
    AttemptOutcome, FailoverController, FailoverError, UpstreamInvoker,
};
use crate::services::key_pool::{ApiKey, KeyPool, PoolError};
use crate::utils::{BackoffPolicy, DataUrl};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default caption when the model returns an image with no accompanying text
const DEFAULT_IMAGE_CAPTION: &str = "Done, here is the image.";

// ============================================================================
// Error Types
// ============================================================================

/// Errors from the Gemini service
#[derive(Error, Debug)]
pub enum GeminiServiceError {
    /// No keys configured; nothing was attempted
    #[error("no upstream API keys configured")]
    NoCredentials,

    /// Every key failed; carries the last upstream error message
    #[error("{0}")]
    Exhausted(String),

    /// 2xx response missing an expected part (deterministic for the
    /// prompt, so not retried across keys)
    #[error("{0}")]
    MissingPart(String),
}

impl From<FailoverError> for GeminiServiceError {
    fn from(err: FailoverError) -> Self {
        match err {
            FailoverError::NoCredentials => Self::NoCredentials,
            FailoverError::Exhausted { message, .. } => Self::Exhausted(message),
        }
    }
}

impl From<PoolError> for GeminiServiceError {
    fn from(_: PoolError) -> Self {
        Self::NoCredentials
    }
}

// ============================================================================
// Gemini Service
// ============================================================================

/// Output of the image generation path
#[derive(Debug, Clone)]
pub struct ImageOutput {
    /// Caption text (model-provided, or a default)
    pub text: String,
    /// Generated image as a data URI
    pub image_data_url: String,
}

/// Service for the Gemini generateContent API with key failover
pub struct GeminiService {
    client: Client,
    base_url: String,
    text_model: String,
    image_model: String,
    classifier: OutcomeClassifier,
    pool: Arc<KeyPool>,
    controller: FailoverController,
}

impl GeminiService {
    pub fn new(
        upstream: &UpstreamConfig,
        rotation: &RotationConfig,
        classifier: &ClassifierConfig,
        pool: Arc<KeyPool>,
    ) -> Result<Self, anyhow::Error> {
        // Per-call timeout: an unbounded hang on one key would block
        // failover indefinitely
        let client = Client::builder()
            .timeout(Duration::from_secs(upstream.timeout_secs))
            .build()?;

        let backoff = BackoffPolicy::new(
            Duration::from_millis(rotation.backoff_base_ms),
            Duration::from_millis(rotation.backoff_max_ms),
            rotation.backoff_jitter,
        );

        tracing::info!(
            key_count = pool.len(),
            text_model = %upstream.text_model,
            image_model = %upstream.image_model,
            "Initialized Gemini service"
        );

        Ok(Self {
            client,
            base_url: upstream.base_url.trim_end_matches('/').to_string(),
            text_model: upstream.text_model.clone(),
            image_model: upstream.image_model.clone(),
            classifier: OutcomeClassifier::new(classifier),
            pool,
            controller: FailoverController::new(backoff),
        })
    }

    /// Number of keys in the pool (for health reporting)
    pub fn key_count(&self) -> usize {
        self.pool.len()
    }

    /// Run one request through plan -> controller -> invoker
    async fn dispatch(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<GeminiResponse, GeminiServiceError> {
        let plan = self.pool.plan()?;
        let payload = serde_json::to_value(request)
            .map_err(|e| GeminiServiceError::MissingPart(e.to_string()))?;

        let endpoint = GeminiEndpoint {
            client: &self.client,
            url: format!("{}/models/{}:generateContent", self.base_url, model),
            classifier: &self.classifier,
        };

        tracing::debug!(model = %model, keys = plan.keys.len(), "Dispatching upstream request");

        let body = self.controller.execute(&endpoint, &plan, &payload).await?;
        serde_json::from_value(body)
            .map_err(|e| GeminiServiceError::MissingPart(format!("unexpected response shape: {e}")))
    }

    /// Text/vision path: forward the message and, optionally, an inline image
    pub async fn generate_text_or_vision(
        &self,
        message: &str,
        image: Option<&DataUrl>,
    ) -> Result<String, GeminiServiceError> {
        let mut parts = Vec::new();
        if !message.is_empty() {
            parts.push(Part::text(message));
        }
        if let Some(image) = image {
            parts.push(Part::inline_data(&image.mime_type, &image.data));
        }

        let request = GeminiRequest::user_turn(parts);
        let response = self.dispatch(&self.text_model, &request).await?;

        Ok(response.first_candidate_text())
    }

    /// Image generation path: prompt in, caption plus image data URI out
    pub async fn generate_image(&self, prompt: &str) -> Result<ImageOutput, GeminiServiceError> {
        let request = GeminiRequest::image_turn(prompt);
        let response = self.dispatch(&self.image_model, &request).await?;

        let Some(inline) = response.first_inline_data() else {
            return Err(GeminiServiceError::MissingPart(format!(
                "Model did not return an image. Make sure '{}' supports image generation",
                self.image_model
            )));
        };

        let mime = if inline.mime_type.is_empty() {
            "image/png"
        } else {
            &inline.mime_type
        };

        let text = response.first_candidate_text();
        let text = if text.is_empty() {
            DEFAULT_IMAGE_CAPTION.to_string()
        } else {
            text
        };

        Ok(ImageOutput {
            text,
            image_data_url: DataUrl::format(mime, &inline.data),
        })
    }
}

// ============================================================================
// Invoker
// ============================================================================

/// One generateContent endpoint bound to a URL; performs a single call per
/// invoke and classifies the outcome
struct GeminiEndpoint<'a> {
    client: &'a Client,
    url: String,
    classifier: &'a OutcomeClassifier,
}

impl GeminiEndpoint<'_> {
    /// Best error message available: the structured Gemini error body,
    /// else a generic status line
    fn error_message(status: u16, body: &str) -> String {
        match serde_json::from_str::<GeminiError>(body) {
            Ok(parsed) => parsed.error.message,
            Err(_) => format!("Gemini error {status}"),
        }
    }
}

#[async_trait]
impl UpstreamInvoker for GeminiEndpoint<'_> {
    async fn invoke(&self, key: &ApiKey, payload: &Value) -> AttemptOutcome {
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", key.secret())
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await;

        let response = match response {
            Ok(resp) => resp,
            // No response received at all: transient by assumption
            Err(e) => {
                return AttemptOutcome::RetryableFailure {
                    status: None,
                    message: e.to_string(),
                }
            }
        };

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if (200..300).contains(&status) {
            match serde_json::from_str::<Value>(&body) {
                Ok(parsed) => AttemptOutcome::Success(parsed),
                Err(e) => AttemptOutcome::FatalForRequest {
                    message: format!("unparseable upstream response: {e}"),
                },
            }
        } else {
            let message = Self::error_message(status, &body);
            self.classifier.classify_failure(status, &message)
        }
    }
}
