//! Relay API request/response models

use serde::{Deserialize, Serialize};

/// Inbound chat request body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Free-text instruction; may start with a command prefix
    #[serde(default)]
    pub message: Option<String>,

    /// Optional inline image as a base64 data URI
    #[serde(default)]
    pub image: Option<String>,

    /// Opaque continuation token, echoed back unchanged
    #[serde(default)]
    pub continuation: Option<String>,

    /// Claimed identity, required when allow-list gating is on
    #[serde(default)]
    pub name: Option<String>,

    /// Claimed caller address, required when allow-list gating is on
    #[serde(default)]
    pub ip: Option<String>,
}

/// Normalized chat response
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// Always present on success
    pub text: String,

    /// Generated image as a data URI (image command path only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Image URLs (gallery command path only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery: Option<Vec<String>>,

    /// Echo of the request's continuation token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<String>,
}

impl ChatResponse {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
            gallery: None,
            continuation: None,
        }
    }

    pub fn with_continuation(mut self, continuation: Option<String>) -> Self {
        self.continuation = continuation;
        self
    }
}

/// Inbound verification request body
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub ip: Option<String>,
}

/// Successful verification response
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    pub ok: bool,
    pub user: String,
    pub ip: String,
}

/// Gallery search response
#[derive(Debug, Clone, Serialize)]
pub struct GalleryResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<String>,
}
