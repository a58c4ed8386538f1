//! Chat relay handler
//!
//! One endpoint, three paths: plain text/vision chat, `/img` image
//! generation, and `/pin` gallery search, selected by a command prefix on
//! the message. When allow-list gating is enabled the gate runs before any
//! command parsing or upstream work.

use crate::error::ApiError;
use crate::schemas::chat::{ChatRequest, ChatResponse};
use crate::server::state::AppState;
use crate::utils::{client_ip, DataUrl};
use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use std::net::SocketAddr;

/// The action a chat message asks for
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Chat(String),
    GenerateImage(String),
    GallerySearch(String),
}

/// Parse the command prefix. Prefix matching is case-insensitive; the
/// remainder is trimmed. A bare prefix yields an empty argument, which
/// the handler rejects with a usage hint.
fn parse_command(message: &str) -> Command {
    let trimmed = message.trim();
    let lower = trimmed.to_lowercase();

    if lower == "/img" || lower.starts_with("/img ") {
        return Command::GenerateImage(trimmed[4..].trim().to_string());
    }
    if lower == "/pin" || lower.starts_with("/pin ") {
        return Command::GallerySearch(trimmed[4..].trim().to_string());
    }

    Command::Chat(trimmed.to_string())
}

/// POST /api/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if state.settings.allowlist.require_verification {
        let observed = client_ip(&headers, Some(peer));
        state
            .allowlist
            .verify(
                request.name.as_deref(),
                request.ip.as_deref(),
                observed.as_deref(),
            )
            .await?;
    }

    let message = request.message.as_deref().unwrap_or("").trim();

    let image = match request.image.as_deref() {
        Some(raw) => Some(DataUrl::parse(raw).ok_or_else(|| {
            ApiError::Validation(
                "Image must be a base64 data URI, e.g. data:image/png;base64,...".to_string(),
            )
        })?),
        None => None,
    };

    if message.is_empty() && image.is_none() {
        return Err(ApiError::Validation(
            "Message is empty. Send text, an image, or a command like /img or /pin".to_string(),
        ));
    }

    let response = match parse_command(message) {
        Command::GenerateImage(prompt) => {
            if prompt.is_empty() {
                return Err(ApiError::Validation(
                    "Prompt is empty. Example: /img a red neon cat".to_string(),
                ));
            }
            let output = state.gemini.generate_image(&prompt).await?;
            ChatResponse {
                text: output.text,
                image: Some(output.image_data_url),
                gallery: None,
                continuation: None,
            }
        }
        Command::GallerySearch(query) => {
            if query.is_empty() {
                return Err(ApiError::Validation(
                    "Search query is empty. Example: /pin aesthetic wallpaper".to_string(),
                ));
            }
            let results = state
                .gallery
                .search(&query)
                .await
                .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;
            let text = if results.is_empty() {
                format!("No images found for \"{query}\"")
            } else {
                format!("Found {} images for \"{query}\"", results.len())
            };
            ChatResponse {
                text,
                image: None,
                gallery: Some(results),
                continuation: None,
            }
        }
        Command::Chat(text) => {
            let reply = state
                .gemini
                .generate_text_or_vision(&text, image.as_ref())
                .await?;
            ChatResponse::text_only(reply)
        }
    };

    Ok(Json(response.with_continuation(request.continuation)))
}

/// GET /api/chat — cheap liveness probe for the relay path
pub async fn chat_liveness(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": state.settings.app_name,
        "hint": "POST a JSON body with a 'message' field",
    }))
}
