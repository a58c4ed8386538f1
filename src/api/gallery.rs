//! Gallery search endpoint

use crate::error::ApiError;
use crate::schemas::chat::GalleryResponse;
use crate::server::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    #[serde(default)]
    q: Option<String>,
}

/// GET /api/gallery?q=...
pub async fn handle_gallery(
    State(state): State<AppState>,
    Query(params): Query<GalleryQuery>,
) -> Result<Json<GalleryResponse>, ApiError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            ApiError::Validation("Query parameter 'q' is required".to_string())
        })?;

    let results = state
        .gallery
        .search(query)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;

    Ok(Json(GalleryResponse {
        query: query.to_string(),
        count: results.len(),
        results,
    }))
}
