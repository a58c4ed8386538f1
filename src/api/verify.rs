//! Standalone allow-list verification endpoint

use crate::error::ApiError;
use crate::schemas::chat::{VerifyRequest, VerifyResponse};
use crate::server::state::AppState;
use crate::utils::{client_ip, normalize_ip};
use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use std::net::SocketAddr;

/// POST /api/verify
///
/// Checks a claimed (name, ip) pair against the allow-list without
/// touching the upstream, so clients can probe their access up front.
pub async fn handle_verify(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let observed = client_ip(&headers, Some(peer));

    let user = state
        .allowlist
        .verify(
            request.name.as_deref(),
            request.ip.as_deref(),
            observed.as_deref(),
        )
        .await?;

    let ip = request
        .ip
        .as_deref()
        .map(normalize_ip)
        .unwrap_or_default();

    Ok(Json(VerifyResponse { ok: true, user, ip }))
}
