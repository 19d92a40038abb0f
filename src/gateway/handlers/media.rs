//! Media access-key handlers.
//!
//! The playback lookup is public: the access key itself is the entitlement.
//! Minting a key requires an authenticated session.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::access_key::{self, MediaResourceDescriptor};
use crate::auth::AuthError;
use crate::auth::session::Claims;
use crate::store::{EpisodeUrlRecord, MediaStore};

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResponse, MintAccessKeyRequest, MintAccessKeyResponse};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Resolve a playback address by access key
///
/// Malformed keys are rejected before the store is consulted, so key
/// enumeration cannot produce table scans.
#[utoipa::path(
    get,
    path = "/api/v1/media/playback/{access_key}",
    params(
        ("access_key" = String, Path, description = "Opaque 32-character access key")
    ),
    responses(
        (status = 200, description = "Playable URLs", body = ApiResponse<EpisodeUrlRecord>),
        (status = 400, description = "Malformed access key"),
        (status = 404, description = "No such playback address")
    ),
    tag = "Media"
)]
pub async fn get_playback(
    State(state): State<Arc<AppState>>,
    Path(access_key): Path<String>,
) -> ApiResult<EpisodeUrlRecord> {
    if !access_key::validate(&access_key) {
        return Err(ApiError::bad_request("invalid access key format"));
    }

    let record = state
        .media_store
        .find_episode_url_by_access_key(&access_key.to_ascii_lowercase())
        .await
        .map_err(|e| ApiError::from(AuthError::Store(e.to_string())))?
        .ok_or_else(|| ApiError::not_found("playback address not found"))?;

    Ok(Json(ApiResponse::success(record)))
}

/// Mint the deterministic access key for a media variant
///
/// Requires a valid session. The same descriptor always yields the same key,
/// so catalog jobs can regenerate keys without storing them.
#[utoipa::path(
    post,
    path = "/api/v1/media/mint",
    request_body = MintAccessKeyRequest,
    responses(
        (status = 200, description = "Key minted", body = ApiResponse<MintAccessKeyResponse>),
        (status = 400, description = "Invalid descriptor"),
        (status = 401, description = "Missing or invalid session token")
    ),
    security(("bearer_jwt" = [])),
    tag = "Media"
)]
pub async fn mint_access_key(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MintAccessKeyRequest>,
) -> ApiResult<MintAccessKeyResponse> {
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| ApiError::unauthorized("Invalid user ID in token"))?;

    let descriptor = MediaResourceDescriptor::new(req.media_id, req.sequence, req.quality)
        .map_err(|e| ApiError::bad_request(e))?;

    let key = access_key::generate(&descriptor, state.secrets.access_key_secret.as_bytes());
    tracing::info!(user_id, descriptor = %descriptor, "access key minted");

    Ok(Json(ApiResponse::success(MintAccessKeyResponse {
        playback_path: format!("/api/v1/media/playback/{}", key),
        access_key: key.to_string(),
    })))
}
