//! Login, refresh, and logout handlers.
//!
//! Thin adapters: parse the wire DTO into an [`IdentityAssertion`], run it
//! through [`verify_assertion`], map the verified identity to an internal
//! user id, and hand the subject to the session issuer. All failures funnel
//! through the [`ApiError`](super::super::types::ApiError) mapping.

use axum::{Json, extract::State};
use chrono::Utc;
use std::sync::Arc;

use crate::auth::identity::{BotLoginPayload, IdentityAssertion, TelegramProfile, VerifiedIdentity};
use crate::auth::session::RefreshedAccess;
use crate::auth::{AuthError, verify_assertion};
use crate::store::IdentityStore;

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResponse, BotLoginRequest, GuestLoginRequest, GuestLoginResponse, LogoutResponse,
    RefreshTokenRequest, TelegramLoginResponse, WebAppLoginRequest,
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

async fn verify(state: &AppState, assertion: IdentityAssertion) -> Result<VerifiedIdentity, AuthError> {
    verify_assertion(
        assertion,
        &state.guest_resolver,
        &state.secrets.bot_token,
        state.auth_cfg.auth_max_age_secs,
        Utc::now().timestamp(),
    )
    .await
}

/// Guest login
///
/// Creates a guest account on first visit; a returning guest presents the
/// token from an earlier response and keeps the same account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/guest-login",
    request_body = GuestLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<GuestLoginResponse>),
        (status = 500, description = "Identity store unavailable")
    ),
    tag = "Auth"
)]
pub async fn guest_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GuestLoginRequest>,
) -> ApiResult<GuestLoginResponse> {
    let identity = verify(
        &state,
        IdentityAssertion::Guest {
            guest_token: req.guest_token,
        },
    )
    .await?;
    let VerifiedIdentity::Guest {
        user_id,
        guest_token,
        is_new_guest,
    } = identity
    else {
        unreachable!("guest assertion verifies to a guest identity")
    };

    let credential = state.session.issue(user_id, req.device_info).await?;
    tracing::info!(user_id, is_new_guest, "guest login");

    Ok(Json(ApiResponse::success(GuestLoginResponse {
        credential,
        guest_token,
        is_new_guest,
        user_id,
    })))
}

/// Telegram bot login
///
/// Verifies the login-widget payload with the `SHA256(bot_token)` HMAC
/// scheme, then issues a session for the mapped internal user.
#[utoipa::path(
    post,
    path = "/api/v1/auth/telegram/bot-login",
    request_body = BotLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<TelegramLoginResponse>),
        (status = 400, description = "Malformed payload"),
        (status = 401, description = "Signature invalid or expired")
    ),
    tag = "Auth"
)]
pub async fn bot_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BotLoginRequest>,
) -> ApiResult<TelegramLoginResponse> {
    let assertion = IdentityAssertion::BotLogin(BotLoginPayload {
        id: req.id,
        first_name: req.first_name,
        last_name: req.last_name,
        username: req.username,
        auth_date: req.auth_date,
        hash: req.hash,
    });
    let identity = verify(&state, assertion).await?;
    let VerifiedIdentity::Telegram(profile) = identity else {
        unreachable!("bot assertion verifies to a telegram identity")
    };
    issue_telegram_session(&state, profile, req.device_info).await
}

/// Telegram WebApp login
///
/// Verifies the raw `initData` string with the two-step `WebAppData`
/// derivation and logs in the embedded user.
#[utoipa::path(
    post,
    path = "/api/v1/auth/telegram/webapp-login",
    request_body = WebAppLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<TelegramLoginResponse>),
        (status = 400, description = "Malformed initData"),
        (status = 401, description = "Signature invalid or expired")
    ),
    tag = "Auth"
)]
pub async fn webapp_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WebAppLoginRequest>,
) -> ApiResult<TelegramLoginResponse> {
    let assertion = IdentityAssertion::WebAppInitData {
        init_data: req.init_data,
    };
    let identity = verify(&state, assertion).await?;
    let VerifiedIdentity::Telegram(profile) = identity else {
        unreachable!("webapp assertion verifies to a telegram identity")
    };
    issue_telegram_session(&state, profile, req.device_info).await
}

async fn issue_telegram_session(
    state: &AppState,
    profile: TelegramProfile,
    device_info: Option<String>,
) -> ApiResult<TelegramLoginResponse> {
    let user_id = state
        .identity_store
        .find_or_create_telegram_user(&profile)
        .await
        .map_err(|e| ApiError::from(AuthError::Store(e.to_string())))?;

    let credential = state.session.issue(user_id, device_info).await?;
    tracing::info!(
        user_id,
        provider_user_id = profile.provider_user_id,
        "telegram login"
    );

    Ok(Json(ApiResponse::success(TelegramLoginResponse {
        credential,
        user_id,
    })))
}

/// Refresh the access token
///
/// Exchanges a refresh token for a new access token. The refresh token is
/// not rotated.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Refresh successful", body = ApiResponse<RefreshedAccess>),
        (status = 400, description = "Missing refresh_token"),
        (status = 401, description = "Unknown, revoked, or expired refresh token")
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<RefreshedAccess> {
    let refreshed = state.session.refresh(&req.refresh_token).await?;
    Ok(Json(ApiResponse::success(refreshed)))
}

/// Logout
///
/// Revokes the presented refresh token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Logout successful", body = ApiResponse<LogoutResponse>),
        (status = 401, description = "Unknown refresh token")
    ),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<LogoutResponse> {
    let revoked = state.session.revoke(&req.refresh_token).await?;
    if !revoked {
        return Err(ApiError::unauthorized("invalid refresh token"));
    }
    Ok(Json(ApiResponse::success(LogoutResponse { revoked })))
}
