//! Gateway request/response types and the unified response envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::error::AuthError;
use crate::auth::session::SessionCredential;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    pub const AUTH_EXPIRED: i32 = 2003;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4004;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
    pub const SIGNING_FAILURE: i32 = 5002;
}

/// Transport-level error: HTTP status plus envelope code/message.
///
/// The single place where [`AuthError`] is mapped onto the wire; handlers and
/// middleware return this and never build status codes ad hoc.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn missing_auth(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error_codes::MISSING_AUTH, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        // Internal failures get logged with detail here; the response body
        // stays generic.
        if err.is_internal() {
            tracing::error!(error = %err, "internal auth failure");
        }
        match err {
            // Pre-crypto rejections may name the offending field; nothing
            // about the secret material leaks through them.
            AuthError::MalformedPayload(msg) => Self::bad_request(msg),
            // Signature mismatch and tampered fields collapse to the same
            // response on purpose.
            AuthError::InvalidSignature => Self::unauthorized("authentication failed"),
            AuthError::Expired => Self::new(
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_EXPIRED,
                "authentication data expired",
            ),
            AuthError::SigningFailure => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::SIGNING_FAILURE,
                "internal error",
            ),
            AuthError::Store(_) => Self::internal("internal error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(self.code, self.msg);
        (self.status, Json(body)).into_response()
    }
}

// ============================================================================
// Auth DTOs (wire field names follow the original client contract)
// ============================================================================

/// Guest login request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GuestLoginRequest {
    /// Returning-guest token; omit on first visit.
    #[serde(default, rename = "guestToken")]
    #[schema(example = "guest_abc123def456")]
    pub guest_token: Option<String>,
    #[serde(default, rename = "deviceInfo")]
    #[schema(example = "iPhone 14 Pro")]
    pub device_info: Option<String>,
}

/// Guest login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct GuestLoginResponse {
    #[serde(flatten)]
    pub credential: SessionCredential,
    #[serde(rename = "guestToken")]
    pub guest_token: String,
    #[serde(rename = "isNewGuest")]
    pub is_new_guest: bool,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// Telegram bot-login request: the login-widget payload plus device info.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BotLoginRequest {
    #[schema(example = 6702079700_i64)]
    pub id: i64,
    #[schema(example = "随风")]
    pub first_name: String,
    pub last_name: Option<String>,
    #[schema(example = "seo99991")]
    pub username: Option<String>,
    #[schema(example = 1754642628_i64)]
    pub auth_date: i64,
    pub hash: String,
    #[serde(default, rename = "deviceInfo")]
    pub device_info: Option<String>,
}

/// Telegram WebApp login request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WebAppLoginRequest {
    /// Raw `initData` query string from the WebApp client.
    #[serde(rename = "initData")]
    pub init_data: String,
    #[serde(default, rename = "deviceInfo")]
    pub device_info: Option<String>,
}

/// Response for both Telegram login flows.
#[derive(Debug, Serialize, ToSchema)]
pub struct TelegramLoginResponse {
    #[serde(flatten)]
    pub credential: SessionCredential,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// Refresh / logout request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Logout response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub revoked: bool,
}

// ============================================================================
// Media DTOs
// ============================================================================

/// Mint the deterministic access key for one media variant.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MintAccessKeyRequest {
    /// Stable external id of the series or other media container.
    #[schema(example = "test-simple-001")]
    pub media_id: String,
    /// Episode number; disambiguates re-encodes of the same container.
    #[schema(example = 6_u32)]
    pub sequence: Option<u32>,
    #[schema(example = "720p")]
    pub quality: String,
}

/// Minted key plus the playback path it unlocks.
#[derive(Debug, Serialize, ToSchema)]
pub struct MintAccessKeyResponse {
    #[schema(example = "47b29a53a53a58a40e7b46cf167dd19b")]
    pub access_key: String,
    #[schema(example = "/api/v1/media/playback/47b29a53a53a58a40e7b46cf167dd19b")]
    pub playback_path: String,
}
