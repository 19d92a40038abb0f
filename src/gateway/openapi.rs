//! OpenAPI 3.0 documentation.
//!
//! Export with `cargo run --bin export_openapi > openapi.json`.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::session::{RefreshedAccess, SessionCredential};
use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{
    BotLoginRequest, GuestLoginRequest, GuestLoginResponse, LogoutResponse, MintAccessKeyRequest,
    MintAccessKeyResponse, RefreshTokenRequest, TelegramLoginResponse, WebAppLoginRequest,
};
use crate::store::EpisodeUrlRecord;

/// Bearer JWT security scheme for session-protected endpoints
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_jwt",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "playgate API",
        version = "1.0.0",
        description = "Authentication and media access-key gateway: Telegram bot/WebApp login, guest sessions, and deterministic playback access keys.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::auth::guest_login,
        crate::gateway::handlers::auth::bot_login,
        crate::gateway::handlers::auth::webapp_login,
        crate::gateway::handlers::auth::refresh_token,
        crate::gateway::handlers::auth::logout,
        crate::gateway::handlers::media::get_playback,
        crate::gateway::handlers::media::mint_access_key,
    ),
    components(schemas(
        HealthResponse,
        SessionCredential,
        RefreshedAccess,
        GuestLoginRequest,
        GuestLoginResponse,
        BotLoginRequest,
        WebAppLoginRequest,
        TelegramLoginResponse,
        RefreshTokenRequest,
        LogoutResponse,
        MintAccessKeyRequest,
        MintAccessKeyResponse,
        EpisodeUrlRecord,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, refresh, logout"),
        (name = "Media", description = "Access-key minting and playback resolution"),
        (name = "System", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;
