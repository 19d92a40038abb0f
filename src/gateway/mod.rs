//! HTTP gateway: route wiring and server startup.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::auth::guest::GuestIdentityResolver;
use crate::auth::middleware::jwt_auth_middleware;
use crate::auth::session::SessionIssuer;
use crate::config::{AppConfig, AuthSecrets};
use crate::store::{Database, IdentityStore, MediaStore};
use state::AppState;

/// Start the HTTP gateway server.
#[allow(clippy::too_many_arguments)]
pub async fn run_server(
    config: &AppConfig,
    secrets: Arc<AuthSecrets>,
    identity_store: Arc<dyn IdentityStore>,
    media_store: Arc<dyn MediaStore>,
    guest_resolver: GuestIdentityResolver,
    session: Arc<SessionIssuer>,
    pg_db: Option<Arc<Database>>,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(
        identity_store,
        media_store,
        guest_resolver,
        session,
        secrets,
        config.auth.clone(),
        pg_db,
    ));

    // ==========================================================================
    // Auth routes (public: they ARE the login surface)
    // ==========================================================================
    let auth_routes = Router::new()
        .route("/guest-login", post(handlers::auth::guest_login))
        .route("/telegram/bot-login", post(handlers::auth::bot_login))
        .route("/telegram/webapp-login", post(handlers::auth::webapp_login))
        .route("/refresh", post(handlers::auth::refresh_token))
        .route("/logout", post(handlers::auth::logout));

    // ==========================================================================
    // Media routes: playback lookup is public (the key is the entitlement),
    // minting requires a session
    // ==========================================================================
    let media_routes = Router::new()
        .route("/playback/{access_key}", get(handlers::media::get_playback))
        .merge(
            Router::new()
                .route("/mint", post(handlers::media::mint_access_key))
                .layer(from_fn_with_state(state.clone(), jwt_auth_middleware)),
        );

    // Build complete router
    let app = Router::new()
        .route("/api/v1/health", get(handlers::health::health_check))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/media", media_routes)
        .with_state(state);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("gateway listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
