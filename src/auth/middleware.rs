//! JWT authentication middleware for Axum.
//!
//! Verifies the `Authorization: Bearer <jwt>` header and injects the decoded
//! [`Claims`](super::session::Claims) into request extensions for handlers.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::gateway::state::AppState;
use crate::gateway::types::ApiError;

pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract Authorization header
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::missing_auth("Missing Authorization header"))?;

    // 2. Require the Bearer scheme
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::missing_auth("Invalid token format"))?;

    // 3. Verify and inject claims
    let claims = state.session.verify_access_token(token)?;
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
