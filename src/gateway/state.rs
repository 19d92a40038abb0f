//! Shared gateway application state.

use std::sync::Arc;

use crate::auth::guest::GuestIdentityResolver;
use crate::auth::session::SessionIssuer;
use crate::config::{AuthConfig, AuthSecrets};
use crate::store::{Database, IdentityStore, MediaStore};

pub struct AppState {
    pub identity_store: Arc<dyn IdentityStore>,
    pub media_store: Arc<dyn MediaStore>,
    pub guest_resolver: GuestIdentityResolver,
    pub session: Arc<SessionIssuer>,
    pub secrets: Arc<AuthSecrets>,
    pub auth_cfg: AuthConfig,
    /// Present only when running against PostgreSQL; used by the health check.
    pub pg_db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        identity_store: Arc<dyn IdentityStore>,
        media_store: Arc<dyn MediaStore>,
        guest_resolver: GuestIdentityResolver,
        session: Arc<SessionIssuer>,
        secrets: Arc<AuthSecrets>,
        auth_cfg: AuthConfig,
        pg_db: Option<Arc<Database>>,
    ) -> Self {
        Self {
            identity_store,
            media_store,
            guest_resolver,
            session,
            secrets,
            auth_cfg,
            pg_db,
        }
    }
}
