//! Identity, refresh-token, and media persistence.
//!
//! The auth core consumes storage through the traits below and never touches
//! a connection pool directly. Two implementations exist: [`PgStore`] backed
//! by PostgreSQL, and [`memory::MemoryStore`] for development without a
//! database and for tests.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use utoipa::ToSchema;

use crate::auth::identity::TelegramProfile;

pub use memory::MemoryStore;
pub use pg::PgStore;

/// PostgreSQL database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Persisted guest record. Created on first token-less login, reused on
/// every later login presenting the token, never deleted by this subsystem.
#[derive(Debug, Clone)]
pub struct GuestRecord {
    pub user_id: i64,
    pub guest_token: String,
    pub created_at: DateTime<Utc>,
}

/// Persisted refresh token. The core mints the opaque value; rotation and
/// revocation bookkeeping live here.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub device_info: Option<String>,
    pub revoked: bool,
}

/// Playable URL row for one episode variant, addressed by its access key.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EpisodeUrlRecord {
    pub episode_id: i64,
    pub quality: String,
    pub oss_url: String,
    pub cdn_url: String,
    pub subtitle_url: Option<String>,
    #[serde(skip)]
    pub access_key: String,
}

/// User and guest identity lookups.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_guest_by_token(&self, token: &str) -> anyhow::Result<Option<GuestRecord>>;

    /// Atomic find-or-create by token. Must be a single upsert so two
    /// concurrent logins presenting the same unknown token cannot create
    /// duplicate guests; callers invoke it once per resolution and never
    /// retry internally.
    async fn find_or_create_guest(&self, token: &str) -> anyhow::Result<GuestRecord>;

    /// Map a verified Telegram profile to an internal user id, creating the
    /// user row on first login. An existing row's profile is left untouched.
    async fn find_or_create_telegram_user(&self, profile: &TelegramProfile)
    -> anyhow::Result<i64>;
}

/// Refresh token persistence.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn save_refresh_token(&self, record: &RefreshTokenRecord) -> anyhow::Result<()>;
    async fn find_refresh_token(&self, token: &str) -> anyhow::Result<Option<RefreshTokenRecord>>;
    /// Returns whether a matching token existed.
    async fn revoke_refresh_token(&self, token: &str) -> anyhow::Result<bool>;
}

/// Episode URL lookups for the playback path.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn find_episode_url_by_access_key(
        &self,
        access_key: &str,
    ) -> anyhow::Result<Option<EpisodeUrlRecord>>;
}
