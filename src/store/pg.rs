//! PostgreSQL-backed store.
//!
//! Uses runtime queries to avoid sqlx compile-time database connection.
//! Schema lives in `schema.sql` at the repository root.

use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

use super::{
    Database, EpisodeUrlRecord, GuestRecord, IdentityStore, MediaStore, RefreshTokenRecord,
    RefreshTokenStore,
};
use crate::auth::identity::TelegramProfile;

pub struct PgStore {
    db: Arc<Database>,
}

impl PgStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn guest_from_row(row: &sqlx::postgres::PgRow) -> Result<GuestRecord, sqlx::Error> {
        Ok(GuestRecord {
            user_id: row.try_get("user_id")?,
            guest_token: row.try_get("guest_token")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_guest_by_token(&self, token: &str) -> anyhow::Result<Option<GuestRecord>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, guest_token, created_at
            FROM users
            WHERE guest_token = $1 AND is_guest = TRUE
            "#,
        )
        .bind(token)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(Self::guest_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_or_create_guest(&self, token: &str) -> anyhow::Result<GuestRecord> {
        // Single-statement upsert: two concurrent resolutions of the same
        // token converge on one row. The no-op DO UPDATE makes the existing
        // row visible to RETURNING without rewriting its token.
        let row = sqlx::query(
            r#"
            INSERT INTO users (guest_token, is_guest, username)
            VALUES ($1, TRUE, $2)
            ON CONFLICT (guest_token)
            DO UPDATE SET guest_token = EXCLUDED.guest_token
            RETURNING user_id, guest_token, created_at
            "#,
        )
        .bind(token)
        .bind(format!("guest_{}", token))
        .fetch_one(self.db.pool())
        .await?;

        Ok(Self::guest_from_row(&row)?)
    }

    async fn find_or_create_telegram_user(
        &self,
        profile: &TelegramProfile,
    ) -> anyhow::Result<i64> {
        // No-op DO UPDATE so a returning user keeps their stored profile.
        let row = sqlx::query(
            r#"
            INSERT INTO users (telegram_id, is_guest, first_name, last_name, username)
            VALUES ($1, FALSE, $2, $3, $4)
            ON CONFLICT (telegram_id)
            DO UPDATE SET telegram_id = EXCLUDED.telegram_id
            RETURNING user_id
            "#,
        )
        .bind(profile.provider_user_id)
        .bind(&profile.first_name)
        .bind(profile.last_name.as_deref().unwrap_or(""))
        .bind(profile.username.as_deref().unwrap_or(""))
        .fetch_one(self.db.pool())
        .await?;

        Ok(row.try_get("user_id")?)
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn save_refresh_token(&self, record: &RefreshTokenRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, device_info, revoked, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&record.token)
        .bind(record.user_id)
        .bind(record.device_info.as_deref())
        .bind(record.revoked)
        .bind(record.expires_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> anyhow::Result<Option<RefreshTokenRecord>> {
        let row = sqlx::query(
            r#"
            SELECT token, user_id, device_info, revoked, expires_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(RefreshTokenRecord {
                token: row.try_get("token")?,
                user_id: row.try_get("user_id")?,
                device_info: row.try_get("device_info")?,
                revoked: row.try_get("revoked")?,
                expires_at: row.try_get("expires_at")?,
            })),
            None => Ok(None),
        }
    }

    async fn revoke_refresh_token(&self, token: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token = $1 AND revoked = FALSE
            "#,
        )
        .bind(token)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MediaStore for PgStore {
    async fn find_episode_url_by_access_key(
        &self,
        access_key: &str,
    ) -> anyhow::Result<Option<EpisodeUrlRecord>> {
        let row = sqlx::query(
            r#"
            SELECT episode_id, quality, oss_url, cdn_url, subtitle_url, access_key
            FROM episode_urls
            WHERE access_key = $1
            "#,
        )
        .bind(access_key)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(EpisodeUrlRecord {
                episode_id: row.try_get("episode_id")?,
                quality: row.try_get("quality")?,
                oss_url: row.try_get("oss_url")?,
                cdn_url: row.try_get("cdn_url")?,
                subtitle_url: row.try_get("subtitle_url")?,
                access_key: row.try_get("access_key")?,
            })),
            None => Ok(None),
        }
    }
}
