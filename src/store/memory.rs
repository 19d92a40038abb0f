//! Volatile in-memory store.
//!
//! Backs local development when `DATABASE_URL` is not configured, and the
//! test suites. Same trait contracts as the PostgreSQL store, including the
//! atomic find-or-create guest semantics.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{
    EpisodeUrlRecord, GuestRecord, IdentityStore, MediaStore, RefreshTokenRecord,
    RefreshTokenStore,
};
use crate::auth::identity::TelegramProfile;

#[derive(Default)]
struct Users {
    next_user_id: i64,
    guests_by_token: HashMap<String, GuestRecord>,
    telegram_by_provider_id: HashMap<i64, i64>,
}

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Users>,
    refresh_tokens: Mutex<HashMap<String, RefreshTokenRecord>>,
    episode_urls: Mutex<HashMap<String, EpisodeUrlRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a playable URL row; test and dev-mode helper.
    pub fn insert_episode_url(&self, record: EpisodeUrlRecord) {
        self.episode_urls
            .lock()
            .expect("episode url lock poisoned")
            .insert(record.access_key.clone(), record);
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_guest_by_token(&self, token: &str) -> anyhow::Result<Option<GuestRecord>> {
        let users = self.users.lock().expect("user lock poisoned");
        Ok(users.guests_by_token.get(token).cloned())
    }

    async fn find_or_create_guest(&self, token: &str) -> anyhow::Result<GuestRecord> {
        let mut users = self.users.lock().expect("user lock poisoned");
        if let Some(existing) = users.guests_by_token.get(token) {
            return Ok(existing.clone());
        }
        users.next_user_id += 1;
        let record = GuestRecord {
            user_id: users.next_user_id,
            guest_token: token.to_string(),
            created_at: Utc::now(),
        };
        users.guests_by_token.insert(token.to_string(), record.clone());
        Ok(record)
    }

    async fn find_or_create_telegram_user(
        &self,
        profile: &TelegramProfile,
    ) -> anyhow::Result<i64> {
        let mut users = self.users.lock().expect("user lock poisoned");
        if let Some(user_id) = users.telegram_by_provider_id.get(&profile.provider_user_id) {
            return Ok(*user_id);
        }
        users.next_user_id += 1;
        let user_id = users.next_user_id;
        users
            .telegram_by_provider_id
            .insert(profile.provider_user_id, user_id);
        Ok(user_id)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn save_refresh_token(&self, record: &RefreshTokenRecord) -> anyhow::Result<()> {
        self.refresh_tokens
            .lock()
            .expect("refresh token lock poisoned")
            .insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> anyhow::Result<Option<RefreshTokenRecord>> {
        let tokens = self.refresh_tokens.lock().expect("refresh token lock poisoned");
        Ok(tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str) -> anyhow::Result<bool> {
        let mut tokens = self.refresh_tokens.lock().expect("refresh token lock poisoned");
        match tokens.get_mut(token) {
            Some(record) if !record.revoked => {
                record.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn find_episode_url_by_access_key(
        &self,
        access_key: &str,
    ) -> anyhow::Result<Option<EpisodeUrlRecord>> {
        let urls = self.episode_urls.lock().expect("episode url lock poisoned");
        Ok(urls.get(access_key).cloned())
    }
}
