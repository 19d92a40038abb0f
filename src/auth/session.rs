//! Session credential issuance.
//!
//! Access tokens are HS256 JWTs carrying `{sub, iat, exp}`; refresh tokens
//! are opaque high-entropy strings whose storage and revocation live behind
//! [`RefreshTokenStore`]. Issuing twice for the same subject yields two
//! independent, both-valid credential pairs.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::AuthError;
use crate::store::{RefreshTokenRecord, RefreshTokenStore};

/// JWT claims carried by an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user_id as string)
    pub sub: String,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
    /// Issued at
    pub iat: usize,
}

/// Access/refresh pair returned by every login flow.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionCredential {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `"Bearer"`.
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds.
    #[schema(example = 3600_u64)]
    pub expires_in: u64,
}

/// Response to a refresh-token exchange; the refresh token itself is not
/// rotated.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefreshedAccess {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
    refresh_store: Arc<dyn RefreshTokenStore>,
}

impl SessionIssuer {
    pub fn new(
        session_secret: &str,
        access_ttl_secs: u64,
        refresh_ttl_secs: u64,
        refresh_store: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(session_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(session_secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
            refresh_store,
        }
    }

    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl_secs
    }

    /// Issue a fresh credential pair for a verified subject.
    ///
    /// # Errors
    ///
    /// [`AuthError::SigningFailure`] if encoding fails,
    /// [`AuthError::Store`] if the refresh token cannot be persisted.
    pub async fn issue(
        &self,
        user_id: i64,
        device_info: Option<String>,
    ) -> Result<SessionCredential, AuthError> {
        let access_token = self.sign_access_token(user_id)?;

        let refresh_token = mint_refresh_token();
        let record = RefreshTokenRecord {
            token: refresh_token.clone(),
            user_id,
            expires_at: Utc::now() + Duration::seconds(self.refresh_ttl_secs as i64),
            device_info,
            revoked: false,
        };
        self.refresh_store
            .save_refresh_token(&record)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(SessionCredential {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl_secs,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Unknown and revoked tokens both collapse to
    /// [`AuthError::InvalidSignature`]; an expired token is revoked and
    /// reported as [`AuthError::Expired`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedAccess, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::MalformedPayload("refresh_token is required"));
        }

        let record = self
            .refresh_store
            .find_refresh_token(refresh_token)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?
            .ok_or(AuthError::InvalidSignature)?;

        if record.revoked {
            return Err(AuthError::InvalidSignature);
        }
        if record.expires_at < Utc::now() {
            self.refresh_store
                .revoke_refresh_token(refresh_token)
                .await
                .map_err(|e| AuthError::Store(e.to_string()))?;
            return Err(AuthError::Expired);
        }

        Ok(RefreshedAccess {
            access_token: self.sign_access_token(record.user_id)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl_secs,
        })
    }

    /// Revoke a refresh token (logout). Returns whether a token was revoked.
    pub async fn revoke(&self, refresh_token: &str) -> Result<bool, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::MalformedPayload("refresh_token is required"));
        }
        self.refresh_store
            .revoke_refresh_token(refresh_token)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }

    /// Decode and validate an access token; used by the gateway middleware.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidSignature)
    }

    fn sign_access_token(&self, user_id: i64) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now.timestamp() + self.access_ttl_secs as i64) as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::SigningFailure)
    }
}

/// Opaque refresh token value: 32 random bytes, hex-encoded.
fn mint_refresh_token() -> String {
    let mut entropy = [0u8; 32];
    OsRng.fill_bytes(&mut entropy);
    hex::encode(entropy)
}
