//! Authentication error taxonomy.
//!
//! All four identity paths (bot-login, webapp-login, guest, refresh) funnel
//! through this one enum so the gateway has a single mapping table to HTTP
//! responses. A signature mismatch and a tampered field are deliberately the
//! same variant: the caller must not be able to tell them apart.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Required field missing or ill-typed. Raised before any HMAC work.
    #[error("malformed payload: {0}")]
    MalformedPayload(&'static str),

    /// HMAC mismatch, or an otherwise invalid credential.
    #[error("signature verification failed")]
    InvalidSignature,

    /// `auth_date` (or a refresh token) outside its freshness window.
    #[error("authentication data expired")]
    Expired,

    /// Session-signing secret unavailable or unusable. Never downgraded.
    #[error("session signing failed")]
    SigningFailure,

    /// Identity store failure. Surfaced as a 5xx, never as a login rejection.
    #[error("identity store error: {0}")]
    Store(String),
}

impl AuthError {
    /// True for failures that are the server's fault rather than the caller's.
    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::SigningFailure | AuthError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_classification() {
        assert!(AuthError::SigningFailure.is_internal());
        assert!(AuthError::Store("down".to_string()).is_internal());
        assert!(!AuthError::InvalidSignature.is_internal());
        assert!(!AuthError::Expired.is_internal());
        assert!(!AuthError::MalformedPayload("hash is required").is_internal());
    }
}
