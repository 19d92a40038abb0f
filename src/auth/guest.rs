//! Guest identity resolution.
//!
//! A guest is a full user row distinguished by `is_guest` and an opaque
//! `guest_token` the client stores on-device. An unknown or absent token
//! self-heals into a freshly minted guest; an existing record's token is
//! never rewritten.

use std::sync::Arc;

use rand::RngCore;
use rand::rngs::OsRng;

use super::error::AuthError;
use super::identity::VerifiedIdentity;
use crate::store::IdentityStore;

/// Prefix carried by every guest token; the remainder is 32 hex chars
/// (128 bits of OS entropy).
pub const GUEST_TOKEN_PREFIX: &str = "guest_";

pub struct GuestIdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl GuestIdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Reconcile an optional client-supplied guest token into a verified
    /// guest identity.
    ///
    /// A known token returns its existing guest with `is_new_guest = false`.
    /// An unknown or absent token mints a new one and creates the record via
    /// a single atomic find-or-create call; the store must not be asked to
    /// check-then-insert.
    pub async fn resolve(
        &self,
        guest_token: Option<&str>,
    ) -> Result<VerifiedIdentity, AuthError> {
        if let Some(token) = guest_token.filter(|token| !token.is_empty()) {
            let found = self
                .store
                .find_guest_by_token(token)
                .await
                .map_err(|e| AuthError::Store(e.to_string()))?;
            if let Some(record) = found {
                return Ok(VerifiedIdentity::Guest {
                    user_id: record.user_id,
                    guest_token: record.guest_token,
                    is_new_guest: false,
                });
            }
            // Unknown token: fall through and mint a fresh identity rather
            // than adopting a client-chosen token value.
        }

        let token = mint_guest_token();
        let record = self
            .store
            .find_or_create_guest(&token)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(VerifiedIdentity::Guest {
            user_id: record.user_id,
            guest_token: record.guest_token,
            is_new_guest: true,
        })
    }
}

fn mint_guest_token() -> String {
    let mut entropy = [0u8; 16];
    OsRng.fill_bytes(&mut entropy);
    format!("{}{}", GUEST_TOKEN_PREFIX, hex::encode(entropy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn resolver() -> GuestIdentityResolver {
        GuestIdentityResolver::new(Arc::new(MemoryStore::new()))
    }

    fn as_guest(identity: VerifiedIdentity) -> (i64, String, bool) {
        match identity {
            VerifiedIdentity::Guest {
                user_id,
                guest_token,
                is_new_guest,
            } => (user_id, guest_token, is_new_guest),
            other => panic!("expected guest identity, got {:?}", other),
        }
    }

    #[test]
    fn test_minted_token_format() {
        let token = mint_guest_token();
        assert!(token.starts_with(GUEST_TOKEN_PREFIX));
        let hex_part = &token[GUEST_TOKEN_PREFIX.len()..];
        assert_eq!(hex_part.len(), 32);
        assert!(hex_part.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_resolve_without_token_creates_new_guest() {
        let resolver = resolver();
        let (_, token, is_new) = as_guest(resolver.resolve(None).await.unwrap());
        assert!(is_new);
        assert!(token.starts_with(GUEST_TOKEN_PREFIX));
    }

    #[tokio::test]
    async fn test_resolve_returning_guest_is_stable() {
        let resolver = resolver();
        let (user_id, token, _) = as_guest(resolver.resolve(None).await.unwrap());

        let (again_id, again_token, is_new) =
            as_guest(resolver.resolve(Some(&token)).await.unwrap());
        assert_eq!(again_id, user_id);
        assert_eq!(again_token, token);
        assert!(!is_new);
    }

    #[tokio::test]
    async fn test_unknown_token_mints_fresh_identity() {
        let resolver = resolver();
        let (_, token, is_new) = as_guest(
            resolver
                .resolve(Some("guest_00000000000000000000000000000000"))
                .await
                .unwrap(),
        );
        assert!(is_new);
        // The client-supplied unknown token is never adopted.
        assert_ne!(token, "guest_00000000000000000000000000000000");
    }

    #[tokio::test]
    async fn test_empty_token_treated_as_absent() {
        let resolver = resolver();
        let (_, _, is_new) = as_guest(resolver.resolve(Some("")).await.unwrap());
        assert!(is_new);
    }

    #[tokio::test]
    async fn test_successive_anonymous_logins_are_distinct_guests() {
        let resolver = resolver();
        let (first_id, first_token, _) = as_guest(resolver.resolve(None).await.unwrap());
        let (second_id, second_token, _) = as_guest(resolver.resolve(None).await.unwrap());
        assert_ne!(first_id, second_id);
        assert_ne!(first_token, second_token);
    }
}
