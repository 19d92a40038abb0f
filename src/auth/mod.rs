//! Identity verification and session issuance.
//!
//! Three login sources are supported, each mapped onto the same
//! [`error::AuthError`] taxonomy and the same [`session::SessionCredential`]
//! output:
//!
//! - Telegram bot-login payloads, verified with the `SHA256(bot_token)` keyed
//!   scheme ([`hash::verify_bot_hash`])
//! - Telegram WebApp `initData` strings, verified with the two-step
//!   `WebAppData` derivation ([`hash::verify_init_data`])
//! - anonymous guests, reconciled against the identity store
//!   ([`guest::GuestIdentityResolver`])
//!
//! The two Telegram schemes use different keying material and are not
//! interchangeable.

pub mod error;
pub mod guest;
pub mod hash;
pub mod identity;
pub mod middleware;
pub mod session;

pub use error::AuthError;
pub use guest::GuestIdentityResolver;
pub use identity::{BotLoginPayload, IdentityAssertion, TelegramProfile, VerifiedIdentity};
pub use session::{Claims, SessionCredential, SessionIssuer};

/// Verify one identity assertion, dispatching on its variant.
///
/// This is the single choke point of the trust boundary: every login
/// attempt runs exactly one verification algorithm and leaves either
/// verified (a [`VerifiedIdentity`]) or rejected (an [`AuthError`]).
/// There is no partial success and no internal retry.
pub async fn verify_assertion(
    assertion: IdentityAssertion,
    resolver: &GuestIdentityResolver,
    bot_token: &str,
    max_age_secs: i64,
    now_epoch: i64,
) -> Result<VerifiedIdentity, AuthError> {
    match assertion {
        IdentityAssertion::BotLogin(payload) => {
            hash::verify_bot_hash(&payload, bot_token, max_age_secs, now_epoch)?;
            Ok(VerifiedIdentity::Telegram(TelegramProfile {
                provider_user_id: payload.id,
                first_name: payload.first_name,
                last_name: payload.last_name,
                username: payload.username,
                auth_date: payload.auth_date,
            }))
        }
        IdentityAssertion::WebAppInitData { init_data } => {
            let profile = hash::verify_init_data(&init_data, bot_token, max_age_secs, now_epoch)?;
            Ok(VerifiedIdentity::Telegram(profile))
        }
        IdentityAssertion::Guest { guest_token } => resolver.resolve(guest_token.as_deref()).await,
    }
}
