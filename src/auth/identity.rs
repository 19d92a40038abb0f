//! Identity assertion and verified identity types.

use serde::{Deserialize, Serialize};

/// Raw bot-login payload as delivered by the Telegram login widget.
///
/// Field names match the wire format; optional fields that are absent are
/// excluded from the signed check string entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotLoginPayload {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub auth_date: i64,
    pub hash: String,
}

/// An externally supplied claim of identity, pending verification.
///
/// Closed union: exactly the three supported login sources. Each variant
/// carries only what its verification algorithm consumes.
#[derive(Debug, Clone)]
pub enum IdentityAssertion {
    BotLogin(BotLoginPayload),
    WebAppInitData { init_data: String },
    Guest { guest_token: Option<String> },
}

/// Telegram user object embedded in the WebApp `initData` `user` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
}

/// Profile extracted from a successfully verified Telegram assertion.
#[derive(Debug, Clone)]
pub struct TelegramProfile {
    pub provider_user_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub auth_date: i64,
}

/// The trusted result of verifying an [`IdentityAssertion`].
///
/// Produced once per login attempt and never persisted; the owning user row
/// is the identity store's concern.
#[derive(Debug, Clone)]
pub enum VerifiedIdentity {
    Telegram(TelegramProfile),
    Guest {
        /// Internal user id of the guest record.
        user_id: i64,
        guest_token: String,
        is_new_guest: bool,
    },
}
