//! playgate - Authentication & media access-key gateway
//!
//! Converts three identity assertions (Telegram bot-login payload, Telegram
//! WebApp `initData`, anonymous guest device) into a uniform session
//! credential, and derives the opaque access keys that gate playback of
//! individual media variants.
//!
//! # Modules
//!
//! - [`auth`] - identity verification, guest resolution, session issuance
//! - [`access_key`] - deterministic access-key derivation and validation
//! - [`store`] - identity/refresh-token/media persistence (PostgreSQL or in-memory)
//! - [`gateway`] - axum HTTP boundary
//! - [`config`] - yaml app config + environment secrets
//! - [`logging`] - tracing subscriber setup

pub mod access_key;
pub mod auth;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod store;

// Convenient re-exports at crate root
pub use access_key::{ACCESS_KEY_LEN, AccessKey, MediaResourceDescriptor};
pub use auth::error::AuthError;
pub use auth::guest::GuestIdentityResolver;
pub use auth::identity::{
    BotLoginPayload, IdentityAssertion, TelegramProfile, TelegramUser, VerifiedIdentity,
};
pub use auth::session::{Claims, SessionCredential, SessionIssuer};
pub use config::{AppConfig, AuthConfig, AuthSecrets};
pub use store::{Database, GuestRecord, IdentityStore, MediaStore, RefreshTokenStore};
