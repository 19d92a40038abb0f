//! Telegram HMAC-SHA256 signature verification.
//!
//! Two independent schemes, both HMAC-SHA256 over a sorted
//! `key=value\n...` check string, distinguished by keying material:
//!
//! - **Bot login**: key is the raw `SHA256(bot_token)` digest.
//! - **WebApp initData**: key is `HMAC-SHA256("WebAppData", bot_token)`.
//!
//! Swapping the derivations produces a different signature, so the schemes
//! cannot be confused for one another. Missing required fields are rejected
//! before any HMAC work, and all hash comparisons are constant-time.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::error::AuthError;
use super::identity::{BotLoginPayload, TelegramProfile, TelegramUser};

type HmacSha256 = Hmac<Sha256>;

/// Upper bound on any single signed field value, in bytes.
pub const MAX_FIELD_LEN: usize = 1024;

/// Upper bound on a raw `initData` string, in bytes.
pub const MAX_INIT_DATA_LEN: usize = 8192;

/// Constant-time byte comparison. Does not early-exit on the first
/// differing byte.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Check string for the bot-login scheme: present fields only, sorted by
/// field name (`auth_date`, `first_name`, `id`, `last_name`, `username`),
/// joined as `name=value` lines.
fn bot_check_string(payload: &BotLoginPayload) -> String {
    let mut check = format!(
        "auth_date={}\nfirst_name={}\nid={}",
        payload.auth_date, payload.first_name, payload.id
    );
    if let Some(last_name) = &payload.last_name {
        check.push_str("\nlast_name=");
        check.push_str(last_name);
    }
    if let Some(username) = &payload.username {
        check.push_str("\nusername=");
        check.push_str(username);
    }
    check
}

/// Compute the bot-login signature for a payload: hex-encoded
/// `HMAC-SHA256(SHA256(bot_token), check_string)`.
pub fn compute_bot_hash(payload: &BotLoginPayload, bot_token: &str) -> String {
    let check = bot_check_string(payload);
    let key = Sha256::digest(bot_token.as_bytes());
    hex::encode(hmac_sha256(&key, check.as_bytes()))
}

/// Verify a bot-login payload against the bot token.
///
/// # Errors
///
/// - [`AuthError::MalformedPayload`] for missing/oversized fields, before any
///   HMAC computation
/// - [`AuthError::InvalidSignature`] on hash mismatch
/// - [`AuthError::Expired`] when `auth_date` is older than `max_age_secs`
pub fn verify_bot_hash(
    payload: &BotLoginPayload,
    bot_token: &str,
    max_age_secs: i64,
    now_epoch: i64,
) -> Result<(), AuthError> {
    if payload.hash.is_empty() {
        return Err(AuthError::MalformedPayload("hash is required"));
    }
    if payload.first_name.is_empty() {
        return Err(AuthError::MalformedPayload("first_name is required"));
    }
    let field_lens = [
        Some(payload.first_name.len()),
        payload.last_name.as_ref().map(String::len),
        payload.username.as_ref().map(String::len),
        Some(payload.hash.len()),
    ];
    if field_lens.into_iter().flatten().any(|len| len > MAX_FIELD_LEN) {
        return Err(AuthError::MalformedPayload("field exceeds length bound"));
    }

    let calculated = compute_bot_hash(payload, bot_token);
    if !constant_time_eq(calculated.as_bytes(), payload.hash.as_bytes()) {
        return Err(AuthError::InvalidSignature);
    }

    if now_epoch - payload.auth_date > max_age_secs {
        return Err(AuthError::Expired);
    }

    Ok(())
}

/// Verify a WebApp `initData` string and extract the embedded user profile.
///
/// The string is parsed as percent-encoded key/value pairs; decoded values
/// (including the JSON-encoded `user` object) go into the check string as-is.
///
/// # Errors
///
/// - [`AuthError::MalformedPayload`] for missing `hash`/`auth_date`/`user`,
///   oversized input, or an unparsable `user` object
/// - [`AuthError::InvalidSignature`] on hash mismatch
/// - [`AuthError::Expired`] when `auth_date` is older than `max_age_secs`
pub fn verify_init_data(
    raw: &str,
    bot_token: &str,
    max_age_secs: i64,
    now_epoch: i64,
) -> Result<TelegramProfile, AuthError> {
    if raw.is_empty() {
        return Err(AuthError::MalformedPayload("initData is required"));
    }
    if raw.len() > MAX_INIT_DATA_LEN {
        return Err(AuthError::MalformedPayload("initData exceeds length bound"));
    }

    let mut supplied_hash: Option<String> = None;
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        if key == "hash" {
            supplied_hash = Some(value.into_owned());
        } else {
            pairs.push((key.into_owned(), value.into_owned()));
        }
    }

    let supplied_hash = supplied_hash.ok_or(AuthError::MalformedPayload("hash is required"))?;
    let auth_date: i64 = pairs
        .iter()
        .find(|(key, _)| key == "auth_date")
        .map(|(_, value)| value.as_str())
        .ok_or(AuthError::MalformedPayload("auth_date is required"))?
        .parse()
        .map_err(|_| AuthError::MalformedPayload("auth_date must be an integer"))?;
    let user_json = pairs
        .iter()
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value.clone())
        .ok_or(AuthError::MalformedPayload("user is required"))?;

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let check = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("\n");

    // Two-step derivation; this is what separates the WebApp scheme from the
    // bot-login scheme.
    let inner_key = hmac_sha256(b"WebAppData", bot_token.as_bytes());
    let calculated = hex::encode(hmac_sha256(&inner_key, check.as_bytes()));
    if !constant_time_eq(calculated.as_bytes(), supplied_hash.as_bytes()) {
        return Err(AuthError::InvalidSignature);
    }

    if now_epoch - auth_date > max_age_secs {
        return Err(AuthError::Expired);
    }

    let user: TelegramUser = serde_json::from_str(&user_json)
        .map_err(|_| AuthError::MalformedPayload("user must be a valid JSON object"))?;

    Ok(TelegramProfile {
        provider_user_id: user.id,
        first_name: user.first_name.unwrap_or_default(),
        last_name: user.last_name,
        username: user.username,
        auth_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT_TOKEN: &str = "7901458295:AAFoXrGmxK5xGVZCE8J_Hx4TJfNtHGDVbqk";

    // Reference signature produced by Node's `crypto` module over the same
    // payload and token (sha256 key derivation, sorted check string).
    const BOT_REFERENCE_HASH: &str =
        "97e1924a25da995c2457c3e36b00a071038f8745ba5893576ba8fa058a48aa9e";

    const BOT_AUTH_DATE: i64 = 1754642628;

    fn bot_payload() -> BotLoginPayload {
        BotLoginPayload {
            id: 6702079700,
            first_name: "随风".to_string(),
            last_name: None,
            username: Some("seo99991".to_string()),
            auth_date: BOT_AUTH_DATE,
            hash: BOT_REFERENCE_HASH.to_string(),
        }
    }

    const WEEK_SECS: i64 = 7 * 24 * 60 * 60;

    #[test]
    fn test_bot_check_string_sorted_and_skips_absent_fields() {
        let payload = bot_payload();
        assert_eq!(
            bot_check_string(&payload),
            "auth_date=1754642628\nfirst_name=随风\nid=6702079700\nusername=seo99991"
        );

        let mut with_last_name = payload;
        with_last_name.last_name = Some("李".to_string());
        assert_eq!(
            bot_check_string(&with_last_name),
            "auth_date=1754642628\nfirst_name=随风\nid=6702079700\nlast_name=李\nusername=seo99991"
        );
    }

    #[test]
    fn test_bot_hash_matches_node_crypto_reference() {
        assert_eq!(compute_bot_hash(&bot_payload(), BOT_TOKEN), BOT_REFERENCE_HASH);
    }

    #[test]
    fn test_bot_verify_accepts_valid_payload() {
        let result = verify_bot_hash(&bot_payload(), BOT_TOKEN, WEEK_SECS, BOT_AUTH_DATE + 60);
        assert!(result.is_ok());
    }

    #[test]
    fn test_bot_verify_rejects_any_mutated_field() {
        let now = BOT_AUTH_DATE + 60;

        let mut mutated = bot_payload();
        mutated.id += 1;
        assert!(matches!(
            verify_bot_hash(&mutated, BOT_TOKEN, WEEK_SECS, now),
            Err(AuthError::InvalidSignature)
        ));

        let mut mutated = bot_payload();
        mutated.first_name = "随凤".to_string();
        assert!(matches!(
            verify_bot_hash(&mutated, BOT_TOKEN, WEEK_SECS, now),
            Err(AuthError::InvalidSignature)
        ));

        let mut mutated = bot_payload();
        mutated.username = Some("seo99992".to_string());
        assert!(matches!(
            verify_bot_hash(&mutated, BOT_TOKEN, WEEK_SECS, now),
            Err(AuthError::InvalidSignature)
        ));

        let mut mutated = bot_payload();
        mutated.auth_date += 1;
        assert!(matches!(
            verify_bot_hash(&mutated, BOT_TOKEN, WEEK_SECS, now),
            Err(AuthError::InvalidSignature)
        ));

        // Adding a previously absent optional field changes the check string.
        let mut mutated = bot_payload();
        mutated.last_name = Some("李".to_string());
        assert!(matches!(
            verify_bot_hash(&mutated, BOT_TOKEN, WEEK_SECS, now),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_bot_verify_rejects_wrong_token() {
        let result = verify_bot_hash(
            &bot_payload(),
            "8303051100:AAETrfsTOPHgjlDv1v06jdRTpzjE-cnX7-w",
            WEEK_SECS,
            BOT_AUTH_DATE + 60,
        );
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn test_bot_verify_rejects_stale_auth_date() {
        let result = verify_bot_hash(
            &bot_payload(),
            BOT_TOKEN,
            WEEK_SECS,
            BOT_AUTH_DATE + WEEK_SECS + 1,
        );
        assert!(matches!(result, Err(AuthError::Expired)));
    }

    #[test]
    fn test_bot_verify_requires_fields_before_crypto() {
        let mut missing_hash = bot_payload();
        missing_hash.hash = String::new();
        assert!(matches!(
            verify_bot_hash(&missing_hash, BOT_TOKEN, WEEK_SECS, BOT_AUTH_DATE),
            Err(AuthError::MalformedPayload(_))
        ));

        let mut missing_name = bot_payload();
        missing_name.first_name = String::new();
        assert!(matches!(
            verify_bot_hash(&missing_name, BOT_TOKEN, WEEK_SECS, BOT_AUTH_DATE),
            Err(AuthError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_bot_field_length_is_bounded() {
        let mut oversized = bot_payload();
        oversized.username = Some("x".repeat(MAX_FIELD_LEN + 1));
        assert!(matches!(
            verify_bot_hash(&oversized, BOT_TOKEN, WEEK_SECS, BOT_AUTH_DATE),
            Err(AuthError::MalformedPayload(_))
        ));
    }

    // Full initData string signed with the two-step WebAppData derivation;
    // signature cross-checked against Python's hmac/hashlib.
    const INIT_DATA: &str = "query_id=AAHdF6IQAAAAAN0XohDhrOrc&user=%7B%22id%22%3A279058397%2C%22first_name%22%3A%22Vladislav%22%2C%22last_name%22%3A%22Kibenko%22%2C%22username%22%3A%22vdkfrost%22%2C%22language_code%22%3A%22ru%22%2C%22is_premium%22%3Atrue%7D&auth_date=1754642628&hash=d9316cc6042da87176388c70eeaa29e3bcd37f90be0b0ede03c07fcdeb2412cd";

    // Signature over the identical check string using the bot-login key
    // derivation (`SHA256(bot_token)` directly). Must NOT verify.
    const INIT_DATA_BOT_SCHEME_HASH: &str =
        "a25c5f4a025e90aeedb0b7de895ef35810903d4bde3f72f3dd41223d5a3f2fef";

    const INIT_AUTH_DATE: i64 = 1754642628;

    #[test]
    fn test_webapp_hash_matches_python_reference() {
        let profile =
            verify_init_data(INIT_DATA, BOT_TOKEN, WEEK_SECS, INIT_AUTH_DATE + 60).unwrap();
        assert_eq!(profile.provider_user_id, 279058397);
        assert_eq!(profile.first_name, "Vladislav");
        assert_eq!(profile.last_name.as_deref(), Some("Kibenko"));
        assert_eq!(profile.username.as_deref(), Some("vdkfrost"));
        assert_eq!(profile.auth_date, INIT_AUTH_DATE);
    }

    #[test]
    fn test_webapp_rejects_bot_scheme_derivation() {
        // Same payload, but the hash was produced with the bot-login key
        // derivation: the schemes must not be interchangeable.
        let swapped = INIT_DATA.replace(
            "d9316cc6042da87176388c70eeaa29e3bcd37f90be0b0ede03c07fcdeb2412cd",
            INIT_DATA_BOT_SCHEME_HASH,
        );
        assert!(matches!(
            verify_init_data(&swapped, BOT_TOKEN, WEEK_SECS, INIT_AUTH_DATE + 60),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_bot_scheme_rejects_webapp_derivation() {
        // The reverse direction: the two key derivations disagree on every
        // check string, so a WebApp-derived signature never verifies as a
        // bot-login signature.
        let payload = bot_payload();
        let check = bot_check_string(&payload);
        let inner_key = hmac_sha256(b"WebAppData", BOT_TOKEN.as_bytes());
        let webapp_style = hex::encode(hmac_sha256(&inner_key, check.as_bytes()));
        assert_ne!(webapp_style, compute_bot_hash(&payload, BOT_TOKEN));

        let mut swapped = payload;
        swapped.hash = webapp_style;
        assert!(matches!(
            verify_bot_hash(&swapped, BOT_TOKEN, WEEK_SECS, BOT_AUTH_DATE + 60),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_webapp_rejects_tampered_user_field() {
        let tampered = INIT_DATA.replace("Vladislav", "Vladislaw");
        assert!(matches!(
            verify_init_data(&tampered, BOT_TOKEN, WEEK_SECS, INIT_AUTH_DATE + 60),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_webapp_requires_fields_before_crypto() {
        assert!(matches!(
            verify_init_data("", BOT_TOKEN, WEEK_SECS, INIT_AUTH_DATE),
            Err(AuthError::MalformedPayload(_))
        ));
        assert!(matches!(
            verify_init_data("user=%7B%7D&auth_date=1", BOT_TOKEN, WEEK_SECS, INIT_AUTH_DATE),
            Err(AuthError::MalformedPayload(_))
        ));
        assert!(matches!(
            verify_init_data("hash=ff&auth_date=1", BOT_TOKEN, WEEK_SECS, INIT_AUTH_DATE),
            Err(AuthError::MalformedPayload(_))
        ));
        assert!(matches!(
            verify_init_data("hash=ff&user=%7B%7D", BOT_TOKEN, WEEK_SECS, INIT_AUTH_DATE),
            Err(AuthError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_webapp_rejects_oversized_input() {
        let oversized = format!("user={}&auth_date=1&hash=ff", "x".repeat(MAX_INIT_DATA_LEN));
        assert!(matches!(
            verify_init_data(&oversized, BOT_TOKEN, WEEK_SECS, INIT_AUTH_DATE),
            Err(AuthError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_webapp_rejects_stale_auth_date() {
        let result = verify_init_data(
            INIT_DATA,
            BOT_TOKEN,
            WEEK_SECS,
            INIT_AUTH_DATE + WEEK_SECS + 1,
        );
        assert!(matches!(result, Err(AuthError::Expired)));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
