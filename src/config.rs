use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// PostgreSQL connection URL for the identity store.
    /// `DATABASE_URL` takes precedence when set.
    #[serde(default)]
    pub postgres_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Token lifetimes and the Telegram `auth_date` freshness window.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: u64,
    /// Refresh token lifetime in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: u64,
    /// Maximum accepted age of a signed `auth_date`, in seconds.
    #[serde(default = "default_auth_max_age")]
    pub auth_max_age_secs: i64,
}

fn default_access_ttl() -> u64 {
    3600
}

fn default_refresh_ttl() -> u64 {
    7 * 24 * 60 * 60
}

fn default_auth_max_age() -> i64 {
    7 * 24 * 60 * 60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: default_access_ttl(),
            refresh_ttl_secs: default_refresh_ttl(),
            auth_max_age_secs: default_auth_max_age(),
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

/// Process-wide secrets, read from the environment once at startup and passed
/// explicitly into the components that need them.
///
/// Deliberately not `Serialize`, and `Debug` redacts every field: these values
/// must never reach a log line or a response body.
#[derive(Clone)]
pub struct AuthSecrets {
    /// Telegram bot token; keying material for both verification schemes.
    pub bot_token: String,
    /// HS256 signing secret for access tokens.
    pub session_secret: String,
    /// HMAC secret for access-key derivation.
    pub access_key_secret: String,
}

impl AuthSecrets {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN is not set")?,
            session_secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            access_key_secret: std::env::var("ACCESS_KEY_SECRET")
                .context("ACCESS_KEY_SECRET is not set")?,
        })
    }
}

impl fmt::Debug for AuthSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSecrets")
            .field("bot_token", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_defaults() {
        let auth = AuthConfig::default();
        assert_eq!(auth.access_ttl_secs, 3600);
        assert_eq!(auth.refresh_ttl_secs, 604_800);
        assert_eq!(auth.auth_max_age_secs, 604_800);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let secrets = AuthSecrets {
            bot_token: "1234:very-secret".to_string(),
            session_secret: "jwt-secret".to_string(),
            access_key_secret: "ak-secret".to_string(),
        };
        let printed = format!("{:?}", secrets);
        assert!(!printed.contains("very-secret"));
        assert!(!printed.contains("jwt-secret"));
        assert!(!printed.contains("ak-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = r#"
log_level: "info"
log_dir: "./logs"
log_file: "playgate.log"
use_json: false
rotation: "daily"
gateway:
  host: "127.0.0.1"
  port: 8080
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.auth.access_ttl_secs, 3600);
        assert!(config.postgres_url.is_none());
    }
}
