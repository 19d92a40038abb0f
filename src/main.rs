//! playgate - Authentication & media access-key gateway
//!
//! Entry point. Loads yaml config for the selected environment, reads
//! secrets from the environment, wires the identity store (PostgreSQL when
//! configured, in-memory otherwise), and serves the gateway.

use std::sync::Arc;

use anyhow::Context;

use playgate::auth::guest::GuestIdentityResolver;
use playgate::auth::session::SessionIssuer;
use playgate::config::{AppConfig, AuthSecrets};
use playgate::store::{
    Database, IdentityStore, MediaStore, MemoryStore, PgStore, RefreshTokenStore,
};
use playgate::{gateway, logging};

/// Get environment name from command line (--env / -e argument)
fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env);
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }

    let _guard = logging::init_logging(&config);
    tracing::info!(env = %env, git = env!("GIT_HASH"), "starting playgate");

    let secrets = Arc::new(AuthSecrets::from_env()?);

    // DATABASE_URL wins over the yaml setting.
    let postgres_url = std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| config.postgres_url.clone());

    let identity_store: Arc<dyn IdentityStore>;
    let refresh_store: Arc<dyn RefreshTokenStore>;
    let media_store: Arc<dyn MediaStore>;
    let pg_db: Option<Arc<Database>>;

    match postgres_url {
        Some(url) => {
            let db = Arc::new(
                Database::connect(&url)
                    .await
                    .context("PostgreSQL connection failed")?,
            );
            let store = Arc::new(PgStore::new(db.clone()));
            identity_store = store.clone();
            refresh_store = store.clone();
            media_store = store;
            pg_db = Some(db);
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using volatile in-memory identity store");
            let store = Arc::new(MemoryStore::new());
            identity_store = store.clone();
            refresh_store = store.clone();
            media_store = store;
            pg_db = None;
        }
    }

    let session = Arc::new(SessionIssuer::new(
        &secrets.session_secret,
        config.auth.access_ttl_secs,
        config.auth.refresh_ttl_secs,
        refresh_store,
    ));
    let guest_resolver = GuestIdentityResolver::new(identity_store.clone());

    gateway::run_server(
        &config,
        secrets,
        identity_store,
        media_store,
        guest_resolver,
        session,
        pg_db,
    )
    .await
}
