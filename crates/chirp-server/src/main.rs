#![forbid(unsafe_code)]

use chirp_server::{build_router, ApiConfig, AppState, DEFAULT_TOKEN_TTL_SECS};
use chirp_store::{MemoryStore, RedbStore, SocialStore};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn config_from_env() -> ApiConfig {
    let defaults = ApiConfig::default();
    ApiConfig {
        jwt_secret: env_string("CHIRP_JWT_SECRET", &defaults.jwt_secret),
        token_ttl: Duration::from_secs(env_u64(
            "CHIRP_TOKEN_TTL_SECS",
            DEFAULT_TOKEN_TTL_SECS,
        )),
        media_root: PathBuf::from(env_string(
            "CHIRP_MEDIA_ROOT",
            &defaults.media_root.display().to_string(),
        )),
        public_base_url: env_string("CHIRP_PUBLIC_BASE_URL", &defaults.public_base_url),
        max_body_bytes: env_usize("CHIRP_MAX_BODY_BYTES", defaults.max_body_bytes),
    }
}

fn open_store() -> Result<Arc<dyn SocialStore>, String> {
    match env_string("CHIRP_STORE", "redb").as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "redb" => {
            let path = PathBuf::from(env_string("CHIRP_DB_PATH", "chirp.redb"));
            let store = RedbStore::open(&path)
                .map_err(|e| format!("failed to open database at {}: {e}", path.display()))?;
            Ok(Arc::new(store))
        }
        other => Err(format!("unknown CHIRP_STORE backend: {other}")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let api = config_from_env();
    let store = open_store()?;
    let bind = env_string("CHIRP_BIND", "0.0.0.0:5000");

    info!(backend = store.backend_tag(), bind = %bind, "starting chirpd");
    let state = AppState::new(store, api);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
