#![forbid(unsafe_code)]
//! HTTP surface for the chirp social backend.
//!
//! Everything a handler needs hangs off `AppState`; `build_router` wires
//! the full route table so integration tests and `main` serve the exact
//! same application.

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use chirp_store::SocialStore;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tower_http::services::ServeDir;

mod auth;
mod config;
mod http;
mod media;
mod middleware;

pub use auth::{issue_token, AuthUser, Claims};
pub use config::{ApiConfig, DEFAULT_TOKEN_TTL_SECS};

pub const CRATE_NAME: &str = "chirp-server";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SocialStore>,
    pub api: Arc<ApiConfig>,
    pub request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn SocialStore>, api: ApiConfig) -> Self {
        Self {
            store,
            api: Arc::new(api),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

#[must_use]
pub fn build_router(state: AppState) -> Router {
    let max_body = state.api.max_body_bytes;
    Router::new()
        .route("/healthz", get(http::healthz_handler))
        .route("/api/auth/register", post(http::auth_handlers::register_handler))
        .route("/api/auth/login", post(http::auth_handlers::login_handler))
        .route(
            "/api/tweet",
            post(http::tweet_handlers::create_tweet_handler)
                .get(http::tweet_handlers::list_tweets_handler),
        )
        .route(
            "/api/tweet/:id",
            get(http::tweet_handlers::get_tweet_handler)
                .delete(http::tweet_handlers::delete_tweet_handler),
        )
        .route("/api/tweet/:id/like", post(http::tweet_handlers::like_handler))
        .route("/api/tweet/:id/dislike", post(http::tweet_handlers::dislike_handler))
        .route("/api/tweet/:id/retweet", post(http::tweet_handlers::retweet_handler))
        .route("/api/tweet/:id/reply", post(http::tweet_handlers::reply_handler))
        .route(
            "/api/user/:id",
            get(http::user_handlers::get_profile_handler)
                .put(http::user_handlers::update_profile_handler),
        )
        .route("/api/user/:id/tweets", get(http::user_handlers::user_tweets_handler))
        .route("/api/user/:id/follow", post(http::user_handlers::follow_handler))
        .route("/api/user/:id/unfollow", post(http::user_handlers::unfollow_handler))
        .route(
            "/api/user/:id/uploadProfilePic",
            post(http::user_handlers::upload_profile_pic_handler),
        )
        .route(
            "/api/user/:id/profilePic",
            get(http::user_handlers::profile_pic_handler),
        )
        .nest_service("/images", ServeDir::new(state.api.media_root.clone()))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}
