// SPDX-License-Identifier: MIT

pub(crate) mod auth_handlers;
pub(crate) mod tweet_handlers;
pub(crate) mod user_handlers;

use crate::AppState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chirp_api::{map_error, ApiError, PublicProfileDto, TweetDto};
use chirp_model::{Tweet, UserId};
use chirp_store::{StoreError, StoreErrorCode};
use serde_json::json;
use std::collections::HashMap;

/// Wire shape for every failure: `{"error": message}` with the status
/// derived from the error code.
pub(crate) fn api_error_response(err: &ApiError) -> Response {
    let status =
        StatusCode::from_u16(map_error(err)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": err.message}))).into_response()
}

/// Handler-boundary rejection; handlers bubble it with `?`.
pub(crate) struct Failure(pub ApiError);

impl From<ApiError> for Failure {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        api_error_response(&self.0)
    }
}

/// Converts a store failure, keeping its message for the client-visible
/// taxonomy codes and substituting the route's one-liner for anything
/// internal.
pub(crate) fn store_to_api(err: StoreError, internal_message: &str) -> ApiError {
    match err.code {
        StoreErrorCode::NotFound => ApiError::not_found(err.message),
        StoreErrorCode::Conflict => ApiError::conflict(err.message),
        StoreErrorCode::Validation => ApiError::validation(err.message),
        StoreErrorCode::Serialization | StoreErrorCode::Storage => {
            tracing::error!(error = %err, "store failure");
            ApiError::internal(internal_message)
        }
    }
}

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Resolves a tweet's owner to the public projection and renders the
/// media URL. A dangling owner reference is a storage-level fault.
pub(crate) async fn populate_tweet(
    state: &AppState,
    tweet: &Tweet,
) -> Result<TweetDto, StoreError> {
    let owner = state.store.user(&tweet.tweeted_by).await?.ok_or_else(|| {
        StoreError::new(StoreErrorCode::Storage, "tweet owner record missing")
    })?;
    let image_url = tweet.image.as_deref().map(|rel| state.api.image_url(rel));
    Ok(TweetDto::populated(
        tweet,
        PublicProfileDto::from(&owner),
        image_url,
    ))
}

/// Populates a listing, fetching each distinct owner once.
pub(crate) async fn populate_tweets(
    state: &AppState,
    tweets: &[Tweet],
) -> Result<Vec<TweetDto>, StoreError> {
    let mut owners: HashMap<UserId, PublicProfileDto> = HashMap::new();
    let mut out = Vec::with_capacity(tweets.len());
    for tweet in tweets {
        if !owners.contains_key(&tweet.tweeted_by) {
            let owner = state.store.user(&tweet.tweeted_by).await?.ok_or_else(|| {
                StoreError::new(StoreErrorCode::Storage, "tweet owner record missing")
            })?;
            owners.insert(tweet.tweeted_by.clone(), PublicProfileDto::from(&owner));
        }
        let owner = owners[&tweet.tweeted_by].clone();
        let image_url = tweet.image.as_deref().map(|rel| state.api.image_url(rel));
        out.push(TweetDto::populated(tweet, owner, image_url));
    }
    Ok(out)
}
