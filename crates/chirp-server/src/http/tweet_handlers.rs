// SPDX-License-Identifier: MIT

use crate::auth::AuthUser;
use crate::http::{populate_tweet, populate_tweets, store_to_api, Failure};
use crate::media::{store_image, MediaKind};
use crate::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chirp_api::{ApiError, ReplyRequest};
use chirp_model::{Tweet, TweetId};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

fn parse_tweet_id(raw: &str) -> Result<TweetId, ApiError> {
    TweetId::parse(raw).map_err(|_| ApiError::not_found("Tweet not found"))
}

/// Create is multipart: a required `content` part, an optional `image`
/// file, and nothing else — an unknown part fails the whole request.
pub(crate) async fn create_tweet_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<Response, Failure> {
    let mut content: Option<String> = None;
    let mut image: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart body"))?
    {
        match field.name().unwrap_or_default() {
            "content" => {
                content = Some(
                    field
                        .text()
                        .await
                        .map_err(|_| ApiError::validation("Malformed multipart body"))?,
                );
            }
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::validation("Malformed multipart body"))?;
                let relative = store_image(
                    &state.api.media_root,
                    MediaKind::TweetImage,
                    &file_name,
                    content_type.as_deref(),
                    &bytes,
                )
                .await?;
                image = Some(relative);
            }
            other => {
                return Err(ApiError::disallowed_field(other).into());
            }
        }
    }

    let content = content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::validation("Content is required for a tweet"))?;

    let tweet = Tweet::original(&content, user.id.clone(), image, Utc::now())
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let tweet = state
        .store
        .create_tweet(tweet)
        .await
        .map_err(|e| store_to_api(e, "Failed to create tweet. Please try again later."))?;
    info!(tweet_id = %tweet.id, user_id = %user.id, "tweet created");

    let dto = populate_tweet(&state, &tweet)
        .await
        .map_err(|e| store_to_api(e, "Failed to create tweet. Please try again later."))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Tweet created successfully", "tweet": dto})),
    )
        .into_response())
}

pub(crate) async fn get_tweet_handler(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, Failure> {
    let id = parse_tweet_id(&id)?;
    let tweet = state
        .store
        .tweet(&id)
        .await
        .map_err(|e| store_to_api(e, "Failed to fetch tweet. Please try again later."))?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;
    let dto = populate_tweet(&state, &tweet)
        .await
        .map_err(|e| store_to_api(e, "Failed to fetch tweet. Please try again later."))?;
    Ok(Json(json!({"tweet": dto})).into_response())
}

pub(crate) async fn list_tweets_handler(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Response, Failure> {
    let tweets = state
        .store
        .list_tweets()
        .await
        .map_err(|e| store_to_api(e, "Failed to fetch tweets. Please try again later."))?;
    let dtos = populate_tweets(&state, &tweets)
        .await
        .map_err(|e| store_to_api(e, "Failed to fetch tweets. Please try again later."))?;
    Ok(Json(json!({"tweets": dtos})).into_response())
}

pub(crate) async fn like_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, Failure> {
    let id = parse_tweet_id(&id)?;
    let tweet = state
        .store
        .like(&id, &user.id)
        .await
        .map_err(|e| store_to_api(e, "Failed to like tweet. Please try again later."))?;
    let dto = populate_tweet(&state, &tweet)
        .await
        .map_err(|e| store_to_api(e, "Failed to like tweet. Please try again later."))?;
    Ok(Json(json!({"message": "Tweet liked successfully", "tweet": dto})).into_response())
}

pub(crate) async fn dislike_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, Failure> {
    let id = parse_tweet_id(&id)?;
    let tweet = state
        .store
        .unlike(&id, &user.id)
        .await
        .map_err(|e| store_to_api(e, "Failed to dislike tweet. Please try again later."))?;
    let dto = populate_tweet(&state, &tweet)
        .await
        .map_err(|e| store_to_api(e, "Failed to dislike tweet. Please try again later."))?;
    Ok(Json(json!({"message": "Tweet disliked successfully", "tweet": dto})).into_response())
}

pub(crate) async fn retweet_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, Failure> {
    let id = parse_tweet_id(&id)?;
    let tweet = state
        .store
        .retweet(&id, &user.id)
        .await
        .map_err(|e| store_to_api(e, "Failed to retweet tweet. Please try again later."))?;
    let dto = populate_tweet(&state, &tweet)
        .await
        .map_err(|e| store_to_api(e, "Failed to retweet tweet. Please try again later."))?;
    Ok(Json(json!({"message": "Tweet retweeted successfully", "tweet": dto})).into_response())
}

pub(crate) async fn reply_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ReplyRequest>,
) -> Result<Response, Failure> {
    let parent_id = parse_tweet_id(&id)?;
    let content = body
        .content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::validation("Content is required for a reply"))?;

    let reply = Tweet::reply(&content, user.id.clone(), Utc::now())
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let (reply, parent) = state
        .store
        .create_reply(&parent_id, reply)
        .await
        .map_err(|e| store_to_api(e, "Failed to create reply. Please try again later."))?;
    info!(reply_id = %reply.id, parent_id = %parent.id, "reply created");

    let dto = populate_tweet(&state, &parent)
        .await
        .map_err(|e| store_to_api(e, "Failed to create reply. Please try again later."))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Reply created successfully", "tweet": dto})),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteParams {
    #[serde(rename = "replyId")]
    reply_id: Option<String>,
}

/// Two addressing modes: bare id deletes a top-level tweet, `?replyId=`
/// deletes one reply out of that parent. Both are owner-only; neither
/// cascades.
pub(crate) async fn delete_tweet_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<Response, Failure> {
    let internal = "Failed to delete tweet or reply.";
    let tweet_id = parse_tweet_id(&id)?;

    if let Some(raw_reply_id) = params.reply_id {
        let reply_id =
            TweetId::parse(&raw_reply_id).map_err(|_| ApiError::not_found("Reply not found"))?;
        let parent = state
            .store
            .tweet(&tweet_id)
            .await
            .map_err(|e| store_to_api(e, internal))?
            .ok_or_else(|| ApiError::not_found("Parent tweet not found"))?;
        if !parent.replies.contains(&reply_id) {
            return Err(ApiError::not_found("Reply not found").into());
        }
        let reply = state
            .store
            .tweet(&reply_id)
            .await
            .map_err(|e| store_to_api(e, internal))?
            .ok_or_else(|| ApiError::not_found("Reply not found"))?;
        if reply.tweeted_by != user.id {
            return Err(ApiError::forbidden("Unauthorized action").into());
        }

        let parent = state
            .store
            .remove_reply(&tweet_id, &reply_id)
            .await
            .map_err(|e| store_to_api(e, internal))?;
        info!(reply_id = %reply_id, parent_id = %parent.id, "reply deleted");
        let dto = populate_tweet(&state, &parent)
            .await
            .map_err(|e| store_to_api(e, internal))?;
        return Ok(
            Json(json!({"message": "Reply deleted successfully.", "parentTweet": dto}))
                .into_response(),
        );
    }

    let tweet = state
        .store
        .tweet(&tweet_id)
        .await
        .map_err(|e| store_to_api(e, internal))?
        .ok_or_else(|| ApiError::not_found("Tweet not found"))?;
    if tweet.tweeted_by != user.id {
        return Err(ApiError::forbidden("Unauthorized action").into());
    }
    state
        .store
        .delete_tweet(&tweet_id)
        .await
        .map_err(|e| store_to_api(e, internal))?;
    info!(tweet_id = %tweet_id, "tweet deleted");
    Ok(Json(json!({"message": "Tweet deleted successfully."})).into_response())
}
