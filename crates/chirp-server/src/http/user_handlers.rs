// SPDX-License-Identifier: MIT

use crate::auth::AuthUser;
use crate::http::{store_to_api, Failure};
use crate::media::{store_image, MediaKind};
use crate::AppState;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chirp_api::{
    ApiError, ApiErrorCode, LoginUserDto, UpdateProfileRequest, UserProfileDto,
};
use chirp_model::UserId;
use serde_json::{json, Value};
use tracing::info;

const UPDATABLE_FIELDS: [&str; 3] = ["fullName", "location", "dateOfBirth"];

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::parse(raw).map_err(|_| ApiError::not_found("User not found"))
}

pub(crate) async fn get_profile_handler(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, Failure> {
    let id = parse_user_id(&id)?;
    let user = state
        .store
        .user(&id)
        .await
        .map_err(|e| store_to_api(e, "Failed to fetch profile. Please try again later."))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(json!({"result": UserProfileDto::from(&user)})).into_response())
}

/// Edits are allow-listed field by field so the rejection can name the
/// offending key, and nothing is applied when any key is rejected.
pub(crate) async fn update_profile_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, Failure> {
    let id = parse_user_id(&id)?;
    if id != user.id {
        return Err(ApiError::forbidden("You can only update your own profile").into());
    }

    let Value::Object(ref fields) = body else {
        return Err(ApiError::validation("Request body must be a JSON object").into());
    };
    for key in fields.keys() {
        if !UPDATABLE_FIELDS.contains(&key.as_str()) {
            return Err(ApiError::new(
                ApiErrorCode::DisallowedField,
                format!("Field '{key}' is not allowed to be updated"),
            )
            .into());
        }
    }

    let request: UpdateProfileRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::validation(format!("Invalid profile update: {e}")))?;
    let patch = request.into_patch();
    if patch.is_empty() {
        return Err(ApiError::validation("At least one field is required to update").into());
    }

    let user = state
        .store
        .update_profile(&id, patch)
        .await
        .map_err(|e| store_to_api(e, "Failed to update profile. Please try again later."))?;
    info!(user_id = %user.id, "profile updated");
    Ok(Json(json!({"result": UserProfileDto::from(&user)})).into_response())
}

/// No existence check on the owner: an unknown id reads as an empty
/// timeline, matching the original endpoint.
pub(crate) async fn user_tweets_handler(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, Failure> {
    let id = parse_user_id(&id)?;
    let tweets = state
        .store
        .tweets_by(&id)
        .await
        .map_err(|e| store_to_api(e, "Failed to fetch tweets. Please try again later."))?;
    let dtos = crate::http::populate_tweets(&state, &tweets)
        .await
        .map_err(|e| store_to_api(e, "Failed to fetch tweets. Please try again later."))?;
    Ok(Json(json!({"tweets": dtos})).into_response())
}

pub(crate) async fn follow_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, Failure> {
    let target = parse_user_id(&id)?;
    if target == user.id {
        return Err(ApiError::validation("You cannot follow yourself").into());
    }
    state
        .store
        .follow(&user.id, &target)
        .await
        .map_err(|e| store_to_api(e, "Failed to follow user. Please try again later."))?;
    info!(follower = %user.id, target = %target, "follow");
    Ok(Json(json!({"success": true})).into_response())
}

pub(crate) async fn unfollow_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, Failure> {
    let target = parse_user_id(&id)?;
    if target == user.id {
        return Err(ApiError::validation("You cannot unfollow yourself").into());
    }
    state
        .store
        .unfollow(&user.id, &target)
        .await
        .map_err(|e| store_to_api(e, "Failed to unfollow user. Please try again later."))?;
    info!(follower = %user.id, target = %target, "unfollow");
    Ok(Json(json!({"success": true})).into_response())
}

/// Replaces the avatar of the user named in the path. The caller only has
/// to be logged in, not be that user — a quirk kept from the original
/// endpoint.
pub(crate) async fn upload_profile_pic_handler(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, Failure> {
    let id = parse_user_id(&id)?;

    let mut stored: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart body"))?
    {
        if field.name() != Some("profilePic") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::validation("Malformed multipart body"))?;
        stored = Some(
            store_image(
                &state.api.media_root,
                MediaKind::ProfilePic,
                &file_name,
                content_type.as_deref(),
                &bytes,
            )
            .await?,
        );
    }
    let relative = stored
        .ok_or_else(|| ApiError::validation("Please upload a valid image file (JPEG/PNG)"))?;

    let url = state.api.image_url(&relative);
    let user = state
        .store
        .set_profile_image(&id, &url)
        .await
        .map_err(|e| store_to_api(e, "Failed to upload profile picture. Please try again later."))?;
    info!(user_id = %user.id, "profile picture updated");
    Ok(Json(json!({
        "result": "Profile picture uploaded successfully",
        "user": LoginUserDto::from(&user),
    }))
    .into_response())
}

/// Bounces the caller to wherever the avatar lives. Registration always
/// assigns a default image, so the empty-field 404 only fires for records
/// whose `profile_img` was cleared out of band.
pub(crate) async fn profile_pic_handler(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, Failure> {
    let id = parse_user_id(&id)?;
    let user = state
        .store
        .user(&id)
        .await
        .map_err(|e| store_to_api(e, "Failed to fetch profile picture."))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    if user.profile_img.is_empty() {
        return Err(ApiError::not_found("User does not have a profile picture").into());
    }
    // Plain 302, the status browsers got from the original endpoint.
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, user.profile_img)],
    )
        .into_response())
}
