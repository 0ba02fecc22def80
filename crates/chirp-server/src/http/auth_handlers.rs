// SPDX-License-Identifier: MIT

use crate::auth::issue_token;
use crate::http::{store_to_api, Failure};
use crate::AppState;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chirp_api::{ApiError, LoginRequest, LoginUserDto, RegisterRequest};
use chirp_model::User;
use chrono::Utc;
use serde_json::json;
use tracing::info;

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("failed to hash password: {e}")))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub(crate) async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, Failure> {
    let (Some(full_name), Some(user_name), Some(password), Some(email)) =
        (body.full_name, body.user_name, body.password, body.email)
    else {
        return Err(ApiError::validation("One or more mandatory fields are empty").into());
    };
    if full_name.is_empty() || user_name.is_empty() || password.is_empty() || email.is_empty() {
        return Err(ApiError::validation("One or more mandatory fields are empty").into());
    }

    let password_hash = hash_password(&password)?;
    let user = User::register(full_name, &user_name, &email, password_hash, Utc::now())
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let user = state
        .store
        .create_user(user)
        .await
        .map_err(|e| store_to_api(e, "Failed to register user. Please try again later."))?;
    info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({"result": "User Signed up Successfully!"})),
    )
        .into_response())
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, Failure> {
    let (Some(login), Some(password)) = (body.email_or_user_name, body.password) else {
        return Err(ApiError::validation("One or more mandatory fields are empty").into());
    };
    if login.is_empty() || password.is_empty() {
        return Err(ApiError::validation("One or more mandatory fields are empty").into());
    }

    let user = state
        .store
        .user_by_login(&login)
        .await
        .map_err(|e| store_to_api(e, "Failed to authenticate. Please try again later."))?;

    // Unknown account and wrong password collapse to the same response.
    let Some(user) = user else {
        return Err(ApiError::new(chirp_api::ApiErrorCode::Unauthenticated, "Invalid Credentials").into());
    };
    if !verify_password(&password, &user.password_hash) {
        return Err(ApiError::new(chirp_api::ApiErrorCode::Unauthenticated, "Invalid Credentials").into());
    }

    let token = issue_token(&user.id, &state)?;
    info!(user_id = %user.id, "login");
    Ok(Json(json!({
        "result": {
            "token": token,
            "user": LoginUserDto::from(&user),
        }
    }))
    .into_response())
}
