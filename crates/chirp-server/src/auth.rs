// SPDX-License-Identifier: MIT

//! Bearer-token gate.
//!
//! `AuthUser` is the only way a handler obtains an identity: either the
//! credential resolves to a live user record or the request is rejected
//! with the single "not logged in" response. Missing, malformed, expired,
//! and dangling-subject tokens are deliberately indistinguishable to the
//! client.

use crate::http::api_error_response;
use crate::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Response;
use chirp_api::ApiError;
use chirp_model::{User, UserId};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(user_id: &UserId, state: &AppState) -> Result<String, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + state.api.token_ttl.as_secs() as i64,
    };
    let key = EncodingKey::from_secret(state.api.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| ApiError::internal(format!("failed to sign token: {e}")))
}

pub struct AuthUser(pub User);

fn rejected() -> Response {
    api_error_response(&ApiError::unauthenticated())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Response> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(rejected)?;

        let key = DecodingKey::from_secret(state.api.jwt_secret.as_bytes());
        let data =
            decode::<Claims>(token, &key, &Validation::default()).map_err(|_| rejected())?;

        let id = UserId::parse(&data.claims.sub).map_err(|_| rejected())?;
        let user = state
            .store
            .user(&id)
            .await
            .map_err(|_| rejected())?
            .ok_or_else(rejected)?;
        Ok(Self(user))
    }
}
