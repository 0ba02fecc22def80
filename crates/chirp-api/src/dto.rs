// SPDX-License-Identifier: MIT

//! Wire DTOs. Field names pin the original contract: camelCase throughout,
//! `_id` on login/tweet payloads but `id` on the profile endpoint (a shape
//! asymmetry clients already depend on).

use chirp_model::{ProfilePatch, Tweet, User};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "emailOruserName", default)]
    pub email_or_user_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyRequest {
    #[serde(default)]
    pub content: Option<String>,
}

/// Profile edit body. Unknown fields fail deserialization, which the
/// handler converts into the whole-request DisallowedField rejection — no
/// partial apply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub location: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl UpdateProfileRequest {
    #[must_use]
    pub fn into_patch(self) -> ProfilePatch {
        ProfilePatch {
            full_name: self.full_name,
            location: self.location,
            date_of_birth: self.date_of_birth,
        }
    }
}

/// The populated-owner projection attached to tweets: public fields only,
/// never the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub user_name: String,
    pub profile_img: String,
}

impl From<&User> for PublicProfileDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            full_name: user.full_name.clone(),
            user_name: user.user_name.clone(),
            profile_img: user.profile_img.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub tweeted_by: PublicProfileDto,
    pub likes: Vec<String>,
    pub retweet_by: Vec<String>,
    /// Absolute media URL, or null when the tweet has no image.
    pub image: Option<String>,
    pub replies: Vec<String>,
    pub is_reply: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TweetDto {
    /// `image_url` is the already-resolved absolute URL; the record itself
    /// only stores the media-root-relative path.
    #[must_use]
    pub fn populated(tweet: &Tweet, owner: PublicProfileDto, image_url: Option<String>) -> Self {
        Self {
            id: tweet.id.to_string(),
            content: tweet.content.clone(),
            tweeted_by: owner,
            likes: tweet.likes.iter().map(ToString::to_string).collect(),
            retweet_by: tweet.retweet_by.iter().map(ToString::to_string).collect(),
            image: image_url,
            replies: tweet.replies.iter().map(ToString::to_string).collect(),
            is_reply: tweet.is_reply,
            created_at: tweet.created_at,
            updated_at: tweet.updated_at,
        }
    }
}

/// The `user` half of the login payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub date_of_birth: Option<NaiveDate>,
    pub location: String,
    pub profile_img: String,
    pub followers: Vec<String>,
    pub following: Vec<String>,
}

impl From<&User> for LoginUserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            user_name: user.user_name.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            date_of_birth: user.date_of_birth,
            location: user.location.clone(),
            profile_img: user.profile_img.clone(),
            followers: user.followers.iter().map(ToString::to_string).collect(),
            following: user.following.iter().map(ToString::to_string).collect(),
        }
    }
}

/// The profile-read projection. Same fields as the login payload but keyed
/// `id`, matching the original endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDto {
    pub id: String,
    pub full_name: String,
    pub user_name: String,
    pub email: String,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub date_of_birth: Option<NaiveDate>,
    pub location: String,
    pub profile_img: String,
}

impl From<&User> for UserProfileDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            full_name: user.full_name.clone(),
            user_name: user.user_name.clone(),
            email: user.email.clone(),
            followers: user.followers.iter().map(ToString::to_string).collect(),
            following: user.following.iter().map(ToString::to_string).collect(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            date_of_birth: user.date_of_birth,
            location: user.location.clone(),
            profile_img: user.profile_img.clone(),
        }
    }
}
