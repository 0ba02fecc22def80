// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use chirp_model::{ProfilePatch, Tweet, TweetId, User, UserId};
use std::fmt::{Display, Formatter};

/// Closed taxonomy: the server maps each code to an HTTP-facing error, so
/// consumers match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    NotFound,
    Conflict,
    Validation,
    Serialization,
    Storage,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Validation => "validation_error",
            Self::Serialization => "serialization_error",
            Self::Storage => "storage_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::NotFound, message)
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Conflict, message)
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}

/// Persistence contract for the social graph and the tweet collection.
///
/// Operations are domain-level rather than raw document get/put so every
/// backend can run each multi-document mutation (follow/unfollow, reply
/// create-then-append, reply delete) as a single transactional unit. The
/// conflict checks for toggle-like mutations live behind the same boundary
/// for the same reason: check and write are one atomic step.
#[async_trait]
pub trait SocialStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Persists a new user. Fails with a conflict naming the offending
    /// field when the email or userName is already taken.
    async fn create_user(&self, user: User) -> Result<User, StoreError>;

    async fn user(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    /// Exact match against either the email or the userName.
    async fn user_by_login(&self, login: &str) -> Result<Option<User>, StoreError>;

    async fn update_profile(&self, id: &UserId, patch: ProfilePatch) -> Result<User, StoreError>;

    async fn set_profile_image(&self, id: &UserId, url: &str) -> Result<User, StoreError>;

    /// Adds the edge follower→target to both user records. Conflict when
    /// the edge already exists; validation error on a self-edge.
    async fn follow(&self, follower: &UserId, target: &UserId) -> Result<(), StoreError>;

    /// Removes the edge follower→target from both records. Conflict when
    /// the follower is not currently following the target.
    async fn unfollow(&self, follower: &UserId, target: &UserId) -> Result<(), StoreError>;

    async fn create_tweet(&self, tweet: Tweet) -> Result<Tweet, StoreError>;

    async fn tweet(&self, id: &TweetId) -> Result<Option<Tweet>, StoreError>;

    /// Every tweet (replies included), newest first.
    async fn list_tweets(&self) -> Result<Vec<Tweet>, StoreError>;

    /// Tweets owned by one user (replies included), newest first.
    async fn tweets_by(&self, owner: &UserId) -> Result<Vec<Tweet>, StoreError>;

    async fn like(&self, id: &TweetId, user: &UserId) -> Result<Tweet, StoreError>;

    async fn unlike(&self, id: &TweetId, user: &UserId) -> Result<Tweet, StoreError>;

    async fn retweet(&self, id: &TweetId, user: &UserId) -> Result<Tweet, StoreError>;

    /// Persists the reply and appends its id to the parent in one unit. A
    /// missing parent fails the whole operation with nothing persisted.
    /// Returns the stored reply and the updated parent.
    async fn create_reply(
        &self,
        parent: &TweetId,
        reply: Tweet,
    ) -> Result<(Tweet, Tweet), StoreError>;

    /// Deletes the reply record and drops the parent's reference in one
    /// unit. Returns the updated parent.
    async fn remove_reply(&self, parent: &TweetId, reply: &TweetId) -> Result<Tweet, StoreError>;

    /// Deletes a tweet record. Replies referenced by it are left in place
    /// (no cascade), as are stale like/retweet references elsewhere.
    async fn delete_tweet(&self, id: &TweetId) -> Result<(), StoreError>;
}

pub(crate) fn engagement_conflict(err: chirp_model::EngagementError) -> StoreError {
    StoreError::conflict(err.to_string())
}

/// Edge mutation shared by the backends; callers provide both loaded
/// records and persist them only when this returns Ok.
pub(crate) fn apply_follow(
    follower: &mut User,
    target: &mut User,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), StoreError> {
    if follower.id == target.id {
        return Err(StoreError::new(
            StoreErrorCode::Validation,
            "self-referential follow edge",
        ));
    }
    if !target.add_follower(&follower.id) {
        return Err(StoreError::conflict("You are already following this user"));
    }
    // Repair a one-directional edge if a previous write left one behind.
    follower.add_following(&target.id);
    follower.updated_at = now;
    target.updated_at = now;
    Ok(())
}

pub(crate) fn apply_unfollow(
    follower: &mut User,
    target: &mut User,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), StoreError> {
    if follower.id == target.id {
        return Err(StoreError::new(
            StoreErrorCode::Validation,
            "self-referential follow edge",
        ));
    }
    if !follower.remove_following(&target.id) {
        return Err(StoreError::conflict(
            "You are already not following this user",
        ));
    }
    target.remove_follower(&follower.id);
    follower.updated_at = now;
    target.updated_at = now;
    Ok(())
}

pub(crate) fn sort_newest_first(tweets: &mut [Tweet]) {
    tweets.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
