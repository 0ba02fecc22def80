// SPDX-License-Identifier: MIT

use crate::backend::{
    apply_follow, apply_unfollow, engagement_conflict, sort_newest_first, SocialStore, StoreError,
};
use async_trait::async_trait;
use chirp_model::{ProfilePatch, Tweet, TweetId, User, UserId};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryInner {
    users: HashMap<UserId, User>,
    emails: HashMap<String, UserId>,
    user_names: HashMap<String, UserId>,
    tweets: HashMap<TweetId, Tweet>,
}

/// In-memory backend. Every operation runs under one write guard, so each
/// multi-document mutation is atomic by construction. Used by tests and
/// ephemeral dev runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SocialStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.emails.contains_key(&user.email) {
            return Err(StoreError::conflict(
                "User with this email already registered",
            ));
        }
        if inner.user_names.contains_key(&user.user_name) {
            return Err(StoreError::conflict("userName is not available"));
        }
        inner.emails.insert(user.email.clone(), user.id.clone());
        inner
            .user_names
            .insert(user.user_name.clone(), user.id.clone());
        inner.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn user_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        let id = inner
            .emails
            .get(login)
            .or_else(|| inner.user_names.get(login));
        Ok(id.and_then(|id| inner.users.get(id)).cloned())
    }

    async fn update_profile(&self, id: &UserId, patch: ProfilePatch) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("User not found"))?;
        user.apply_profile_patch(patch, Utc::now());
        Ok(user.clone())
    }

    async fn set_profile_image(&self, id: &UserId, url: &str) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("User not found"))?;
        user.profile_img = url.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn follow(&self, follower: &UserId, target: &UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let mut target_user = inner
            .users
            .get(target)
            .cloned()
            .ok_or_else(|| StoreError::not_found("User not found"))?;
        let mut follower_user = inner
            .users
            .get(follower)
            .cloned()
            .ok_or_else(|| StoreError::not_found("User not found"))?;
        apply_follow(&mut follower_user, &mut target_user, Utc::now())?;
        inner.users.insert(target.clone(), target_user);
        inner.users.insert(follower.clone(), follower_user);
        Ok(())
    }

    async fn unfollow(&self, follower: &UserId, target: &UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let mut target_user = inner
            .users
            .get(target)
            .cloned()
            .ok_or_else(|| StoreError::not_found("User not found"))?;
        let mut follower_user = inner
            .users
            .get(follower)
            .cloned()
            .ok_or_else(|| StoreError::not_found("User not found"))?;
        apply_unfollow(&mut follower_user, &mut target_user, Utc::now())?;
        inner.users.insert(target.clone(), target_user);
        inner.users.insert(follower.clone(), follower_user);
        Ok(())
    }

    async fn create_tweet(&self, tweet: Tweet) -> Result<Tweet, StoreError> {
        let mut inner = self.inner.write().await;
        inner.tweets.insert(tweet.id.clone(), tweet.clone());
        Ok(tweet)
    }

    async fn tweet(&self, id: &TweetId) -> Result<Option<Tweet>, StoreError> {
        Ok(self.inner.read().await.tweets.get(id).cloned())
    }

    async fn list_tweets(&self) -> Result<Vec<Tweet>, StoreError> {
        let mut tweets: Vec<Tweet> = self.inner.read().await.tweets.values().cloned().collect();
        sort_newest_first(&mut tweets);
        Ok(tweets)
    }

    async fn tweets_by(&self, owner: &UserId) -> Result<Vec<Tweet>, StoreError> {
        let mut tweets: Vec<Tweet> = self
            .inner
            .read()
            .await
            .tweets
            .values()
            .filter(|t| &t.tweeted_by == owner)
            .cloned()
            .collect();
        sort_newest_first(&mut tweets);
        Ok(tweets)
    }

    async fn like(&self, id: &TweetId, user: &UserId) -> Result<Tweet, StoreError> {
        let mut inner = self.inner.write().await;
        let tweet = inner
            .tweets
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("Tweet not found"))?;
        tweet.like(user, Utc::now()).map_err(engagement_conflict)?;
        Ok(tweet.clone())
    }

    async fn unlike(&self, id: &TweetId, user: &UserId) -> Result<Tweet, StoreError> {
        let mut inner = self.inner.write().await;
        let tweet = inner
            .tweets
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("Tweet not found"))?;
        tweet
            .unlike(user, Utc::now())
            .map_err(engagement_conflict)?;
        Ok(tweet.clone())
    }

    async fn retweet(&self, id: &TweetId, user: &UserId) -> Result<Tweet, StoreError> {
        let mut inner = self.inner.write().await;
        let tweet = inner
            .tweets
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("Tweet not found"))?;
        tweet
            .retweet(user, Utc::now())
            .map_err(engagement_conflict)?;
        Ok(tweet.clone())
    }

    async fn create_reply(
        &self,
        parent: &TweetId,
        reply: Tweet,
    ) -> Result<(Tweet, Tweet), StoreError> {
        let mut inner = self.inner.write().await;
        let mut parent_tweet = inner
            .tweets
            .get(parent)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Parent tweet not found"))?;
        parent_tweet.append_reply(&reply.id, Utc::now());
        inner.tweets.insert(reply.id.clone(), reply.clone());
        inner.tweets.insert(parent.clone(), parent_tweet.clone());
        Ok((reply, parent_tweet))
    }

    async fn remove_reply(&self, parent: &TweetId, reply: &TweetId) -> Result<Tweet, StoreError> {
        let mut inner = self.inner.write().await;
        let mut parent_tweet = inner
            .tweets
            .get(parent)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Parent tweet not found"))?;
        if !parent_tweet.remove_reply(reply, Utc::now()) {
            return Err(StoreError::not_found("Reply not found"));
        }
        inner.tweets.remove(reply);
        inner.tweets.insert(parent.clone(), parent_tweet.clone());
        Ok(parent_tweet)
    }

    async fn delete_tweet(&self, id: &TweetId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.tweets.remove(id).is_none() {
            return Err(StoreError::not_found("Tweet not found"));
        }
        Ok(())
    }
}
