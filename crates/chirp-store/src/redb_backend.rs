// SPDX-License-Identifier: MIT

use crate::backend::{
    apply_follow, apply_unfollow, engagement_conflict, sort_newest_first, SocialStore, StoreError,
    StoreErrorCode,
};
use async_trait::async_trait;
use chirp_model::{ProfilePatch, Tweet, TweetId, User, UserId};
use chrono::Utc;
use redb::{Database, ReadableTable, Table, TableDefinition};
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
const TWEETS: TableDefinition<&str, &[u8]> = TableDefinition::new("tweets");
/// Uniqueness indexes: value is the owning user id.
const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");
const USER_NAMES: TableDefinition<&str, &str> = TableDefinition::new("user_names");

fn storage_err(e: impl Display) -> StoreError {
    StoreError::new(StoreErrorCode::Storage, e.to_string())
}

fn codec_err(e: impl Display) -> StoreError {
    StoreError::new(StoreErrorCode::Serialization, e.to_string())
}

fn get_doc<T: serde::de::DeserializeOwned>(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let bytes = table
        .get(key)
        .map_err(storage_err)?
        .map(|guard| guard.value().to_vec());
    match bytes {
        Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(codec_err),
        None => Ok(None),
    }
}

fn put_doc<T: serde::Serialize>(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value).map_err(codec_err)?;
    table
        .insert(key, bytes.as_slice())
        .map_err(storage_err)
        .map(|_| ())
}

/// Embedded document store backed by redb. Each record is one JSON
/// document; every `SocialStore` operation is a single write transaction,
/// so cross-document mutations commit all-or-nothing.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Opens or creates the database file and ensures all tables exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(storage_err)?;
        let txn = db.begin_write().map_err(storage_err)?;
        {
            txn.open_table(USERS).map_err(storage_err)?;
            txn.open_table(TWEETS).map_err(storage_err)?;
            txn.open_table(USER_EMAILS).map_err(storage_err)?;
            txn.open_table(USER_NAMES).map_err(storage_err)?;
        }
        txn.commit().map_err(storage_err)?;
        info!(path = %path.display(), "opened redb store");
        Ok(Self { db: Arc::new(db) })
    }

    fn read_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let table = txn.open_table(USERS).map_err(storage_err)?;
        get_doc(&table, id.as_str())
    }

    fn read_tweet(&self, id: &TweetId) -> Result<Option<Tweet>, StoreError> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let table = txn.open_table(TWEETS).map_err(storage_err)?;
        get_doc(&table, id.as_str())
    }

    fn all_tweets(&self) -> Result<Vec<Tweet>, StoreError> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let table = txn.open_table(TWEETS).map_err(storage_err)?;
        let mut tweets = Vec::new();
        for item in table.iter().map_err(storage_err)? {
            let (_, value) = item.map_err(storage_err)?;
            tweets.push(serde_json::from_slice(value.value()).map_err(codec_err)?);
        }
        Ok(tweets)
    }

    /// Loads a tweet inside a write transaction, applies `mutate`, and
    /// persists the result before committing.
    fn mutate_tweet<F>(&self, id: &TweetId, mutate: F) -> Result<Tweet, StoreError>
    where
        F: FnOnce(&mut Tweet) -> Result<(), StoreError>,
    {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let tweet = {
            let mut table = txn.open_table(TWEETS).map_err(storage_err)?;
            let mut tweet: Tweet = get_doc(&table, id.as_str())?
                .ok_or_else(|| StoreError::not_found("Tweet not found"))?;
            mutate(&mut tweet)?;
            put_doc(&mut table, id.as_str(), &tweet)?;
            tweet
        };
        txn.commit().map_err(storage_err)?;
        Ok(tweet)
    }

    fn mutate_user<F>(&self, id: &UserId, mutate: F) -> Result<User, StoreError>
    where
        F: FnOnce(&mut User),
    {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let user = {
            let mut table = txn.open_table(USERS).map_err(storage_err)?;
            let mut user: User = get_doc(&table, id.as_str())?
                .ok_or_else(|| StoreError::not_found("User not found"))?;
            mutate(&mut user);
            put_doc(&mut table, id.as_str(), &user)?;
            user
        };
        txn.commit().map_err(storage_err)?;
        Ok(user)
    }

    fn mutate_edge<F>(&self, follower: &UserId, target: &UserId, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut User, &mut User) -> Result<(), StoreError>,
    {
        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = txn.open_table(USERS).map_err(storage_err)?;
            let mut target_user: User = get_doc(&table, target.as_str())?
                .ok_or_else(|| StoreError::not_found("User not found"))?;
            let mut follower_user: User = get_doc(&table, follower.as_str())?
                .ok_or_else(|| StoreError::not_found("User not found"))?;
            apply(&mut follower_user, &mut target_user)?;
            put_doc(&mut table, target.as_str(), &target_user)?;
            put_doc(&mut table, follower.as_str(), &follower_user)?;
        }
        txn.commit().map_err(storage_err)?;
        Ok(())
    }
}

#[async_trait]
impl SocialStore for RedbStore {
    fn backend_tag(&self) -> &'static str {
        "redb"
    }

    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut emails = txn.open_table(USER_EMAILS).map_err(storage_err)?;
            let mut names = txn.open_table(USER_NAMES).map_err(storage_err)?;
            if emails
                .get(user.email.as_str())
                .map_err(storage_err)?
                .is_some()
            {
                return Err(StoreError::conflict(
                    "User with this email already registered",
                ));
            }
            if names
                .get(user.user_name.as_str())
                .map_err(storage_err)?
                .is_some()
            {
                return Err(StoreError::conflict("userName is not available"));
            }
            emails
                .insert(user.email.as_str(), user.id.as_str())
                .map_err(storage_err)?;
            names
                .insert(user.user_name.as_str(), user.id.as_str())
                .map_err(storage_err)?;
            let mut users = txn.open_table(USERS).map_err(storage_err)?;
            put_doc(&mut users, user.id.as_str(), &user)?;
        }
        txn.commit().map_err(storage_err)?;
        Ok(user)
    }

    async fn user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        self.read_user(id)
    }

    async fn user_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let emails = txn.open_table(USER_EMAILS).map_err(storage_err)?;
        let names = txn.open_table(USER_NAMES).map_err(storage_err)?;
        let id = match emails.get(login).map_err(storage_err)? {
            Some(guard) => Some(guard.value().to_string()),
            None => names
                .get(login)
                .map_err(storage_err)?
                .map(|guard| guard.value().to_string()),
        };
        match id {
            Some(id) => {
                let users = txn.open_table(USERS).map_err(storage_err)?;
                get_doc(&users, &id)
            }
            None => Ok(None),
        }
    }

    async fn update_profile(&self, id: &UserId, patch: ProfilePatch) -> Result<User, StoreError> {
        self.mutate_user(id, |user| user.apply_profile_patch(patch, Utc::now()))
    }

    async fn set_profile_image(&self, id: &UserId, url: &str) -> Result<User, StoreError> {
        self.mutate_user(id, |user| {
            user.profile_img = url.to_string();
            user.updated_at = Utc::now();
        })
    }

    async fn follow(&self, follower: &UserId, target: &UserId) -> Result<(), StoreError> {
        self.mutate_edge(follower, target, |f, t| apply_follow(f, t, Utc::now()))
    }

    async fn unfollow(&self, follower: &UserId, target: &UserId) -> Result<(), StoreError> {
        self.mutate_edge(follower, target, |f, t| apply_unfollow(f, t, Utc::now()))
    }

    async fn create_tweet(&self, tweet: Tweet) -> Result<Tweet, StoreError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = txn.open_table(TWEETS).map_err(storage_err)?;
            put_doc(&mut table, tweet.id.as_str(), &tweet)?;
        }
        txn.commit().map_err(storage_err)?;
        Ok(tweet)
    }

    async fn tweet(&self, id: &TweetId) -> Result<Option<Tweet>, StoreError> {
        self.read_tweet(id)
    }

    async fn list_tweets(&self) -> Result<Vec<Tweet>, StoreError> {
        let mut tweets = self.all_tweets()?;
        sort_newest_first(&mut tweets);
        Ok(tweets)
    }

    async fn tweets_by(&self, owner: &UserId) -> Result<Vec<Tweet>, StoreError> {
        let mut tweets = self.all_tweets()?;
        tweets.retain(|t| &t.tweeted_by == owner);
        sort_newest_first(&mut tweets);
        Ok(tweets)
    }

    async fn like(&self, id: &TweetId, user: &UserId) -> Result<Tweet, StoreError> {
        self.mutate_tweet(id, |tweet| {
            tweet.like(user, Utc::now()).map_err(engagement_conflict)
        })
    }

    async fn unlike(&self, id: &TweetId, user: &UserId) -> Result<Tweet, StoreError> {
        self.mutate_tweet(id, |tweet| {
            tweet.unlike(user, Utc::now()).map_err(engagement_conflict)
        })
    }

    async fn retweet(&self, id: &TweetId, user: &UserId) -> Result<Tweet, StoreError> {
        self.mutate_tweet(id, |tweet| {
            tweet.retweet(user, Utc::now()).map_err(engagement_conflict)
        })
    }

    async fn create_reply(
        &self,
        parent: &TweetId,
        reply: Tweet,
    ) -> Result<(Tweet, Tweet), StoreError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let parent_tweet = {
            let mut table = txn.open_table(TWEETS).map_err(storage_err)?;
            let mut parent_tweet: Tweet = get_doc(&table, parent.as_str())?
                .ok_or_else(|| StoreError::not_found("Parent tweet not found"))?;
            parent_tweet.append_reply(&reply.id, Utc::now());
            put_doc(&mut table, reply.id.as_str(), &reply)?;
            put_doc(&mut table, parent.as_str(), &parent_tweet)?;
            parent_tweet
        };
        txn.commit().map_err(storage_err)?;
        Ok((reply, parent_tweet))
    }

    async fn remove_reply(&self, parent: &TweetId, reply: &TweetId) -> Result<Tweet, StoreError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let parent_tweet = {
            let mut table = txn.open_table(TWEETS).map_err(storage_err)?;
            let mut parent_tweet: Tweet = get_doc(&table, parent.as_str())?
                .ok_or_else(|| StoreError::not_found("Parent tweet not found"))?;
            if !parent_tweet.remove_reply(reply, Utc::now()) {
                return Err(StoreError::not_found("Reply not found"));
            }
            table.remove(reply.as_str()).map_err(storage_err)?;
            put_doc(&mut table, parent.as_str(), &parent_tweet)?;
            parent_tweet
        };
        txn.commit().map_err(storage_err)?;
        Ok(parent_tweet)
    }

    async fn delete_tweet(&self, id: &TweetId) -> Result<(), StoreError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        // Bound before `table` drops; the access guard borrows it.
        let removed;
        {
            let mut table = txn.open_table(TWEETS).map_err(storage_err)?;
            removed = table.remove(id.as_str()).map_err(storage_err)?.is_some();
        }
        txn.commit().map_err(storage_err)?;
        if !removed {
            return Err(StoreError::not_found("Tweet not found"));
        }
        Ok(())
    }
}
