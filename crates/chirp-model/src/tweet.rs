// SPDX-License-Identifier: MIT

use crate::id::{ParseError, TweetId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const CONTENT_MAX_LEN: usize = 8192;

/// Engagement mutations are idempotency-checked, not idempotent: repeating
/// one without its inverse is a conflict rather than a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngagementError {
    AlreadyLiked,
    NotLiked,
    AlreadyRetweeted,
}

impl Display for EngagementError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyLiked => f.write_str("You have already liked this tweet"),
            Self::NotLiked => f.write_str("You have not liked this tweet to dislike"),
            Self::AlreadyRetweeted => f.write_str("You have already retweeted this tweet"),
        }
    }
}

impl std::error::Error for EngagementError {}

pub fn parse_content(input: &str) -> Result<String, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty("content"));
    }
    if input.len() > CONTENT_MAX_LEN {
        return Err(ParseError::TooLong("content", CONTENT_MAX_LEN));
    }
    Ok(input.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tweet {
    pub id: TweetId,
    pub content: String,
    /// Owning user; immutable after creation.
    pub tweeted_by: UserId,
    pub likes: Vec<UserId>,
    pub retweet_by: Vec<UserId>,
    /// Media path relative to the server's media root, e.g. `tweets/x.png`.
    pub image: Option<String>,
    pub replies: Vec<TweetId>,
    pub is_reply: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tweet {
    pub fn original(
        content: &str,
        tweeted_by: UserId,
        image: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            id: TweetId::generate(),
            content: parse_content(content)?,
            tweeted_by,
            likes: Vec::new(),
            retweet_by: Vec::new(),
            image,
            replies: Vec::new(),
            is_reply: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// A reply is a standalone record with `is_reply` set; the parent keeps
    /// the directional reference in its `replies` sequence.
    pub fn reply(content: &str, tweeted_by: UserId, now: DateTime<Utc>) -> Result<Self, ParseError> {
        let mut tweet = Self::original(content, tweeted_by, None, now)?;
        tweet.is_reply = true;
        Ok(tweet)
    }

    pub fn like(&mut self, user: &UserId, now: DateTime<Utc>) -> Result<(), EngagementError> {
        if self.likes.contains(user) {
            return Err(EngagementError::AlreadyLiked);
        }
        self.likes.push(user.clone());
        self.updated_at = now;
        Ok(())
    }

    pub fn unlike(&mut self, user: &UserId, now: DateTime<Utc>) -> Result<(), EngagementError> {
        if !self.likes.contains(user) {
            return Err(EngagementError::NotLiked);
        }
        self.likes.retain(|id| id != user);
        self.updated_at = now;
        Ok(())
    }

    pub fn retweet(&mut self, user: &UserId, now: DateTime<Utc>) -> Result<(), EngagementError> {
        if self.retweet_by.contains(user) {
            return Err(EngagementError::AlreadyRetweeted);
        }
        self.retweet_by.push(user.clone());
        self.updated_at = now;
        Ok(())
    }

    /// Appends a reply reference. Returns false when the id is already
    /// present so the sequence stays duplicate-free.
    pub fn append_reply(&mut self, reply: &TweetId, now: DateTime<Utc>) -> bool {
        if self.replies.contains(reply) {
            return false;
        }
        self.replies.push(reply.clone());
        self.updated_at = now;
        true
    }

    pub fn remove_reply(&mut self, reply: &TweetId, now: DateTime<Utc>) -> bool {
        let before = self.replies.len();
        self.replies.retain(|id| id != reply);
        if self.replies.len() == before {
            return false;
        }
        self.updated_at = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tweet() -> (Tweet, UserId) {
        let author = UserId::generate();
        let t = Tweet::original("hello", author.clone(), None, Utc::now()).unwrap();
        (t, author)
    }

    #[test]
    fn like_then_unlike_restores_original_state() {
        let (mut t, _) = tweet();
        let bob = UserId::generate();
        let now = Utc::now();
        t.like(&bob, now).unwrap();
        assert_eq!(t.likes, vec![bob.clone()]);
        assert_eq!(t.like(&bob, now), Err(EngagementError::AlreadyLiked));
        t.unlike(&bob, now).unwrap();
        assert!(t.likes.is_empty());
        assert_eq!(t.unlike(&bob, now), Err(EngagementError::NotLiked));
    }

    #[test]
    fn retweet_is_conflict_on_repeat() {
        let (mut t, _) = tweet();
        let bob = UserId::generate();
        let now = Utc::now();
        t.retweet(&bob, now).unwrap();
        assert_eq!(t.retweet(&bob, now), Err(EngagementError::AlreadyRetweeted));
        assert_eq!(t.retweet_by.len(), 1);
    }

    #[test]
    fn reply_is_flagged_and_appended_exactly_once() {
        let (mut parent, author) = tweet();
        let reply = Tweet::reply("nice", author, Utc::now()).unwrap();
        assert!(reply.is_reply);
        assert!(reply.replies.is_empty());
        let now = Utc::now();
        assert!(parent.append_reply(&reply.id, now));
        assert!(!parent.append_reply(&reply.id, now));
        assert_eq!(parent.replies, vec![reply.id.clone()]);
        assert!(parent.remove_reply(&reply.id, now));
        assert!(!parent.remove_reply(&reply.id, now));
    }

    #[test]
    fn content_must_be_non_empty_and_bounded() {
        let author = UserId::generate();
        assert!(Tweet::original("", author.clone(), None, Utc::now()).is_err());
        let too_long = "x".repeat(CONTENT_MAX_LEN + 1);
        assert!(Tweet::original(&too_long, author, None, Utc::now()).is_err());
    }
}
