// SPDX-License-Identifier: MIT

use crate::id::{ParseError, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const NAME_MAX_LEN: usize = 256;
pub const EMAIL_MAX_LEN: usize = 256;

/// Default avatar assigned at registration, kept from the original product.
pub const DEFAULT_PROFILE_IMG: &str =
    "https://images.unsplash.com/photo-1438761681033-6461ffad8d80?auto=format&fit=crop&w=500&q=60";
pub const DEFAULT_LOCATION: &str = "test";

pub fn parse_user_name(input: &str) -> Result<String, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty("userName"));
    }
    if input.trim() != input {
        return Err(ParseError::Trimmed("userName"));
    }
    if input.len() > NAME_MAX_LEN {
        return Err(ParseError::TooLong("userName", NAME_MAX_LEN));
    }
    Ok(input.to_string())
}

pub fn parse_email(input: &str) -> Result<String, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty("email"));
    }
    if input.len() > EMAIL_MAX_LEN {
        return Err(ParseError::TooLong("email", EMAIL_MAX_LEN));
    }
    if !input.contains('@') {
        return Err(ParseError::InvalidFormat("email must contain '@'"));
    }
    Ok(input.to_string())
}

/// A user record. `password_hash` is a PHC-format string and must never
/// reach a wire representation; the api crate owns the projections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub user_name: String,
    pub password_hash: String,
    pub profile_img: String,
    pub location: String,
    pub date_of_birth: Option<NaiveDate>,
    pub followers: Vec<UserId>,
    pub following: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn register(
        full_name: String,
        user_name: &str,
        email: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<Self, ParseError> {
        if full_name.is_empty() {
            return Err(ParseError::Empty("fullName"));
        }
        Ok(Self {
            id: UserId::generate(),
            full_name,
            email: parse_email(email)?,
            user_name: parse_user_name(user_name)?,
            password_hash,
            profile_img: DEFAULT_PROFILE_IMG.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            date_of_birth: None,
            followers: Vec::new(),
            following: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Adds `follower` to this user's follower set. Returns false if the
    /// edge already exists; the set never holds a pair twice.
    pub fn add_follower(&mut self, follower: &UserId) -> bool {
        if self.followers.contains(follower) {
            return false;
        }
        self.followers.push(follower.clone());
        true
    }

    pub fn remove_follower(&mut self, follower: &UserId) -> bool {
        let before = self.followers.len();
        self.followers.retain(|id| id != follower);
        self.followers.len() != before
    }

    pub fn add_following(&mut self, target: &UserId) -> bool {
        if self.following.contains(target) {
            return false;
        }
        self.following.push(target.clone());
        true
    }

    pub fn remove_following(&mut self, target: &UserId) -> bool {
        let before = self.following.len();
        self.following.retain(|id| id != target);
        self.following.len() != before
    }

    #[must_use]
    pub fn is_following(&self, target: &UserId) -> bool {
        self.following.contains(target)
    }

    /// Applies the whitelisted profile fields. Field-level validation of
    /// the patch happens at the wire boundary; this only moves `updated_at`.
    pub fn apply_profile_patch(&mut self, patch: ProfilePatch, now: DateTime<Utc>) {
        if let Some(full_name) = patch.full_name {
            self.full_name = full_name;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(date_of_birth) = patch.date_of_birth {
            self.date_of_birth = Some(date_of_birth);
        }
        self.updated_at = now;
    }
}

/// The only profile fields mutable through the profile-edit path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub location: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl ProfilePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.location.is_none() && self.date_of_birth.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User::register(
            format!("{name} surname"),
            name,
            &format!("{name}@example.com"),
            "$argon2id$fake".to_string(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn register_applies_defaults() {
        let u = user("alice");
        assert_eq!(u.profile_img, DEFAULT_PROFILE_IMG);
        assert_eq!(u.location, DEFAULT_LOCATION);
        assert!(u.followers.is_empty() && u.following.is_empty());
        assert_eq!(u.created_at, u.updated_at);
    }

    #[test]
    fn register_rejects_untrimmed_user_name_and_bad_email() {
        let now = Utc::now();
        assert!(User::register("A".into(), " alice", "a@x.com", "h".into(), now).is_err());
        assert!(User::register("A".into(), "alice", "not-an-email", "h".into(), now).is_err());
        assert!(User::register(String::new(), "alice", "a@x.com", "h".into(), now).is_err());
    }

    #[test]
    fn follower_set_holds_each_pair_at_most_once() {
        let mut bob = user("bob");
        let alice = user("alice");
        assert!(bob.add_follower(&alice.id));
        assert!(!bob.add_follower(&alice.id));
        assert_eq!(bob.followers.len(), 1);
        assert!(bob.remove_follower(&alice.id));
        assert!(!bob.remove_follower(&alice.id));
        assert!(bob.followers.is_empty());
    }

    #[test]
    fn profile_patch_only_touches_whitelisted_fields() {
        let mut u = user("carol");
        let email = u.email.clone();
        let later = u.updated_at + chrono::Duration::seconds(5);
        u.apply_profile_patch(
            ProfilePatch {
                full_name: Some("Carol R".into()),
                location: Some("Lagos".into()),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 2),
            },
            later,
        );
        assert_eq!(u.full_name, "Carol R");
        assert_eq!(u.location, "Lagos");
        assert_eq!(u.date_of_birth, NaiveDate::from_ymd_opt(1990, 4, 2));
        assert_eq!(u.email, email);
        assert_eq!(u.updated_at, later);
    }
}
