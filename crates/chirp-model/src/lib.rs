#![forbid(unsafe_code)]
//! Domain records and invariants for the chirp social backend.
//!
//! Everything here is plain data: identifier newtypes, the `User` and
//! `Tweet` records, and the set-semantics mutation helpers that encode the
//! one-vote-per-user and unique-edge rules. Persistence and wire concerns
//! live in the store and api crates.

mod id;
mod tweet;
mod user;

pub use id::{ParseError, TweetId, UserId, ID_MAX_LEN};
pub use tweet::{parse_content, EngagementError, Tweet, CONTENT_MAX_LEN};
pub use user::{
    parse_email, parse_user_name, ProfilePatch, User, DEFAULT_LOCATION, DEFAULT_PROFILE_IMG,
    EMAIL_MAX_LEN, NAME_MAX_LEN,
};

pub const CRATE_NAME: &str = "chirp-model";
