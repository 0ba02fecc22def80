// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const ID_MAX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    Trimmed(&'static str),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::Trimmed(name) => {
                write!(f, "{name} must not contain leading/trailing whitespace")
            }
            Self::TooLong(name, max) => write!(f, "{name} exceeds max length {max}"),
            Self::InvalidFormat(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ParseError {}

fn parse_id(input: &str, name: &'static str) -> Result<String, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty(name));
    }
    if input.trim() != input {
        return Err(ParseError::Trimmed(name));
    }
    if input.len() > ID_MAX_LEN {
        return Err(ParseError::TooLong(name, ID_MAX_LEN));
    }
    Ok(input.to_string())
}

/// Opaque identifiers are UUIDv4 with the dashes stripped, but any
/// non-empty trimmed string is accepted on parse so externally minted
/// ids keep resolving.
fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse_id(input, "user id").map(Self)
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(generate_id())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TweetId(String);

impl TweetId {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse_id(input, "tweet id").map(Self)
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(generate_id())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TweetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
