#![forbid(unsafe_code)]
//! Wire contract for the chirp social backend.

mod dto;
mod error_mapping;
mod errors;

pub use dto::{
    LoginRequest, LoginUserDto, PublicProfileDto, RegisterRequest, ReplyRequest, TweetDto,
    UpdateProfileRequest, UserProfileDto,
};
pub use error_mapping::{map_error, status_for};
pub use errors::{ApiError, ApiErrorCode};

pub const CRATE_NAME: &str = "chirp-api";
