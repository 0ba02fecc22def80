// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 3600;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HMAC secret for signing bearer tokens. Override in any real
    /// deployment; the default only exists for local runs and tests.
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// Directory uploaded media is written to and served from.
    pub media_root: PathBuf,
    /// Origin prepended to `/images/...` paths when rendering media URLs.
    pub public_base_url: String,
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "chirp-dev-secret".to_string(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            media_root: PathBuf::from("images"),
            public_base_url: "http://localhost:5000".to_string(),
            max_body_bytes: 5 * 1024 * 1024,
        }
    }
}

impl ApiConfig {
    /// Absolute URL for a media path relative to the media root.
    #[must_use]
    pub fn image_url(&self, relative: &str) -> String {
        format!("{}/images/{relative}", self.public_base_url)
    }
}
