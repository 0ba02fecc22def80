// SPDX-License-Identifier: MIT

use chirp_api::ApiError;
use std::path::Path;

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpeg", "jpg", "png"];
const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

#[derive(Debug, Clone, Copy)]
pub enum MediaKind {
    TweetImage,
    ProfilePic,
}

impl MediaKind {
    const fn file_prefix(self) -> &'static str {
        match self {
            Self::TweetImage => "tweet",
            Self::ProfilePic => "profilePic",
        }
    }

    const fn subdir(self) -> Option<&'static str> {
        match self {
            Self::TweetImage => Some("tweets"),
            Self::ProfilePic => None,
        }
    }
}

fn unsupported_filetype() -> ApiError {
    ApiError::validation("File upload only supports the following filetypes - jpeg|jpg|png")
}

/// Checks both the declared MIME type and the filename extension; either
/// failing rejects the file.
fn validate_image(file_name: &str, content_type: Option<&str>) -> Result<String, ApiError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(unsupported_filetype)?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(unsupported_filetype());
    }
    let mime = content_type.ok_or_else(unsupported_filetype)?;
    if !ALLOWED_MIME_TYPES.contains(&mime) {
        return Err(unsupported_filetype());
    }
    Ok(ext)
}

/// Writes an uploaded image under the media root and returns its
/// root-relative path. The file stays behind if a later database write
/// fails; nothing cleans it up.
pub async fn store_image(
    media_root: &Path,
    kind: MediaKind,
    file_name: &str,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<String, ApiError> {
    let ext = validate_image(file_name, content_type)?;
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..9];
    let stored_name = format!(
        "{}-{}-{}.{ext}",
        kind.file_prefix(),
        chrono::Utc::now().timestamp_millis(),
        suffix
    );

    let (dir, relative) = match kind.subdir() {
        Some(sub) => (media_root.join(sub), format!("{sub}/{stored_name}")),
        None => (media_root.to_path_buf(), stored_name.clone()),
    };
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ApiError::internal(format!("failed to prepare media dir: {e}")))?;
    tokio::fs::write(dir.join(&stored_name), bytes)
        .await
        .map_err(|e| ApiError::internal(format!("failed to store image: {e}")))?;
    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_extension_or_mime() {
        assert!(validate_image("x.gif", Some("image/png")).is_err());
        assert!(validate_image("x.png", Some("image/gif")).is_err());
        assert!(validate_image("x.png", None).is_err());
        assert!(validate_image("noext", Some("image/png")).is_err());
        assert_eq!(validate_image("x.PNG", Some("image/png")).unwrap(), "png");
        assert_eq!(validate_image("y.jpeg", Some("image/jpeg")).unwrap(), "jpeg");
    }

    #[tokio::test]
    async fn stored_tweet_images_land_in_the_tweets_subdir() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let rel = store_image(
            tmp.path(),
            MediaKind::TweetImage,
            "pic.png",
            Some("image/png"),
            b"not-really-a-png",
        )
        .await
        .expect("store");
        assert!(rel.starts_with("tweets/tweet-"));
        assert!(tmp.path().join(&rel).exists());
    }

    #[tokio::test]
    async fn profile_pics_land_at_the_media_root() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let rel = store_image(
            tmp.path(),
            MediaKind::ProfilePic,
            "me.jpg",
            Some("image/jpeg"),
            b"jpg-bytes",
        )
        .await
        .expect("store");
        assert!(rel.starts_with("profilePic-"));
        assert!(tmp.path().join(&rel).exists());
    }
}
