//! Post record extracted from a channel page.
//!
//! This module defines [`Post`], the unit the rest of the pipeline passes
//! around, and [`write_posts`], which stores an extraction run as a JSON
//! array for inspection.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{RelayError, Result};

fn is_false(value: &bool) -> bool {
    !*value
}

/// One channel entry with its text, media, and metadata.
///
/// Empty optional fields are omitted from the JSON form so the output
/// artifact only shows what the page actually carried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Channel-scoped identifier, e.g. `channel/1234`. Never empty.
    pub id: String,

    /// Message text with surrounding whitespace trimmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Absolute image URLs in document order, without duplicates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,

    /// Display time as rendered on the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    /// Date from the machine-readable timestamp, formatted `YYYY/MM/DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_forwarded: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_from_link: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_reply: bool,

    /// Only set when the reply target is in the same channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<String>,
}

impl Post {
    /// Creates an empty post with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    /// Whether the post carries at least one image.
    pub fn has_media(&self) -> bool {
        !self.images.is_empty()
    }

    /// Appends an image URL unless it is already present.
    ///
    /// Returns `true` when the URL was added.
    pub fn push_image(&mut self, url: String) -> bool {
        if self.images.contains(&url) {
            return false;
        }
        self.images.push(url);
        true
    }
}

/// Serializes posts as a pretty-printed JSON array.
pub fn posts_to_json(posts: &[Post]) -> Result<String> {
    serde_json::to_string_pretty(posts).map_err(|e| RelayError::SerializeError(e.to_string()))
}

/// Writes the extracted posts to `path` as a pretty-printed JSON array.
pub fn write_posts(path: impl AsRef<Path>, posts: &[Post]) -> Result<()> {
    let json = posts_to_json(posts)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_image_keeps_first_occurrence() {
        let mut post = Post::new("chan/1");
        assert!(post.push_image("https://eitaa.com/download_a.jpg".to_string()));
        assert!(post.push_image("https://eitaa.com/download_b.jpg".to_string()));
        assert!(!post.push_image("https://eitaa.com/download_a.jpg".to_string()));

        assert_eq!(
            post.images,
            vec!["https://eitaa.com/download_a.jpg", "https://eitaa.com/download_b.jpg"]
        );
    }

    #[test]
    fn test_json_omits_empty_fields() {
        let post = Post { text: Some("Hello".to_string()), ..Post::new("chan/1") };
        let value = serde_json::to_value(&post).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), 2);
        assert_eq!(obj["id"], "chan/1");
        assert_eq!(obj["text"], "Hello");
    }

    #[test]
    fn test_json_uses_snake_case_keys() {
        let post = Post {
            is_reply: true,
            reply_to_message_id: Some("7".to_string()),
            is_forwarded: true,
            forwarded_from: Some("Other".to_string()),
            ..Post::new("chan/9")
        };
        let json = serde_json::to_string(&post).unwrap();

        assert!(json.contains("\"is_reply\":true"));
        assert!(json.contains("\"reply_to_message_id\":\"7\""));
        assert!(json.contains("\"forwarded_from\":\"Other\""));
    }

    #[test]
    fn test_write_posts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        write_posts(&path, &[Post::new("chan/1"), Post::new("chan/2")]).unwrap();

        let read: Vec<Post> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[1].id, "chan/2");
    }
}
