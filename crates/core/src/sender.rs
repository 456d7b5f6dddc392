//! Downstream channel abstraction.
//!
//! The orchestrator only talks to a [`ChannelSender`]; the Telegram Bot API
//! client in [`crate::telegram`] is one implementation, tests use in-memory
//! ones.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;

use crate::{RelayError, Result};

/// Destination chat: a numeric chat id or a public `@channel` username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatTarget {
    Id(i64),
    Channel(String),
}

impl FromStr for ChatTarget {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with('@') {
            if s.len() == 1 {
                return Err(RelayError::InvalidChatId(s.to_string()));
            }
            return Ok(Self::Channel(s.to_string()));
        }

        s.parse::<i64>()
            .map(Self::Id)
            .map_err(|_| RelayError::InvalidChatId(s.to_string()))
    }
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Channel(name) => f.write_str(name),
        }
    }
}

/// Text formatting mode requested from the downstream renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Text is delivered as-is.
    #[default]
    Plain,
    /// Text is pre-escaped for MarkdownV2.
    MarkdownV2,
}

/// Where a media item's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Remote URL the downstream service fetches itself.
    Url(String),
    /// File staged locally and uploaded with the request.
    File(PathBuf),
}

/// One photo of a media group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub source: MediaSource,
    /// Only the first item of a group carries a caption.
    pub caption: Option<String>,
}

/// Sends composed posts to a downstream chat.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Sends a text message and returns its message id.
    async fn send_text(&self, target: &ChatTarget, text: &str, parse_mode: ParseMode) -> Result<i64>;

    /// Sends photos as one album.
    async fn send_media_group(&self, target: &ChatTarget, items: &[MediaItem], parse_mode: ParseMode) -> Result<()>;
}
