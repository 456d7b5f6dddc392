//! Error types for relay operations.
//!
//! [`RelayError`] covers both the fatal failures that end a run (fetching,
//! parsing, a corrupt ledger) and the per-post failures the orchestrator
//! recovers from (a rejected send, a failed ledger write, missing media).
//!
//! # Example
//!
//! ```rust
//! use eitaa_relay_core::{RelayError, Result};
//!
//! fn require_posts(count: usize) -> Result<usize> {
//!     if count == 0 {
//!         return Err(RelayError::NoPostsFound);
//!     }
//!     Ok(count)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for extraction, ledger, and delivery operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// HTTP request errors from reqwest.
    ///
    /// Covers DNS failures, refused connections, and body decoding problems
    /// for both the page fetch and the Bot API calls.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The channel page answered with a non-success status.
    #[error("Channel page returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors, including invalid CSS selectors.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// The page parsed but contained no post carrying an identifier.
    #[error("No posts found in channel page")]
    NoPostsFound,

    /// The sent-ledger exists but is not a JSON array of strings.
    ///
    /// Fatal at startup: continuing would re-deliver every post on the page.
    #[error("Sent-ledger {path} is corrupt: {source}")]
    CorruptLedger {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// File read and write errors.
    #[error("I/O error: {0}")]
    WriteError(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Chat target is neither `@channel` nor a numeric chat id.
    #[error("Invalid Telegram chat ID: {0}")]
    InvalidChatId(String),

    /// The Bot API rejected a request.
    #[error("Telegram API error {code}: {description}")]
    TelegramError { code: u16, description: String },

    /// Every image of a post failed to stage, so no media group can be built.
    #[error("No valid media for post {post_id}")]
    NoValidMedia { post_id: String },

    /// JSON serialization errors for output artifacts.
    #[error("Serialization failed: {0}")]
    SerializeError(String),
}

/// Result type alias for RelayError.
pub type Result<T> = std::result::Result<T, RelayError>;
