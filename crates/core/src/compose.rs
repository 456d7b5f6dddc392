//! Delivery text for a post.
//!
//! The composed message is the post text followed, when the footer is
//! enabled, by forwarded-from, in-reply-to, and posted-on lines. Sections
//! are separated by a blank line. A reply into another channel has no
//! message id, so its in-reply-to link ends at the channel root.
//!
//! With escaping enabled the whole rendered string is escaped for Telegram
//! MarkdownV2, including names and URLs inside the footer.

use url::Url;

use crate::extract::DEFAULT_BASE_URL;
use crate::post::Post;

/// Characters MarkdownV2 treats as markup.
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Configuration for message composition
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    /// Append forwarded/reply/date metadata after the text
    pub include_footer: bool,
    /// Backslash-escape MarkdownV2 special characters
    pub escape_markdown: bool,
    /// Origin used to build in-reply-to permalinks
    pub base_url: Url,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            include_footer: true,
            escape_markdown: false,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
        }
    }
}

/// Renders the delivery text for `post`.
///
/// Returns an empty string when the post has no text and the footer adds
/// nothing, which the orchestrator treats as "no text content".
pub fn compose(post: &Post, username: &str, config: &ComposeConfig) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(text) = post.text.as_deref().filter(|t| !t.is_empty()) {
        sections.push(text.to_string());
    }

    if config.include_footer {
        if post.is_forwarded {
            sections.push(format!(
                "Forwarded from: {} ({})",
                post.forwarded_from.as_deref().unwrap_or_default(),
                post.forwarded_from_link.as_deref().unwrap_or_default()
            ));
        }

        if post.is_reply {
            let message_id = post.reply_to_message_id.as_deref().unwrap_or_default();
            sections.push(format!("In reply to: {}", reply_permalink(&config.base_url, username, message_id)));
        }

        if let (Some(date), Some(time)) = (&post.date, &post.time) {
            sections.push(format!("Posted on: {} {}", date, time));
        }
    }

    let message = sections.join("\n\n");
    if config.escape_markdown { escape_markdown_v2(&message) } else { message }
}

/// `https://eitaa.com/chan/42` for a message in `chan`.
fn reply_permalink(base_url: &Url, username: &str, message_id: &str) -> String {
    format!("{}/{}/{}", base_url.as_str().trim_end_matches('/'), username, message_id)
}

/// Backslash-escapes every MarkdownV2 special character in `text`.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
