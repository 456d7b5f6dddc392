//! Delivery orchestration.
//!
//! [`Relay`] walks extracted posts in order and resolves each one fully
//! before the next: decide, send, record in the ledger. A post that fails
//! to send stays out of the ledger and is retried by the next run; it never
//! stops the rest of the batch.

use crate::compose::{ComposeConfig, compose};
use crate::ledger::Ledger;
use crate::media::MediaStager;
use crate::post::Post;
use crate::sender::{ChannelSender, ChatTarget, MediaItem, MediaSource, ParseMode};
use crate::{RelayError, Result};

/// What the relay does with one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryDecision {
    /// The ledger already holds the post id.
    AlreadySent,
    /// No images, non-empty text.
    SendText,
    /// One or more images; the text becomes the first caption.
    SendMediaGroup,
    /// Neither images nor text.
    SkipEmpty,
}

/// Chooses the action for a post given its composed message.
pub fn decide(post: &Post, message: &str, ledger: &Ledger) -> DeliveryDecision {
    if ledger.contains(&post.id) {
        DeliveryDecision::AlreadySent
    } else if post.has_media() {
        DeliveryDecision::SendMediaGroup
    } else if !message.is_empty() {
        DeliveryDecision::SendText
    } else {
        DeliveryDecision::SkipEmpty
    }
}

/// Decisions for `posts` against `ledger`, in order, with no side effects.
pub fn plan<'p>(
    posts: &'p [Post], username: &str, config: &ComposeConfig, ledger: &Ledger,
) -> Vec<(&'p Post, DeliveryDecision)> {
    posts
        .iter()
        .map(|post| {
            let message = compose(post, username, config);
            (post, decide(post, &message, ledger))
        })
        .collect()
}

/// A post the relay could not deliver.
#[derive(Debug)]
pub struct FailedPost {
    pub post_id: String,
    pub error: RelayError,
}

/// Per-run counters.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub sent: usize,
    pub already_sent: usize,
    pub skipped_empty: usize,
    pub failed: Vec<FailedPost>,
    /// Posts that were delivered but could not be written to the ledger.
    pub ledger_errors: Vec<FailedPost>,
}

impl DeliveryReport {
    pub fn total(&self) -> usize {
        self.sent + self.already_sent + self.skipped_empty + self.failed.len()
    }
}

/// Relays posts from one source channel to one downstream chat.
pub struct Relay<S> {
    sender: S,
    target: ChatTarget,
    username: String,
    ledger: Ledger,
    compose: ComposeConfig,
    stager: Option<MediaStager>,
}

impl<S: ChannelSender> Relay<S> {
    pub fn new(sender: S, target: ChatTarget, username: impl Into<String>, ledger: Ledger) -> Self {
        Self { sender, target, username: username.into(), ledger, compose: ComposeConfig::default(), stager: None }
    }

    pub fn with_compose_config(mut self, compose: ComposeConfig) -> Self {
        self.compose = compose;
        self
    }

    /// Downloads images locally before sending instead of passing URLs through.
    pub fn with_media_stager(mut self, stager: MediaStager) -> Self {
        self.stager = Some(stager);
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    fn parse_mode(&self) -> ParseMode {
        if self.compose.escape_markdown { ParseMode::MarkdownV2 } else { ParseMode::Plain }
    }

    /// Decisions for every post without sending anything.
    pub fn plan<'p>(&self, posts: &'p [Post]) -> Vec<(&'p Post, DeliveryDecision)> {
        plan(posts, &self.username, &self.compose, &self.ledger)
    }

    /// Delivers every post in order and records the successful ones.
    pub async fn run(&mut self, posts: &[Post]) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for post in posts {
            let message = compose(post, &self.username, &self.compose);

            match decide(post, &message, &self.ledger) {
                DeliveryDecision::AlreadySent => {
                    tracing::debug!(post_id = %post.id, "already sent, skipping");
                    report.already_sent += 1;
                    continue;
                }
                DeliveryDecision::SkipEmpty => {
                    tracing::info!(post_id = %post.id, "no text or media, skipping");
                    report.skipped_empty += 1;
                    continue;
                }
                DeliveryDecision::SendText => {
                    if let Err(error) = self.sender.send_text(&self.target, &message, self.parse_mode()).await {
                        tracing::warn!(post_id = %post.id, error = %error, "failed to send text");
                        report.failed.push(FailedPost { post_id: post.id.clone(), error });
                        continue;
                    }
                }
                DeliveryDecision::SendMediaGroup => {
                    if let Err(error) = self.send_media_group(post, &message).await {
                        tracing::warn!(post_id = %post.id, error = %error, "failed to send media group");
                        report.failed.push(FailedPost { post_id: post.id.clone(), error });
                        continue;
                    }
                }
            }

            report.sent += 1;
            match self.ledger.record_sent(&post.id) {
                Ok(_) => tracing::info!(post_id = %post.id, "sent post"),
                Err(error) => {
                    tracing::warn!(post_id = %post.id, error = %error, "sent post but failed to record it");
                    report.ledger_errors.push(FailedPost { post_id: post.id.clone(), error });
                }
            }
        }

        report
    }

    async fn send_media_group(&self, post: &Post, message: &str) -> Result<()> {
        let sources = match &self.stager {
            Some(stager) => stager.stage(post).await?,
            None => post.images.iter().cloned().map(MediaSource::Url).collect(),
        };

        let items = media_items(sources, message);
        if items.is_empty() {
            return Err(RelayError::NoValidMedia { post_id: post.id.clone() });
        }

        self.sender.send_media_group(&self.target, &items, self.parse_mode()).await
    }
}

/// Wraps sources as photos, captioning only the first with `message`.
pub fn media_items(sources: Vec<MediaSource>, message: &str) -> Vec<MediaItem> {
    sources
        .into_iter()
        .enumerate()
        .map(|(index, source)| MediaItem {
            source,
            caption: (index == 0 && !message.is_empty()).then(|| message.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn empty_ledger(dir: &TempDir) -> Ledger {
        Ledger::load(dir.path().join("sent_ids.json")).unwrap()
    }

    #[test]
    fn test_decide() {
        let dir = TempDir::new().unwrap();
        let mut ledger = empty_ledger(&dir);
        ledger.record_sent("chan/sent").unwrap();

        let with_image = Post { images: vec!["https://eitaa.com/download_a.jpg".to_string()], ..Post::new("chan/1") };
        let text_only = Post { text: Some("Hi".to_string()), ..Post::new("chan/2") };

        assert_eq!(decide(&Post::new("chan/sent"), "Hi", &ledger), DeliveryDecision::AlreadySent);
        assert_eq!(decide(&with_image, "", &ledger), DeliveryDecision::SendMediaGroup);
        assert_eq!(decide(&text_only, "Hi", &ledger), DeliveryDecision::SendText);
        assert_eq!(decide(&Post::new("chan/3"), "", &ledger), DeliveryDecision::SkipEmpty);
    }

    #[test]
    fn test_media_items_caption_first_only() {
        let sources = vec![MediaSource::Url("a".to_string()), MediaSource::Url("b".to_string())];
        let items = media_items(sources, "caption");

        assert_eq!(items[0].caption.as_deref(), Some("caption"));
        assert_eq!(items[1].caption, None);
    }

    #[test]
    fn test_media_items_without_text() {
        let items = media_items(vec![MediaSource::Url("a".to_string())], "");
        assert_eq!(items[0].caption, None);
    }
}
