pub mod compose;
pub mod deliver;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod ledger;
pub mod media;
pub mod parse;
pub mod post;
pub mod sender;
pub mod telegram;

pub use compose::{ComposeConfig, compose, escape_markdown_v2};
pub use deliver::{DeliveryDecision, DeliveryReport, FailedPost, Relay, decide, media_items, plan};
pub use error::{RelayError, Result};
pub use extract::{
    BackgroundImageLocator, ExtractConfig, ImageLocator, InlineImageLocator, extract_posts, extract_posts_from_html,
};
pub use fetch::{FetchConfig, FetchedPage, archive_page, channel_url, fetch_channel_page, fetch_file};
pub use ledger::{Ledger, load_sent_ids, record_sent};
pub use media::MediaStager;
pub use parse::Document;
pub use post::{Post, posts_to_json, write_posts};
pub use sender::{ChannelSender, ChatTarget, MediaItem, MediaSource, ParseMode};
pub use telegram::TelegramSender;
