//! Post extraction from channel page markup.
//!
//! Each `.js-widget_message_wrap` container yields at most one [`Post`].
//! Containers without a `data-post` identifier are skipped silently, and
//! every other field is optional: a missing timestamp or a malformed reply
//! link leaves that field unset instead of failing the post.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::parse::{Document, Element};
use crate::post::Post;
use crate::{RelayError, Result};

const CONTAINER: &str = ".js-widget_message_wrap";
const MESSAGE: &str = ".js-widget_message";
const ID_ATTR: &str = "data-post";
const MESSAGE_TEXT: &str = ".js-message_text";
const TIMESTAMP: &str = "time";
const FORWARDED: &str = ".etme_widget_message_forwarded_from";
const FORWARDED_NAME: &str = "a.etme_widget_message_forwarded_from_name";
const REPLY: &str = "a.etme_widget_message_reply";
const GROUPED_LAYER_ANCHOR: &str = ".js-message_grouped_layer a";

pub const DEFAULT_BASE_URL: &str = "https://eitaa.com";
pub const DEFAULT_ASSET_MARKER: &str = "/download_";

static CSS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"url\(\s*([^)]*?)\s*\)").expect("css url pattern is valid"));

/// Configuration for post extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Origin that relative image and reply links resolve against
    pub base_url: Url,
    /// Substring identifying downloadable media URLs
    pub asset_marker: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            asset_marker: DEFAULT_ASSET_MARKER.to_string(),
        }
    }
}

/// A strategy for finding image sources inside one post.
///
/// Page generations place media in different wrappers, so each strategy
/// declares the marker it relies on via [`ImageLocator::probe`] and reads
/// raw, unresolved sources via [`ImageLocator::locate`].
pub trait ImageLocator: Sync {
    fn name(&self) -> &'static str;

    /// Whether the marker elements this strategy reads exist in the post.
    fn probe(&self, message: &Element<'_>) -> Result<bool>;

    /// Raw image sources in document order, filtered by `asset_marker`.
    fn locate(&self, message: &Element<'_>, asset_marker: &str) -> Result<Vec<String>>;
}

/// Reads `src` from plain `<img>` elements.
pub struct InlineImageLocator;

impl ImageLocator for InlineImageLocator {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn probe(&self, message: &Element<'_>) -> Result<bool> {
        message.has_match("img[src]")
    }

    fn locate(&self, message: &Element<'_>, asset_marker: &str) -> Result<Vec<String>> {
        Ok(message
            .select("img[src]")?
            .iter()
            .filter_map(|img| img.attr("src"))
            .filter(|src| src.contains(asset_marker))
            .map(str::to_string)
            .collect())
    }
}

/// Reads `background-image: url(...)` from anchors in the grouped media layer.
pub struct BackgroundImageLocator;

impl ImageLocator for BackgroundImageLocator {
    fn name(&self) -> &'static str {
        "background"
    }

    fn probe(&self, message: &Element<'_>) -> Result<bool> {
        message.has_match(GROUPED_LAYER_ANCHOR)
    }

    fn locate(&self, message: &Element<'_>, asset_marker: &str) -> Result<Vec<String>> {
        Ok(message
            .select(GROUPED_LAYER_ANCHOR)?
            .iter()
            .filter_map(|a| a.attr("style"))
            .filter(|style| style.contains("background-image"))
            .filter_map(background_url)
            .filter(|url| url.contains(asset_marker))
            .collect())
    }
}

/// Locators in precedence order.
static LOCATORS: &[&dyn ImageLocator] = &[&InlineImageLocator, &BackgroundImageLocator];

/// Extracts the target of the first `url(...)` token in an inline style.
///
/// Surrounding single or double quotes are removed. Returns `None` when no
/// token is present or the token is empty.
pub fn background_url(style: &str) -> Option<String> {
    let captures = CSS_URL.captures(style)?;
    let url = captures.get(1)?.as_str().trim_matches(|c| c == '\'' || c == '"');
    if url.is_empty() { None } else { Some(url.to_string()) }
}

/// Extracts all posts from a parsed channel page, in document order.
///
/// # Errors
///
/// Returns [`RelayError::NoPostsFound`] when no container carries an
/// identifier. Selector failures surface as [`RelayError::HtmlParseError`].
pub fn extract_posts(doc: &Document, username: &str, config: &ExtractConfig) -> Result<Vec<Post>> {
    let mut posts = Vec::new();

    for (index, container) in doc.select(CONTAINER)?.iter().enumerate() {
        let Some(message) = container.select_first(MESSAGE)? else {
            tracing::debug!(index, "container without message node skipped");
            continue;
        };

        match extract_post(&message, username, config)? {
            Some(post) => posts.push(post),
            None => tracing::debug!(index, "container without post id skipped"),
        }
    }

    if posts.is_empty() {
        return Err(RelayError::NoPostsFound);
    }

    tracing::debug!(count = posts.len(), "extracted posts");
    Ok(posts)
}

/// Parses markup and extracts its posts in one step.
pub fn extract_posts_from_html(html: &str, username: &str, config: &ExtractConfig) -> Result<Vec<Post>> {
    let doc = Document::parse(html)?;
    extract_posts(&doc, username, config)
}

/// Builds a post from a single message node, `None` without an identifier.
fn extract_post(message: &Element<'_>, username: &str, config: &ExtractConfig) -> Result<Option<Post>> {
    let Some(id) = message.attr(ID_ATTR).map(str::trim).filter(|id| !id.is_empty()) else {
        return Ok(None);
    };

    let mut post = Post::new(id);

    if let Some(text) = message.select_first(MESSAGE_TEXT)? {
        post.text = non_empty(text.text().trim());
    }

    for url in locate_images(message, config)? {
        post.push_image(url);
    }

    if let Some(time) = message.select_first(TIMESTAMP)? {
        post.time = non_empty(time.text().trim());
        post.date = time.attr("datetime").and_then(date_from_datetime);
    }

    if let Some(forwarded) = message.select_first(FORWARDED)? {
        post.is_forwarded = true;
        if let Some(anchor) = forwarded.select_first(FORWARDED_NAME)? {
            post.forwarded_from = non_empty(anchor.text().trim());
            post.forwarded_from_link = anchor.attr("href").and_then(non_empty);
        }
    }

    if let Some(reply) = message.select_first(REPLY)? {
        post.is_reply = true;
        post.reply_to_message_id = reply
            .attr("href")
            .and_then(|href| same_channel_reply(href, username, &config.base_url));
    }

    Ok(Some(post))
}

/// Resolved image URLs from the first locator that applies to this post.
///
/// Strategies are alternatives: a locator is used only when its marker is
/// present and it yields at least one image.
fn locate_images(message: &Element<'_>, config: &ExtractConfig) -> Result<Vec<String>> {
    for locator in LOCATORS {
        if !locator.probe(message)? {
            continue;
        }

        let resolved: Vec<String> = locator
            .locate(message, &config.asset_marker)?
            .iter()
            .filter_map(|src| match config.base_url.join(src) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    tracing::debug!(src = %src, error = %e, "unresolvable image source");
                    None
                }
            })
            .collect();

        if !resolved.is_empty() {
            tracing::trace!(locator = locator.name(), count = resolved.len(), "images located");
            return Ok(resolved);
        }
    }

    Ok(Vec::new())
}

/// `2024-03-05T10:20:00+03:30` becomes `2024/03/05`.
fn date_from_datetime(datetime: &str) -> Option<String> {
    let date = datetime.split('T').next()?.trim();
    non_empty(&date.replace('-', "/"))
}

/// Message id of a reply link that targets `/{username}/{id}` on the same origin.
pub fn same_channel_reply(href: &str, username: &str, base_url: &Url) -> Option<String> {
    let target = base_url.join(href).ok()?;
    if target.origin() != base_url.origin() {
        return None;
    }

    let segments: Vec<&str> = target.path_segments()?.collect();
    match segments.as_slice() {
        [channel, id] if *channel == username && !id.is_empty() => Some(id.to_string()),
        _ => None,
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() { None } else { Some(value.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn extract(html: &str) -> Result<Vec<Post>> {
        extract_posts_from_html(html, "chan", &ExtractConfig::default())
    }

    fn wrap(inner: &str) -> String {
        format!(r#"<div class="js-widget_message_wrap"><div class="js-widget_message" data-post="chan/1">{inner}</div></div>"#)
    }

    #[rstest]
    #[case("url('/download_a.jpg')", Some("/download_a.jpg"))]
    #[case("url(\"/download_a.jpg\")", Some("/download_a.jpg"))]
    #[case("width:10px;background-image:url(/download_a.jpg);height:4px", Some("/download_a.jpg"))]
    #[case("background-image: none", None)]
    #[case("url()", None)]
    fn test_background_url(#[case] style: &str, #[case] expected: Option<&str>) {
        assert_eq!(background_url(style).as_deref(), expected);
    }

    #[rstest]
    #[case("/chan/42", Some("42"))]
    #[case("https://eitaa.com/chan/42", Some("42"))]
    #[case("/other/42", None)]
    #[case("/chan/42/extra", None)]
    #[case("/chan", None)]
    #[case("/chan/", None)]
    #[case("https://example.com/chan/42", None)]
    fn test_same_channel_reply(#[case] href: &str, #[case] expected: Option<&str>) {
        let base = Url::parse(DEFAULT_BASE_URL).unwrap();
        assert_eq!(same_channel_reply(href, "chan", &base).as_deref(), expected);
    }

    #[test]
    fn test_text_is_trimmed_and_empty_is_absent() {
        let posts = extract(&wrap(r#"<div class="js-message_text">  Hello  </div>"#)).unwrap();
        assert_eq!(posts[0].text.as_deref(), Some("Hello"));

        let posts = extract(&wrap(r#"<div class="js-message_text">   </div>"#)).unwrap();
        assert_eq!(posts[0].text, None);
    }

    #[test]
    fn test_inline_images_resolved_and_deduplicated() {
        let posts = extract(&wrap(
            r#"<img src="/download_a.jpg"><img src="/static/logo.png"><img src="/download_b.jpg"><img src="/download_a.jpg">"#,
        ))
        .unwrap();

        assert_eq!(
            posts[0].images,
            vec!["https://eitaa.com/download_a.jpg", "https://eitaa.com/download_b.jpg"]
        );
    }

    #[test]
    fn test_background_images_when_no_inline_match() {
        let posts = extract(&wrap(
            r#"<div class="js-message_grouped_layer">
                <a style="background-image:url('/download_x.jpg')"></a>
                <a style="background-image:url('/download_y.jpg')"></a>
                <a style="background-image:url('/download_x.jpg')"></a>
            </div>
            <img src="/static/avatar.png">"#,
        ))
        .unwrap();

        assert_eq!(
            posts[0].images,
            vec!["https://eitaa.com/download_x.jpg", "https://eitaa.com/download_y.jpg"]
        );
    }

    #[test]
    fn test_inline_strategy_takes_precedence_on_mixed_markup() {
        let posts = extract(&wrap(
            r#"<img src="/download_a.jpg">
            <div class="js-message_grouped_layer">
                <a style="background-image:url('/download_a.jpg')"></a>
                <a style="background-image:url('/download_b.jpg')"></a>
            </div>"#,
        ))
        .unwrap();

        assert_eq!(posts[0].images, vec!["https://eitaa.com/download_a.jpg"]);
    }

    #[test]
    fn test_timestamp() {
        let posts =
            extract(&wrap(r#"<time datetime="2024-03-05T10:20:00+03:30">10:20</time><time>later</time>"#)).unwrap();

        assert_eq!(posts[0].time.as_deref(), Some("10:20"));
        assert_eq!(posts[0].date.as_deref(), Some("2024/03/05"));
    }

    #[test]
    fn test_timestamp_without_datetime() {
        let posts = extract(&wrap("<time>10:20</time>")).unwrap();

        assert_eq!(posts[0].time.as_deref(), Some("10:20"));
        assert_eq!(posts[0].date, None);
    }

    #[test]
    fn test_forwarded_with_name() {
        let posts = extract(&wrap(
            r#"<div class="etme_widget_message_forwarded_from">Forwarded from
                <a class="etme_widget_message_forwarded_from_name" href="https://eitaa.com/source"> Source </a>
            </div>"#,
        ))
        .unwrap();

        assert!(posts[0].is_forwarded);
        assert_eq!(posts[0].forwarded_from.as_deref(), Some("Source"));
        assert_eq!(posts[0].forwarded_from_link.as_deref(), Some("https://eitaa.com/source"));
    }

    #[test]
    fn test_forwarded_without_name_keeps_flag() {
        let posts = extract(&wrap(r#"<div class="etme_widget_message_forwarded_from">Forwarded</div>"#)).unwrap();

        assert!(posts[0].is_forwarded);
        assert_eq!(posts[0].forwarded_from, None);
        assert_eq!(posts[0].forwarded_from_link, None);
    }

    #[test]
    fn test_cross_channel_reply_sets_flag_only() {
        let posts = extract(&wrap(r#"<a class="etme_widget_message_reply" href="/other/5">re</a>"#)).unwrap();

        assert!(posts[0].is_reply);
        assert_eq!(posts[0].reply_to_message_id, None);
    }

    #[test]
    fn test_same_channel_reply_sets_id() {
        let posts = extract(&wrap(r#"<a class="etme_widget_message_reply" href="/chan/5">re</a>"#)).unwrap();

        assert!(posts[0].is_reply);
        assert_eq!(posts[0].reply_to_message_id.as_deref(), Some("5"));
    }

    #[test]
    fn test_containers_without_id_are_skipped() {
        let html = r#"
            <div class="js-widget_message_wrap"><div class="js-widget_message"><div class="js-message_text">no id</div></div></div>
            <div class="js-widget_message_wrap"><div class="js-widget_message" data-post=" "></div></div>
            <div class="js-widget_message_wrap"><p>no message node</p></div>
            <div class="js-widget_message_wrap"><div class="js-widget_message" data-post="chan/3"></div></div>
        "#;
        let posts = extract(html).unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "chan/3");
    }

    #[test]
    fn test_no_posts_found() {
        let result = extract("<html><body><p>nothing here</p></body></html>");
        assert!(matches!(result, Err(RelayError::NoPostsFound)));
    }

    #[test]
    fn test_document_order_preserved() {
        let html = (1..=3)
            .map(|i| {
                format!(r#"<div class="js-widget_message_wrap"><div class="js-widget_message" data-post="chan/{i}"></div></div>"#)
            })
            .collect::<String>();
        let ids: Vec<String> = extract(&html).unwrap().into_iter().map(|p| p.id).collect();

        assert_eq!(ids, vec!["chan/1", "chan/2", "chan/3"]);
    }

    #[test]
    fn test_custom_base_url() {
        let config = ExtractConfig { base_url: Url::parse("https://mirror.example").unwrap(), ..Default::default() };
        let posts = extract_posts_from_html(&wrap(r#"<img src="/download_a.jpg">"#), "chan", &config).unwrap();

        assert_eq!(posts[0].images, vec!["https://mirror.example/download_a.jpg"]);
    }
}
