//! HTML parsing and selector queries over channel markup.
//!
//! [`Document`] and [`Element`] are thin wrappers around `scraper` that turn
//! selector errors into [`RelayError::HtmlParseError`] and expose only the
//! queries the post extractor needs.
//!
//! # Example
//!
//! ```rust
//! use eitaa_relay_core::parse::Document;
//!
//! let html = r#"<div class="js-widget_message" data-post="news/7">Hi</div>"#;
//! let doc = Document::parse(html).unwrap();
//! let post = doc.select_first(".js-widget_message").unwrap().unwrap();
//! assert_eq!(post.attr("data-post"), Some("news/7"));
//! ```

use scraper::{Html, Selector};

use crate::{RelayError, Result};

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| RelayError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// A parsed channel page.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses markup into a document tree.
    ///
    /// The HTML5 parser recovers from malformed markup, so this only fails
    /// for inputs the tree builder rejects outright.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html })
    }

    /// Selects every element matching a CSS selector, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first element matching a CSS selector.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = compile(selector)?;
        Ok(self.html.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Gets the title of the page, usually the channel's display name.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// A single node of a parsed [`Document`].
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Concatenated text of every descendant text node.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute, `None` when absent.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Selects descendants matching a CSS selector.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = compile(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first descendant matching a CSS selector.
    pub fn select_first(&self, selector: &str) -> Result<Option<Element<'a>>> {
        let sel = compile(selector)?;
        Ok(self.element.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Whether any descendant matches the selector.
    pub fn has_match(&self, selector: &str) -> Result<bool> {
        Ok(self.select_first(selector)?.is_some())
    }
}
