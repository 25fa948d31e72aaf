//! Data models for trending links and the article records built from them.
//!
//! - [`ArticleLink`]: one entry of the homepage's trending list
//! - [`ArticleRecord`]: the metadata written to the output JSON

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key of the homepage.
pub const HOMEPAGE_KEY: &str = "homepage.html";

/// A link taken from the trending list, as it appears in the `href`.
///
/// Usually a site-relative path such as `/news/local-news/some-story`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLink(String);

impl ArticleLink {
    pub fn new(href: impl Into<String>) -> Self {
        Self(href.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last non-empty path segment of the link, ignoring any query or fragment.
    ///
    /// ```ignore
    /// assert_eq!(ArticleLink::new("/news/local-news/bridge-closure").slug(), Some("bridge-closure"));
    /// ```
    pub fn slug(&self) -> Option<&str> {
        let path = self.0.split(['?', '#']).next().unwrap_or_default();
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
    }

    /// Cache key for the article page: `<slug>.html`.
    pub fn cache_key(&self) -> Option<String> {
        self.slug().map(|slug| format!("{slug}.html"))
    }
}

impl fmt::Display for ArticleLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata extracted from one article page.
///
/// Field order matches the output document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// The headline.
    pub title: String,
    /// Publication date as displayed on the page (e.g. "Published Oct 26, 2023").
    pub publication_date: String,
    pub author: String,
    /// The subtitle shown under the headline.
    pub blurb: String,
}
