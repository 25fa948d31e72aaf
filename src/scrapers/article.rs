//! Metadata extraction from a single article page.
//!
//! All four fields live in the article header:
//!
//! ```text
//! div.article-header__detail__texts
//! ├── h1                                   title
//! ├── p.article-subtitle                   blurb
//! └── div.article-meta
//!     ├── div.published-date
//!     │   └── span.published-date__since   publication date
//!     └── div.published-by
//!         └── span.published-by__author    author
//! ```
//!
//! There are no per-field fallbacks; any missing element fails the record.

use super::query::Query;
use crate::error::ExtractError;
use crate::models::ArticleRecord;
use scraper::Html;
use tracing::{debug, instrument};

const DETAIL: &str = "div.article-header__detail__texts";
const META: &str = "div.article-meta";

/// Build an [`ArticleRecord`] from the article header under `root`.
pub fn article_record<N: Query>(root: &N) -> Result<ArticleRecord, ExtractError> {
    let detail = root.require("article detail", DETAIL)?;
    let meta = detail.require("article meta", META)?;

    let title = detail.require("title", "h1")?.trimmed_text();
    let blurb = detail.require("subtitle", "p.article-subtitle")?.trimmed_text();

    let publication_date = meta
        .require("published date", "div.published-date")?
        .require("published date", "span.published-date__since")?
        .trimmed_text();
    let author = meta
        .require("published by", "div.published-by")?
        .require("author", "span.published-by__author")?
        .trimmed_text();

    Ok(ArticleRecord {
        title,
        publication_date,
        author,
        blurb,
    })
}

/// Parse article markup and extract its record.
#[instrument(level = "debug", skip_all, fields(bytes = markup.len()))]
pub fn extract_article(markup: &str) -> Result<ArticleRecord, ExtractError> {
    let document = Html::parse_document(markup);
    let record = article_record(&document.root_element())?;
    debug!(title = %record.title, author = %record.author, "Extracted article");
    Ok(record)
}
