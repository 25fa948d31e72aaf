//! Trending-list extraction from the news homepage.
//!
//! The homepage carries a "Trending" widget shaped like:
//!
//! ```text
//! div.list-widget.list-widget-trending
//! └── ol
//!     └── li                     (one per story, in rank order)
//!         └── div.article-card__details
//!             └── a[href]        (first anchor is the story link)
//! ```
//!
//! Every level is required. A malformed item fails the whole list rather than
//! being skipped.

use super::query::Query;
use crate::error::ExtractError;
use crate::models::ArticleLink;
use scraper::Html;
use tracing::{debug, info, instrument, warn};

const TRENDING_WIDGET: &str = "div.list-widget.list-widget-trending";
const CARD_DETAILS: &str = "div.article-card__details";

/// Walk the trending widget under `root` and return its links in list order.
pub fn trending_links<N: Query>(root: &N) -> Result<Vec<ArticleLink>, ExtractError> {
    let widgets = root.select_all(TRENDING_WIDGET)?;
    if widgets.len() > 1 {
        warn!(count = widgets.len(), "Several trending widgets found; using the first");
    }
    let widget = widgets
        .into_iter()
        .next()
        .ok_or_else(|| ExtractError::Missing {
            element: "trending widget",
            selector: TRENDING_WIDGET.to_string(),
        })?;
    let list = widget.require("trending list", "ol")?;

    list.children_named("li")
        .iter()
        .map(|item| -> Result<ArticleLink, ExtractError> {
            let details = item.require("article card details", CARD_DETAILS)?;
            let anchor = details.require("article card link", "a")?;
            let href = anchor.require_attr("article card link", "href")?;
            Ok(ArticleLink::new(href.trim()))
        })
        .collect()
}

/// Parse homepage markup and extract its trending links.
#[instrument(level = "info", skip_all, fields(bytes = markup.len()))]
pub fn extract_trending_links(markup: &str) -> Result<Vec<ArticleLink>, ExtractError> {
    let document = Html::parse_document(markup);
    let links = trending_links(&document.root_element())?;
    info!(count = links.len(), "Extracted trending links");
    debug!(links = ?links, "Trending links");
    Ok(links)
}
