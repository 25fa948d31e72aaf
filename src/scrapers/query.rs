//! A small query interface over parsed markup.
//!
//! The extractors only ever ask for "first descendant matching a selector",
//! "all descendants matching", "element children with a tag name", an
//! attribute, or text. [`Query`] captures exactly that so the extraction
//! walks are written against the trait, not against `scraper` directly.

use crate::error::ExtractError;
use scraper::{ElementRef, Selector};

pub trait Query: Sized {
    /// First descendant matching the CSS `selector`.
    fn select_first(&self, selector: &str) -> Result<Option<Self>, ExtractError>;

    /// Every descendant matching `selector`, in document order.
    fn select_all(&self, selector: &str) -> Result<Vec<Self>, ExtractError>;

    /// Direct element children whose tag name is `tag`.
    fn children_named(&self, tag: &str) -> Vec<Self>;

    fn attr(&self, name: &str) -> Option<&str>;

    /// All descendant text, concatenated without separators.
    fn text_content(&self) -> String;

    /// Like [`Query::select_first`], but a missing match is an error naming
    /// `element`.
    fn require(&self, element: &'static str, selector: &str) -> Result<Self, ExtractError> {
        self.select_first(selector)?
            .ok_or_else(|| ExtractError::Missing {
                element,
                selector: selector.to_string(),
            })
    }

    fn require_attr(&self, element: &'static str, attribute: &'static str) -> Result<&str, ExtractError> {
        self.attr(attribute)
            .ok_or(ExtractError::MissingAttribute { element, attribute })
    }

    fn trimmed_text(&self) -> String {
        self.text_content().trim().to_string()
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

impl<'a> Query for ElementRef<'a> {
    fn select_first(&self, selector: &str) -> Result<Option<Self>, ExtractError> {
        let selector = parse_selector(selector)?;
        Ok(self.select(&selector).next())
    }

    fn select_all(&self, selector: &str) -> Result<Vec<Self>, ExtractError> {
        let selector = parse_selector(selector)?;
        Ok(self.select(&selector).collect())
    }

    fn children_named(&self, tag: &str) -> Vec<Self> {
        self.children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == tag)
            .collect()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn text_content(&self) -> String {
        self.text().collect()
    }
}
